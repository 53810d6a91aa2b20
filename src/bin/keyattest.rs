//! keyattest CLI — device key attestation against a software key store
//!
//! Commands:
//!   keyattest attest <alias> [challenge-hex]  — run the full workflow
//!   keyattest chain  <alias>                  — print a stored chain as PEM
//!   keyattest stats                           — show store statistics
//!   keyattest demo                            — scripted end-to-end walkthrough

use keyattest_core::attest::load_chain;
use keyattest_core::{pem_encode, AttestationOrchestrator, SoftwareKeyStore};
use std::env;

const STORE_FILE: &str = "keyattest-store.json";

fn print_usage() {
    println!(
        r#"
keyattest — device key attestation workflow

Usage: keyattest <command> [options]

Commands:
  attest <alias> [challenge-hex]   Generate an attested key and print its PEM chain
                                   (challenge: empty to disable, else >= 16 bytes)
  chain  <alias>                   Print the stored certificate chain as PEM
  stats                            Show key store statistics
  demo                             Run a full demo (attest, fallback, load, PEM)

Examples:
  keyattest attest device-key-1 00000000000000000000000000000000
  keyattest attest device-key-2
  keyattest chain device-key-1
"#
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "attest" => cmd_attest(&args[2..]),
        "chain" => cmd_chain(&args[2..]),
        "stats" => cmd_stats(),
        "demo" => cmd_demo(),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
        }
    }
}

fn cmd_attest(args: &[String]) {
    let alias = match args.first() {
        Some(a) => a,
        None => {
            eprintln!("Usage: keyattest attest <alias> [challenge-hex]");
            return;
        }
    };

    let challenge = match args.get(1) {
        Some(hex_str) => match hex::decode(hex_str) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("  Invalid challenge hex: {}", e);
                return;
            }
        },
        None => Vec::new(),
    };

    let mut store = SoftwareKeyStore::open(STORE_FILE);
    let mut orch = AttestationOrchestrator::new(&mut store);

    match orch.attest_result(alias, &challenge) {
        Ok(result) => {
            println!("\n  Attestation: {}", if result.success { "OK" } else { "FAILED" });
            println!("  Chain length: {}", result.chain.len());
            for (i, pem) in result.pem_chain().iter().enumerate() {
                println!("\n  Certificate {} ({}):", i, if i == 0 { "leaf" } else { "issuer" });
                print!("{}", pem);
            }
        }
        Err(e) => eprintln!("  Attestation error: {}", e),
    }
}

fn cmd_chain(args: &[String]) {
    let alias = match args.first() {
        Some(a) => a,
        None => {
            eprintln!("Usage: keyattest chain <alias>");
            return;
        }
    };

    let store = SoftwareKeyStore::open(STORE_FILE);
    let (found, chain) = load_chain(&store, alias);
    if !found {
        println!("  No certificate chain stored under '{}'", alias);
        return;
    }
    for cert in &chain {
        print!("{}", pem_encode(Some(cert)));
    }
}

fn cmd_stats() {
    let store = SoftwareKeyStore::open(STORE_FILE);
    println!("\n  Key Store Statistics");
    println!("  {}", "=".repeat(40));
    println!("  {}", store.summary());
    for alias in store.aliases() {
        println!("  - {}", alias);
    }
}

fn cmd_demo() {
    println!("\nkeyattest demo — attestation workflow walkthrough");
    println!("{}", "=".repeat(60));

    // Step 1: full attestation on capable hardware
    println!("\nStep 1: Attestation with device properties...");
    println!("{}", "-".repeat(60));
    let mut store = SoftwareKeyStore::new();
    let challenge = [0u8; 16];
    let mut orch = AttestationOrchestrator::new(&mut store);
    match orch.attest_result("demo-key-full", &challenge) {
        Ok(result) => {
            println!("  success={} chain_len={}", result.success, result.chain.len());
            println!("  leaf PEM:\n{}", result.pem_chain()[0]);
        }
        Err(e) => eprintln!("  error: {}", e),
    }

    // Step 2: hardware without device-properties attestation
    println!("\nStep 2: Capability-negotiated single attempt...");
    println!("{}", "-".repeat(60));
    let mut limited = SoftwareKeyStore::new().without_device_properties();
    let mut orch = AttestationOrchestrator::new(&mut limited);
    match orch.attest_result("demo-key-limited", &challenge) {
        Ok(result) => println!(
            "  success={} chain_len={} generate_calls={}",
            result.success,
            result.chain.len(),
            limited.stats.generate_calls
        ),
        Err(e) => eprintln!("  error: {}", e),
    }

    // Step 3: challenge contract
    println!("\nStep 3: Rejecting a short challenge...");
    println!("{}", "-".repeat(60));
    let mut orch = AttestationOrchestrator::new(&mut store);
    match orch.attest_result("demo-key-short", &[0u8; 10]) {
        Ok(_) => println!("  unexpected success"),
        Err(e) => println!("  rejected as expected: {}", e),
    }
    println!(
        "  total generate calls (unchanged by the rejection): {}",
        store.stats.generate_calls
    );

    // Step 4: hardware-confined private key encodes as NULL
    println!("\nStep 4: PEM encoding of absent private key...");
    println!("{}", "-".repeat(60));
    println!("  pem_encode(None) = {:?}", pem_encode(None));

    // Step 5: chain reload by alias
    println!("\nStep 5: Reloading the stored chain...");
    println!("{}", "-".repeat(60));
    let (found, chain) = load_chain(&store, "demo-key-full");
    println!("  found={} chain_len={}", found, chain.len());

    println!("\nDemo complete.");
}
