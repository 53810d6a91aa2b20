//! PEM encoding of certificate bytes
//!
//! Byte-for-byte reproducible output: base64 standard alphabet wrapped
//! at 64 columns between fixed CERTIFICATE header and footer lines, so
//! remote verifiers can parse it with any standard PEM reader. Absent
//! input (a private key confined to hardware) encodes as the literal
//! sentinel `NULL`.

use crate::store::keystore::CertificateChain;
use base64::prelude::*;

const PEM_HEADER: &str = "-----BEGIN CERTIFICATE-----";
const PEM_FOOTER: &str = "-----END CERTIFICATE-----";
const PEM_LINE_LEN: usize = 64;

/// Encode certificate bytes as PEM text; `None` yields `"NULL"`
pub fn pem_encode(bytes: Option<&[u8]>) -> String {
    let bytes = match bytes {
        Some(b) => b,
        None => return "NULL".to_string(),
    };

    let encoded = BASE64_STANDARD.encode(bytes);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / PEM_LINE_LEN + 64);
    out.push_str(PEM_HEADER);
    out.push('\n');
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(PEM_LINE_LEN));
        out.push_str(line);
        out.push('\n');
        rest = tail;
    }
    out.push_str(PEM_FOOTER);
    out.push('\n');
    out
}

/// Encode a whole chain, one PEM block per certificate, leaf first
pub fn pem_encode_chain(chain: &CertificateChain) -> Vec<String> {
    chain.iter().map(|cert| pem_encode(Some(cert))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sentinel() {
        assert_eq!(pem_encode(None), "NULL");
    }

    #[test]
    fn test_header_and_footer() {
        let pem = pem_encode(Some(b"hello"));
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(pem.ends_with("-----END CERTIFICATE-----\n"));
    }

    #[test]
    fn test_exact_small_vector() {
        // base64("hello") == "aGVsbG8="
        assert_eq!(
            pem_encode(Some(b"hello")),
            "-----BEGIN CERTIFICATE-----\naGVsbG8=\n-----END CERTIFICATE-----\n"
        );
    }

    #[test]
    fn test_line_wrapping_at_64() {
        // 96 input bytes -> 128 base64 chars -> two full 64-char lines
        let pem = pem_encode(Some(&[0x5A; 96]));
        let body: Vec<&str> = pem
            .lines()
            .filter(|l| !l.starts_with("-----"))
            .collect();
        assert_eq!(body.len(), 2);
        assert!(body.iter().all(|l| l.len() == 64));

        // 100 bytes -> 136 chars -> 64 + 64 + 8
        let pem = pem_encode(Some(&[0x5A; 100]));
        let body: Vec<&str> = pem
            .lines()
            .filter(|l| !l.starts_with("-----"))
            .collect();
        assert_eq!(body.iter().map(|l| l.len()).collect::<Vec<_>>(), vec![64, 64, 8]);
    }

    #[test]
    fn test_roundtrip_decode() {
        let inputs: [&[u8]; 5] = [b"", b"a", b"ab", &[0xFF; 61], &[0x00; 200]];
        for input in inputs {
            let pem = pem_encode(Some(input));
            let body: String = pem
                .lines()
                .filter(|l| !l.starts_with("-----"))
                .collect();
            assert_eq!(BASE64_STANDARD.decode(body).unwrap(), input);
            for line in pem.lines().filter(|l| !l.starts_with("-----")) {
                assert!(line.len() <= 64);
            }
        }
    }

    #[test]
    fn test_chain_encoding() {
        let chain = vec![vec![1u8, 2, 3], vec![4u8, 5, 6]];
        let pems = pem_encode_chain(&chain);
        assert_eq!(pems.len(), 2);
        assert!(pems[0].contains("AQID")); // base64 of [1,2,3]
    }
}
