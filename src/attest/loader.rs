//! Certificate chain lookup
//!
//! A missing entry or an empty chain is a normal outcome, reported as
//! `(false, [])` rather than an error.

use crate::store::keystore::{CertificateChain, SecureKeyStore};

/// Load the certificate chain stored under `alias`, leaf first
pub fn load_chain<S: SecureKeyStore + ?Sized>(store: &S, alias: &str) -> (bool, CertificateChain) {
    let chain = store.certificate_chain(alias);
    if chain.is_empty() {
        log::warn!("no certificate chain found for alias '{}'", alias);
        return (false, Vec::new());
    }
    (true, chain)
}
