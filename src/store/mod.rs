//! Secure key store — the hardware seam of the attestation workflow
//!
//! - **Keystore**: the `SecureKeyStore` trait plus the key/certificate types
//! - **Software**: a software-simulated backend (always available, NOT
//!   hardware-secured) for development, tests and the CLI

pub mod keystore;
pub mod software;

pub use keystore::{
    AttestationConfig, CertificateChain, CertificateDer, Digest, EcCurve, KeyPair, KeyPurpose,
    SecureKeyStore, StoreError,
};
pub use software::{KeyStoreEntry, SoftwareKeyStore, StoreStats};
