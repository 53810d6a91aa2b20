//! keyattest — device key-attestation core
//!
//! Generates a hardware-backed EC key pair bound to a verifier-supplied
//! challenge, retries without device-properties attestation when the
//! secure store rejects it, loads the resulting certificate chain and
//! exports it as PEM for a remote verifier.

pub mod attest;
pub mod store;

pub use attest::{
    load_chain, pem_encode, pem_encode_chain, validate_challenge, AttestError, AttestationConfig,
    AttestationOrchestrator, AttestationResult, ChallengeError, GeneratorFailure,
    KeyAttestationGenerator, MIN_CHALLENGE_LEN,
};
pub use store::{
    CertificateChain, CertificateDer, KeyPair, SecureKeyStore, SoftwareKeyStore, StoreError,
};
