//! Attestation workflow — challenge-bound key generation with fallback
//!
//! - **Challenge**: byte-length contract on the verifier challenge
//! - **Generator**: one key-generation attempt against the secure store
//! - **Loader**: certificate chain lookup by alias
//! - **Orchestrator**: retry/fallback state machine and result delivery
//! - **Pem**: certificate bytes to transportable PEM text

pub mod challenge;
pub mod generator;
pub mod loader;
pub mod orchestrator;
pub mod pem;

pub use challenge::{validate_challenge, ChallengeError, MIN_CHALLENGE_LEN};
pub use generator::{GeneratorFailure, KeyAttestationGenerator};
pub use loader::load_chain;
pub use orchestrator::{AttestError, AttestationOrchestrator, AttestationResult};
pub use pem::{pem_encode, pem_encode_chain};

pub use crate::store::keystore::AttestationConfig;
