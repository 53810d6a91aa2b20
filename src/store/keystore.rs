//! Secure key store trait and key material types
//!
//! Models a hardware- or OS-isolated key facility: private key material
//! never leaves the store, callers only observe public keys and
//! certificate chains. Backends are injected into the attestation
//! workflow at construction so tests can substitute a double.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single DER-encoded certificate as returned by the store
pub type CertificateDer = Vec<u8>;

/// Ordered certificate chain, leaf certificate first
pub type CertificateChain = Vec<CertificateDer>;

/// Key purposes requested at generation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyPurpose {
    Sign,
    Verify,
}

/// Named elliptic curve for generated keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EcCurve {
    /// NIST P-256, the only curve the workflow requests
    Secp256r1,
}

impl EcCurve {
    pub fn name(&self) -> &str {
        match self {
            EcCurve::Secp256r1 => "secp256r1",
        }
    }
}

/// Digest algorithms the generated key may be used with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Digest {
    Sha256,
    Sha384,
    Sha512,
}

impl Digest {
    pub fn name(&self) -> &str {
        match self {
            Digest::Sha256 => "SHA-256",
            Digest::Sha384 => "SHA-384",
            Digest::Sha512 => "SHA-512",
        }
    }
}

/// Per-attempt key generation request handed to the store
///
/// Only `include_device_properties` varies across retry attempts; every
/// other field is fixed by the workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationConfig {
    /// Key-store entry identifier, stable across attempts for the same key
    pub alias: String,
    pub curve: EcCurve,
    pub purposes: Vec<KeyPurpose>,
    pub digests: Vec<Digest>,
    /// Key validity start, set to the attempt time
    pub validity_start: DateTime<Utc>,
    /// Verifier nonce embedded in the attestation certificate; `None`
    /// disables the attestation-challenge extension
    pub attestation_challenge: Option<Vec<u8>>,
    /// Request certification of device properties in addition to the key
    pub include_device_properties: bool,
}

/// Key pair produced by the store
///
/// `private` is `None` when the key is confined to secure hardware;
/// that is the expected case for a hardware-backed store, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPair {
    pub public: Vec<u8>,
    pub private: Option<Vec<u8>>,
}

/// Store-level failures surfaced by a backend
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The store cannot produce an attestation satisfying the requested
    /// configuration (e.g. device-properties attestation on hardware
    /// that lacks it). Recoverable: the orchestrator retries without
    /// the rejected option.
    #[error("attestation configuration not supported: {0}")]
    AttestationUnsupported(String),

    /// Storage-level failure (I/O, corrupted entry). Fatal, never retried.
    #[error("key store storage failure: {0}")]
    Storage(String),

    /// The store itself is unreachable. Fatal, never retried.
    #[error("key store unavailable: {0}")]
    Unavailable(String),
}

/// External secure-store collaborator of the attestation workflow
///
/// All calls are synchronous and may block on secure hardware; the
/// store serializes its own writes. Capability queries replace
/// platform-version branching in the callers.
pub trait SecureKeyStore {
    /// Generate a key pair under `config.alias`, creating or replacing
    /// the durable entry for that alias.
    fn generate_key_pair(&mut self, config: &AttestationConfig) -> Result<KeyPair, StoreError>;

    /// Certificate chain for `alias`, leaf first. Empty when the alias
    /// has no entry or the entry carries no chain.
    fn certificate_chain(&self, alias: &str) -> CertificateChain;

    /// Whether this store can certify device properties in addition to
    /// the generated key.
    fn supports_device_properties(&self) -> bool;

    /// Whether this store can embed an attestation challenge in the
    /// key's certificate. Stores answering `false` omit the extension
    /// transparently.
    fn supports_attestation_challenge(&self) -> bool {
        true
    }
}
