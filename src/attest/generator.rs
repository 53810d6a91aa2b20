//! Single key-attestation attempt
//!
//! Builds the per-attempt configuration (fixed curve, purposes, digests
//! and validity start; only the device-properties flag varies between
//! attempts) and asks the secure store for a key pair. Store rejections
//! of the attestation configuration come back as a recoverable
//! `Unsupported` value, never as a raised error; retry policy lives in
//! the orchestrator.

use crate::attest::pem::pem_encode;
use crate::store::keystore::{
    AttestationConfig, Digest, EcCurve, KeyPair, KeyPurpose, SecureKeyStore, StoreError,
};
use chrono::Utc;

/// Outcome of one generation attempt
#[derive(Debug, Clone, thiserror::Error)]
pub enum GeneratorFailure {
    /// The store cannot produce an attestation satisfying the requested
    /// configuration. Recoverable: drives the fallback transition.
    #[error("store cannot satisfy the attestation configuration: {0}")]
    Unsupported(String),

    /// Infrastructure failure. Fatal, propagated to the caller unchanged.
    #[error(transparent)]
    Store(StoreError),
}

/// Issues one key-generation attempt against the secure store
pub struct KeyAttestationGenerator;

impl KeyAttestationGenerator {
    /// Build the attestation configuration for one attempt
    pub fn config_for_attempt(
        alias: &str,
        challenge: &[u8],
        include_device_properties: bool,
    ) -> AttestationConfig {
        AttestationConfig {
            alias: alias.to_string(),
            curve: EcCurve::Secp256r1,
            purposes: vec![KeyPurpose::Sign, KeyPurpose::Verify],
            digests: vec![Digest::Sha256, Digest::Sha384, Digest::Sha512],
            validity_start: Utc::now(),
            attestation_challenge: if challenge.is_empty() {
                None
            } else {
                Some(challenge.to_vec())
            },
            include_device_properties,
        }
    }

    /// Generate a key pair under `alias`, creating or replacing the
    /// store entry — the only persistent side effect in the workflow.
    pub fn generate<S: SecureKeyStore + ?Sized>(
        store: &mut S,
        alias: &str,
        challenge: &[u8],
        include_device_properties: bool,
    ) -> Result<KeyPair, GeneratorFailure> {
        let config = Self::config_for_attempt(alias, challenge, include_device_properties);

        match store.generate_key_pair(&config) {
            Ok(pair) => {
                log::debug!("generated public key: {}", pem_encode(Some(&pair.public)));
                // NULL when the private key is confined to secure hardware
                log::debug!(
                    "generated private key: {}",
                    pem_encode(pair.private.as_deref())
                );
                Ok(pair)
            }
            Err(StoreError::AttestationUnsupported(reason)) => {
                log::debug!(
                    "attestation unsupported for alias '{}' (device_properties={}): {}",
                    alias,
                    include_device_properties,
                    reason
                );
                Err(GeneratorFailure::Unsupported(reason))
            }
            Err(e) => Err(GeneratorFailure::Store(e)),
        }
    }
}
