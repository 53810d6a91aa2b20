//! Attestation orchestrator — the retry/fallback state machine
//!
//! `TryWithDeviceProps → TryWithoutDeviceProps → Done(failure)`, with a
//! success exit from either trying state straight to the chain load.
//! Device-properties attestation is requested first because it certifies
//! more; some hardware accepts basic key attestation but rejects the
//! device-properties extension, so one retry without it maximizes
//! attestation success without caller-visible complexity.
//!
//! The orchestrator owns one attempt sequence per invocation and keeps
//! no state across invocations. The secure store is injected at
//! construction so tests can substitute a double.

use crate::attest::challenge::{validate_challenge, ChallengeError};
use crate::attest::generator::{GeneratorFailure, KeyAttestationGenerator};
use crate::attest::loader::load_chain;
use crate::attest::pem::pem_encode_chain;
use crate::store::keystore::{CertificateChain, SecureKeyStore, StoreError};
use serde::{Deserialize, Serialize};

/// Fatal attestation failures surfaced to the caller
///
/// `Unsupported` generation failures never appear here; they only steer
/// the state machine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AttestError {
    #[error(transparent)]
    Challenge(#[from] ChallengeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Unified outcome of one orchestrator invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationResult {
    pub success: bool,
    /// Leaf-first DER chain; empty on failure or when no chain is stored
    pub chain: CertificateChain,
}

impl AttestationResult {
    /// Chain as PEM blocks, one per certificate, for the transport layer
    pub fn pem_chain(&self) -> Vec<String> {
        pem_encode_chain(&self.chain)
    }
}

/// Trying states of the attempt sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttestState {
    TryWithDeviceProps,
    TryWithoutDeviceProps,
}

/// Drives generation attempts, chain loading and result delivery
pub struct AttestationOrchestrator<'a, S: SecureKeyStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: SecureKeyStore + ?Sized> AttestationOrchestrator<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Run the full attestation workflow for `alias` and deliver the
    /// `(found, chain)` outcome to `on_result`.
    ///
    /// Challenge violations and store-level failures are returned as
    /// errors before `on_result` runs; everything else, including a
    /// doubly-unsupported attestation, reaches the callback.
    pub fn attest<T>(
        &mut self,
        alias: &str,
        challenge: &[u8],
        on_result: impl FnOnce(bool, &CertificateChain) -> T,
    ) -> Result<T, AttestError> {
        validate_challenge(challenge)?;

        // Capability negotiation: hardware that cannot certify device
        // properties at all gets a single attempt with the flag off,
        // instead of a retry tier that is known to fail.
        let mut state = if self.store.supports_device_properties() {
            AttestState::TryWithDeviceProps
        } else {
            log::debug!(
                "store lacks device-properties attestation, single-attempt mode for '{}'",
                alias
            );
            AttestState::TryWithoutDeviceProps
        };

        loop {
            let include = state == AttestState::TryWithDeviceProps;
            log::debug!("attestation attempt for '{}': {:?}", alias, state);

            match KeyAttestationGenerator::generate(self.store, alias, challenge, include) {
                Ok(_) => break,
                Err(GeneratorFailure::Unsupported(_)) if include => {
                    state = AttestState::TryWithoutDeviceProps;
                }
                Err(GeneratorFailure::Unsupported(reason)) => {
                    log::warn!("attestation failed for '{}': {}", alias, reason);
                    let empty = Vec::new();
                    return Ok(on_result(false, &empty));
                }
                Err(GeneratorFailure::Store(e)) => return Err(AttestError::Store(e)),
            }
        }

        let (found, chain) = load_chain(self.store, alias);
        Ok(on_result(found, &chain))
    }

    /// Like [`attest`](Self::attest), materialized as the transport artifact
    pub fn attest_result(
        &mut self,
        alias: &str,
        challenge: &[u8],
    ) -> Result<AttestationResult, AttestError> {
        self.attest(alias, challenge, |success, chain| AttestationResult {
            success,
            chain: chain.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::keystore::{AttestationConfig, KeyPair};
    use crate::store::software::SoftwareKeyStore;

    /// Store double scripting failures around a real software store
    struct ScriptedStore {
        inner: SoftwareKeyStore,
        reject_device_properties: bool,
        reject_all: bool,
        storage_error: bool,
        generate_calls: usize,
    }

    impl ScriptedStore {
        fn new() -> Self {
            Self {
                inner: SoftwareKeyStore::new(),
                reject_device_properties: false,
                reject_all: false,
                storage_error: false,
                generate_calls: 0,
            }
        }
    }

    impl SecureKeyStore for ScriptedStore {
        fn generate_key_pair(
            &mut self,
            config: &AttestationConfig,
        ) -> Result<KeyPair, StoreError> {
            self.generate_calls += 1;
            if self.storage_error {
                return Err(StoreError::Storage("scripted storage failure".into()));
            }
            if self.reject_all {
                return Err(StoreError::AttestationUnsupported(
                    "scripted rejection".into(),
                ));
            }
            if self.reject_device_properties && config.include_device_properties {
                return Err(StoreError::AttestationUnsupported(
                    "device properties rejected by hardware".into(),
                ));
            }
            self.inner.generate_key_pair(config)
        }

        fn certificate_chain(&self, alias: &str) -> CertificateChain {
            self.inner.certificate_chain(alias)
        }

        // Advertises support even when generation is scripted to reject,
        // modelling hardware that cannot honor what the API offers
        fn supports_device_properties(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_full_attestation_success() {
        // Scenario: device supports full attestation, 16-zero-byte challenge
        let mut store = ScriptedStore::new();
        let mut orch = AttestationOrchestrator::new(&mut store);

        let result = orch.attest_result("device-key-1", &[0u8; 16]).unwrap();
        assert!(result.success);
        assert!(!result.chain.is_empty());

        let leaf_pem = &result.pem_chain()[0];
        assert!(leaf_pem.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(leaf_pem.ends_with("-----END CERTIFICATE-----\n"));

        // First attempt succeeded, so no fallback attempt was made
        assert_eq!(store.generate_calls, 1);
    }

    #[test]
    fn test_fallback_without_device_properties() {
        let mut store = ScriptedStore::new();
        store.reject_device_properties = true;
        let mut orch = AttestationOrchestrator::new(&mut store);

        let result = orch.attest_result("device-key-1", &[0u8; 16]).unwrap();
        assert!(result.success);
        assert!(!result.chain.is_empty());
        assert_eq!(store.generate_calls, 2);

        // The surviving entry was generated without the flag
        let entry = store.inner.entry("device-key-1").unwrap();
        assert!(!entry.config.include_device_properties);
    }

    #[test]
    fn test_both_attempts_unsupported() {
        let mut store = ScriptedStore::new();
        store.reject_all = true;
        let mut orch = AttestationOrchestrator::new(&mut store);

        // No error raised: the failure reaches the callback as (false, [])
        let result = orch.attest_result("device-key-1", &[0u8; 16]).unwrap();
        assert!(!result.success);
        assert!(result.chain.is_empty());
        assert_eq!(store.generate_calls, 2);
    }

    #[test]
    fn test_empty_challenge_both_unsupported() {
        let mut store = ScriptedStore::new();
        store.reject_all = true;
        let mut orch = AttestationOrchestrator::new(&mut store);

        let result = orch.attest_result("device-key-1", &[]).unwrap();
        assert!(!result.success);
        assert!(result.chain.is_empty());
    }

    #[test]
    fn test_short_challenge_rejected_before_store_call() {
        let mut store = ScriptedStore::new();
        let mut orch = AttestationOrchestrator::new(&mut store);

        let err = orch.attest_result("device-key-1", &[0u8; 10]).unwrap_err();
        assert!(matches!(
            err,
            AttestError::Challenge(ChallengeError::TooShort { len: 10 })
        ));
        assert_eq!(store.generate_calls, 0);
    }

    #[test]
    fn test_store_error_propagates() {
        let mut store = ScriptedStore::new();
        store.storage_error = true;
        let mut orch = AttestationOrchestrator::new(&mut store);

        let mut callback_ran = false;
        let err = orch
            .attest("device-key-1", &[0u8; 16], |_, _| callback_ran = true)
            .unwrap_err();
        assert!(matches!(err, AttestError::Store(StoreError::Storage(_))));
        assert!(!callback_ran);
        assert_eq!(store.generate_calls, 1);
    }

    #[test]
    fn test_capability_negotiation_single_attempt() {
        // A store that reports no device-properties support skips the
        // first tier entirely
        let mut store = SoftwareKeyStore::new().without_device_properties();
        let mut orch = AttestationOrchestrator::new(&mut store);

        let result = orch.attest_result("device-key-1", &[0u8; 16]).unwrap();
        assert!(result.success);
        assert_eq!(store.stats.generate_calls, 1);

        let entry = store.entry("device-key-1").unwrap();
        assert!(!entry.config.include_device_properties);
    }

    #[test]
    fn test_callback_return_value_passes_through() {
        let mut store = ScriptedStore::new();
        let mut orch = AttestationOrchestrator::new(&mut store);

        let chain_len = orch
            .attest("device-key-1", &[0u8; 16], |found, chain| {
                assert!(found);
                chain.len()
            })
            .unwrap();
        assert!(chain_len > 0);
    }
}
