//! Software key store — simulated secure-hardware backend
//!
//! Stands in for a hardware keystore when none is available:
//! key material is derived with SHA256 (NOT hardware-secured, dev/test
//! only), certificates are DER-framed JSON records, and entries persist
//! as a JSON file. Capability flags and call counters make the store
//! usable as a test double for the attestation workflow.

use super::keystore::{
    AttestationConfig, CertificateChain, CertificateDer, KeyPair, SecureKeyStore, StoreError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Durable record kept under an alias
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyStoreEntry {
    pub alias: String,
    pub key_pair: KeyPair,
    /// Leaf-first certificate chain issued at generation time
    pub chain: CertificateChain,
    /// Echo of the configuration the entry was generated with
    pub config: AttestationConfig,
    pub created_at: DateTime<Utc>,
}

/// Call counters, also used by tests to observe store traffic
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub generate_calls: u64,
    pub generate_failures: u64,
    pub entries_replaced: u64,
}

/// Software-simulated secure key store
#[derive(Debug, Serialize, Deserialize)]
pub struct SoftwareKeyStore {
    /// Unique store identifier
    pub id: String,
    entries: HashMap<String, KeyStoreEntry>,
    /// Backing file; `None` for a purely in-memory store
    path: Option<PathBuf>,
    /// Root issuing key the whole simulated PKI derives from
    root_key: Vec<u8>,
    device_properties_supported: bool,
    attestation_challenge_supported: bool,
    exportable_private_keys: bool,
    /// When set, every generation attempt fails with a storage error
    fail_storage: Option<String>,
    pub stats: StoreStats,
    created_at: DateTime<Utc>,
}

impl SoftwareKeyStore {
    /// Create an in-memory store with full attestation capabilities
    pub fn new() -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let root_key: [u8; 32] = rand::random();

        log::info!(
            "software key store initialized: id={} (simulated, NOT hardware-secured)",
            &id[..8]
        );

        Self {
            id,
            entries: HashMap::new(),
            path: None,
            root_key: root_key.to_vec(),
            device_properties_supported: true,
            attestation_challenge_supported: true,
            exportable_private_keys: false,
            fail_storage: None,
            stats: StoreStats::default(),
            created_at: Utc::now(),
        }
    }

    /// Open a file-backed store, loading existing entries if present
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                if let Ok(store) = serde_json::from_str::<SoftwareKeyStore>(&data) {
                    log::info!(
                        "software key store loaded: {} entries from {}",
                        store.entries.len(),
                        path.display()
                    );
                    return store;
                }
            }
            log::warn!("store file {} unreadable, starting fresh", path.display());
        }
        let mut store = Self::new();
        store.path = Some(path);
        store
    }

    /// Persist the store to its backing file
    pub fn save(&self) -> Result<(), StoreError> {
        let path = match &self.path {
            Some(p) => p,
            None => return Ok(()), // in-memory store, nothing to do
        };
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Storage(format!("serialize store: {}", e)))?;
        std::fs::write(path, json)
            .map_err(|e| StoreError::Storage(format!("write {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Simulate hardware without device-properties attestation
    pub fn without_device_properties(mut self) -> Self {
        self.device_properties_supported = false;
        self
    }

    /// Simulate hardware without the attestation-challenge extension
    pub fn without_attestation_challenge(mut self) -> Self {
        self.attestation_challenge_supported = false;
        self
    }

    /// Export private key bytes instead of confining them to the store
    pub fn with_exportable_private_keys(mut self) -> Self {
        self.exportable_private_keys = true;
        self
    }

    /// Force every generation attempt to fail with a storage error
    pub fn failing_storage(mut self, reason: &str) -> Self {
        self.fail_storage = Some(reason.to_string());
        self
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    pub fn entry(&self, alias: &str) -> Option<&KeyStoreEntry> {
        self.entries.get(alias)
    }

    pub fn remove(&mut self, alias: &str) -> bool {
        self.entries.remove(alias).is_some()
    }

    pub fn aliases(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "SoftwareKeyStore {} | {} entries | {} generations ({} failed, {} replaced)",
            &self.id[..8],
            self.entries.len(),
            self.stats.generate_calls,
            self.stats.generate_failures,
            self.stats.entries_replaced,
        )
    }

    // --- Internal helpers ---

    /// Derive a pseudo P-256 key pair for an alias (simulated via SHA256)
    fn derive_key_pair(&self, alias: &str) -> KeyPair {
        // Fresh nonce so regenerating an alias yields new key material
        let nonce: [u8; 16] = rand::random();

        let secret = {
            let mut h = Sha256::new();
            h.update(&self.root_key);
            h.update(alias.as_bytes());
            h.update(nonce);
            h.update(b"keyattest-secret-v1");
            h.finalize()
        };

        // Uncompressed-point shape: 0x04 || X || Y
        let mut public = Vec::with_capacity(65);
        public.push(0x04);
        for coord in [b"x".as_slice(), b"y".as_slice()] {
            let mut h = Sha256::new();
            h.update(&secret);
            h.update(coord);
            public.extend_from_slice(&h.finalize());
        }

        let private = if self.exportable_private_keys {
            Some(secret.to_vec())
        } else {
            None // confined to the (simulated) hardware
        };

        KeyPair { public, private }
    }

    /// Issue the leaf/intermediate/root chain for a generated key
    fn issue_chain(
        &self,
        config: &AttestationConfig,
        public: &[u8],
        challenge_applied: Option<&[u8]>,
    ) -> CertificateChain {
        let root = self.issue_certificate(
            "keyattest-sim-root",
            "keyattest-sim-root",
            &self.root_key,
            None,
            false,
            config.validity_start,
        );
        let intermediate_key = {
            let mut h = Sha256::new();
            h.update(&self.root_key);
            h.update(b"keyattest-intermediate-v1");
            h.finalize()
        };
        let intermediate = self.issue_certificate(
            "keyattest-sim-intermediate",
            "keyattest-sim-root",
            &intermediate_key,
            None,
            false,
            config.validity_start,
        );
        let leaf = self.issue_certificate(
            &config.alias,
            "keyattest-sim-intermediate",
            public,
            challenge_applied,
            config.include_device_properties,
            config.validity_start,
        );
        vec![leaf, intermediate, root]
    }

    /// Build one DER-framed simulated certificate
    fn issue_certificate(
        &self,
        subject: &str,
        issuer: &str,
        public: &[u8],
        challenge: Option<&[u8]>,
        device_properties: bool,
        not_before: DateTime<Utc>,
    ) -> CertificateDer {
        let tbs = SimulatedTbs {
            serial: uuid::Uuid::new_v4().to_string(),
            subject: subject.to_string(),
            issuer: issuer.to_string(),
            public_key: hex::encode(public),
            attestation_challenge: challenge.map(hex::encode),
            device_properties_attested: device_properties,
            not_before,
        };
        let tbs_json = serde_json::to_vec(&tbs).unwrap_or_default();

        let signature = {
            let mut h = Sha256::new();
            h.update(&self.root_key);
            h.update(&tbs_json);
            h.update(b"keyattest-cert-sig-v1");
            h.finalize()
        };

        // SEQUENCE tag with a two-byte length, enough DER shape for
        // transport and framing tests
        let mut body = tbs_json;
        body.extend_from_slice(&signature);
        let mut cert = vec![0x30, 0x82, (body.len() >> 8) as u8, (body.len() & 0xff) as u8];
        cert.extend_from_slice(&body);
        cert
    }
}

impl Default for SoftwareKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

/// To-be-signed payload of a simulated certificate
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SimulatedTbs {
    serial: String,
    subject: String,
    issuer: String,
    public_key: String,
    attestation_challenge: Option<String>,
    device_properties_attested: bool,
    not_before: DateTime<Utc>,
}

impl SecureKeyStore for SoftwareKeyStore {
    fn generate_key_pair(&mut self, config: &AttestationConfig) -> Result<KeyPair, StoreError> {
        self.stats.generate_calls += 1;

        if let Some(reason) = &self.fail_storage {
            self.stats.generate_failures += 1;
            return Err(StoreError::Storage(reason.clone()));
        }
        if config.include_device_properties && !self.device_properties_supported {
            self.stats.generate_failures += 1;
            return Err(StoreError::AttestationUnsupported(
                "device properties attestation not available on this store".to_string(),
            ));
        }

        // A store lacking the challenge extension omits it transparently
        let challenge_applied = config
            .attestation_challenge
            .as_deref()
            .filter(|_| self.attestation_challenge_supported);

        let key_pair = self.derive_key_pair(&config.alias);
        let chain = self.issue_chain(config, &key_pair.public, challenge_applied);

        let entry = KeyStoreEntry {
            alias: config.alias.clone(),
            key_pair: key_pair.clone(),
            chain,
            config: config.clone(),
            created_at: Utc::now(),
        };
        if self.entries.insert(config.alias.clone(), entry).is_some() {
            self.stats.entries_replaced += 1;
        }

        log::info!(
            "generated key pair under alias '{}' (device_properties={}, challenge={})",
            config.alias,
            config.include_device_properties,
            challenge_applied.is_some(),
        );

        if let Err(e) = self.save() {
            log::warn!("persisting key store failed: {}", e);
        }

        Ok(key_pair)
    }

    fn certificate_chain(&self, alias: &str) -> CertificateChain {
        self.entries
            .get(alias)
            .map(|e| e.chain.clone())
            .unwrap_or_default()
    }

    fn supports_device_properties(&self) -> bool {
        self.device_properties_supported
    }

    fn supports_attestation_challenge(&self) -> bool {
        self.attestation_challenge_supported
    }
}
