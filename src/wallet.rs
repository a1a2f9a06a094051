//! Signing identities
//!
//! Private key material never leaves a [`SigningIdentity`]; instructions and
//! messages only ever reference an identity through its public locator.

use crate::errors::{PipelineError, PipelineResult};
use crate::types::{AccountLocator, Signature};
use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::RngCore;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Anything that can sign bytes on behalf of a locator
pub trait SigningIdentity: Send + Sync {
    /// The locator signatures from this identity verify against
    fn public_locator(&self) -> AccountLocator;

    /// Sign `message` exactly as given
    fn sign_bytes(&self, message: &[u8]) -> PipelineResult<Signature>;
}

/// ed25519 keypair held in memory
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Fresh random keypair
    pub fn generate() -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self {
            signing_key: SigningKey::from_bytes(&secret),
        }
    }

    /// Keypair from a 32-byte secret seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Keypair from the 64-byte `secret || public` layout used in key files
    ///
    /// The public half must match the secret half; all-zero keys are rejected.
    pub fn from_bytes(bytes: &[u8]) -> PipelineResult<Self> {
        if bytes.len() != 64 {
            return Err(PipelineError::Keypair(format!(
                "Invalid keypair length: expected 64 bytes, got {}",
                bytes.len()
            )));
        }
        if bytes.iter().all(|&b| b == 0) {
            return Err(PipelineError::Keypair(
                "Invalid keypair: all-zero key rejected".to_string(),
            ));
        }
        let mut arr = [0u8; 64];
        arr.copy_from_slice(bytes);
        let signing_key = SigningKey::from_keypair_bytes(&arr)
            .map_err(|e| PipelineError::Keypair(format!("Invalid keypair bytes: {}", e)))?;
        Ok(Self { signing_key })
    }

    /// Load a key file: a JSON array of 64 numbers, or the raw 64 bytes
    pub fn from_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read(path).map_err(|e| {
            PipelineError::Keypair(format!(
                "Failed to read keypair file {}: {}",
                path.display(),
                e
            ))
        })?;

        if contents.len() == 64 {
            return Self::from_bytes(&contents);
        }

        let bytes: Vec<u8> = serde_json::from_slice(&contents)
            .map_err(|e| PipelineError::Keypair(format!("Failed to parse keypair JSON: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// The 64-byte `secret || public` layout
    pub fn to_bytes(&self) -> [u8; 64] {
        self.signing_key.to_keypair_bytes()
    }

    pub fn locator(&self) -> AccountLocator {
        AccountLocator(self.signing_key.verifying_key().to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("locator", &self.locator())
            .finish_non_exhaustive()
    }
}

impl SigningIdentity for Keypair {
    fn public_locator(&self) -> AccountLocator {
        self.locator()
    }

    fn sign_bytes(&self, message: &[u8]) -> PipelineResult<Signature> {
        Ok(Signature(self.signing_key.sign(message).to_bytes()))
    }
}

/// Check an ed25519 signature against a locator
///
/// Returns `false` for locators that are not valid public keys, which is
/// always the case for program-derived locators.
pub fn verify_signature(locator: &AccountLocator, message: &[u8], signature: &Signature) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(locator.as_bytes()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    key.verify(message, &sig).is_ok()
}

/// Read-only set of signing identities, loaded once at startup
#[derive(Clone, Default)]
pub struct SignerSet {
    identities: BTreeMap<AccountLocator, Arc<dyn SigningIdentity>>,
}

impl SignerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identity; a second identity for the same locator replaces the first
    pub fn with(mut self, identity: Arc<dyn SigningIdentity>) -> Self {
        self.identities.insert(identity.public_locator(), identity);
        self
    }

    pub fn get(&self, locator: &AccountLocator) -> Option<&Arc<dyn SigningIdentity>> {
        self.identities.get(locator)
    }

    pub fn contains(&self, locator: &AccountLocator) -> bool {
        self.identities.contains_key(locator)
    }

    pub fn locators(&self) -> impl Iterator<Item = &AccountLocator> {
        self.identities.keys()
    }

    pub fn identities(&self) -> Vec<&dyn SigningIdentity> {
        self.identities.values().map(|i| i.as_ref()).collect()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

impl fmt::Debug for SignerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.identities.keys()).finish()
    }
}
