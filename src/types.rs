//! Core value types shared by every pipeline stage
//!
//! All of these are plain immutable values. Identity is always the raw bytes;
//! base-58 text is only a rendering for logs, config files and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Width of every account locator and program identifier
pub const LOCATOR_BYTES: usize = 32;

/// Width of an ed25519 signature
pub const SIGNATURE_BYTES: usize = 64;

/// Failure to parse a base-58 value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid base-58 string: {0}")]
    InvalidBase58(String),

    #[error("wrong length: expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseError> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| ParseError::InvalidBase58(e.to_string()))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| ParseError::WrongLength {
        expected: N,
        actual,
    })
}

/// Fixed-width account address
///
/// Equal iff the byte representations are equal. A locator carries no bump;
/// derived locators are paired with their bump in [`DerivedAddress`].
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AccountLocator(pub [u8; LOCATOR_BYTES]);

/// Programs are addressed exactly like accounts
pub type ProgramId = AccountLocator;

impl AccountLocator {
    pub const fn new(bytes: [u8; LOCATOR_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; LOCATOR_BYTES] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; LOCATOR_BYTES] {
        &self.0
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        let arr: [u8; LOCATOR_BYTES] =
            bytes.try_into().map_err(|_| ParseError::WrongLength {
                expected: LOCATOR_BYTES,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Whether these bytes are a valid ed25519 public key
    pub fn is_on_curve(&self) -> bool {
        crate::address::is_on_curve(&self.0)
    }
}

impl AsRef<[u8]> for AccountLocator {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; LOCATOR_BYTES]> for AccountLocator {
    fn from(bytes: [u8; LOCATOR_BYTES]) -> Self {
        Self(bytes)
    }
}

impl FromStr for AccountLocator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<LOCATOR_BYTES>(s).map(Self)
    }
}

impl fmt::Display for AccountLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for AccountLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountLocator({})", self.to_base58())
    }
}

/// A program-derived locator together with the bump that pushed it off the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedAddress {
    pub locator: AccountLocator,
    pub bump: u8,
}

impl DerivedAddress {
    pub fn locator(&self) -> AccountLocator {
        self.locator
    }

    pub fn bump(&self) -> u8 {
        self.bump
    }
}

/// Hash of a recent block, as carried in every message
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blockhash(pub [u8; 32]);

impl FromStr for Blockhash {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<32>(s).map(Self)
    }
}

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blockhash({})", self)
    }
}

/// Short-lived reference to recent network state
///
/// Only the blockhash is part of the message and of the token's identity.
/// `last_valid_block_height` and the local expiry are hints supplied by
/// whoever fetched the token; a token without an expiry is never reported
/// stale locally.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FreshnessToken {
    pub blockhash: Blockhash,

    #[serde(skip)]
    pub last_valid_block_height: u64,

    #[serde(skip)]
    expires_at: Option<Instant>,
}

impl FreshnessToken {
    pub fn new(blockhash: Blockhash, last_valid_block_height: u64) -> Self {
        Self {
            blockhash,
            last_valid_block_height,
            expires_at: None,
        }
    }

    /// Attach a validity window measured from now
    pub fn with_validity(mut self, window: Duration) -> Self {
        self.expires_at = Instant::now().checked_add(window);
        self
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// True only when the fetcher reported a window and it has elapsed
    pub fn is_known_expired(&self) -> bool {
        match self.expires_at {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

impl PartialEq for FreshnessToken {
    fn eq(&self, other: &Self) -> bool {
        self.blockhash == other.blockhash
    }
}

impl Eq for FreshnessToken {}

/// ed25519 signature over canonical message bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; SIGNATURE_BYTES]);

impl Signature {
    pub fn to_bytes(self) -> [u8; SIGNATURE_BYTES] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_BYTES] {
        &self.0
    }

    /// The network names a transaction by its fee payer's signature
    pub fn to_correlation_id(&self) -> CorrelationId {
        CorrelationId(self.to_string())
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_BYTES])
    }
}

impl FromStr for Signature {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<SIGNATURE_BYTES>(s).map(Self)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

/// Handle the network uses to name one submitted transaction attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
