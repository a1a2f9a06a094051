//! Error taxonomy for the derivation and transaction pipeline
//!
//! Every stage returns [`PipelineError`]. Variants are split into two kinds:
//! - fatal: a programming or configuration mistake, surfaced immediately and
//!   never retried (bad seeds, missing signer, malformed instruction)
//! - recoverable: the caller can act on it (refetch a freshness token, decide
//!   whether to resubmit after a transport failure)
//!
//! Failure to find a correlation id is not an error; the correlator returns
//! `None` for that.

use crate::rpc::{BoundaryError, FailureKind, StructuredFailure};
use crate::types::AccountLocator;
use thiserror::Error;

/// Comprehensive error type for all pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Seeds violate the network limits (too many, too long, empty tag) or
    /// a single-bump derivation landed on the curve
    #[error("Invalid seeds: {0}")]
    InvalidSeeds(String),

    /// No bump in 255..=0 produced an off-curve locator
    #[error("Derivation exhausted all bump seeds (program={program})")]
    DerivationExhausted {
        /// Owning program of the failed derivation
        program: AccountLocator,
    },

    /// Instruction failed the batcher's shape checks
    #[error("Invalid instruction at index {index}: {reason}")]
    InvalidInstruction { index: usize, reason: String },

    /// An account marked `is_signer` has no signature in the assembled transaction
    #[error("Missing signature for signer {0}")]
    MissingSignature(AccountLocator),

    /// The freshness token is already known to be expired
    ///
    /// Refetch a token and reassemble; the pipeline never refetches on its own.
    #[error("Freshness token is stale; refetch and reassemble")]
    StaleFreshnessToken,

    /// A signing identity failed to produce a signature
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Keypair material could not be loaded or validated
    #[error("Keypair error: {0}")]
    Keypair(String),

    /// Canonical (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The network boundary could not be reached or did not answer
    #[error("Transport failure: {0}")]
    Transport(StructuredFailure),

    /// The network boundary answered and rejected the transaction
    #[error("Boundary rejection: {0}")]
    BoundaryRejection(StructuredFailure),
}

impl PipelineError {
    /// Fatal errors indicate a design-time bug; never retry them
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidSeeds(_)
            | Self::DerivationExhausted { .. }
            | Self::InvalidInstruction { .. }
            | Self::MissingSignature(_)
            | Self::Signing(_)
            | Self::Keypair(_)
            | Self::Serialization(_) => true,

            Self::StaleFreshnessToken | Self::Transport(_) | Self::BoundaryRejection(_) => false,
        }
    }

    /// Recoverable errors are caller-actionable
    ///
    /// Transport and rejection failures are recoverable but the pipeline does
    /// not retry them: the transaction may have landed, so check the
    /// correlation id before resubmitting.
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// The structured failure carried by transport/rejection errors
    pub fn failure(&self) -> Option<&StructuredFailure> {
        match self {
            Self::Transport(f) | Self::BoundaryRejection(f) => Some(f),
            _ => None,
        }
    }

    /// Get the error category for metrics and logs
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidSeeds(_) => "seeds",
            Self::DerivationExhausted { .. } => "derivation",
            Self::InvalidInstruction { .. } => "instruction",
            Self::MissingSignature(_) => "signature",
            Self::StaleFreshnessToken => "freshness",
            Self::Signing(_) => "signing",
            Self::Keypair(_) => "keypair",
            Self::Serialization(_) => "serialization",
            Self::Transport(_) => "transport",
            Self::BoundaryRejection(_) => "rejection",
        }
    }
}

impl From<BoundaryError> for PipelineError {
    fn from(e: BoundaryError) -> Self {
        let failure = StructuredFailure::from(e);
        match failure.kind {
            FailureKind::Transport => Self::Transport(failure),
            FailureKind::Rejection => Self::BoundaryRejection(failure),
        }
    }
}

impl From<bincode::Error> for PipelineError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

// Convenience constructors
impl PipelineError {
    pub fn invalid_seeds(reason: impl Into<String>) -> Self {
        Self::InvalidSeeds(reason.into())
    }

    pub fn invalid_instruction(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidInstruction {
            index,
            reason: reason.into(),
        }
    }

    pub fn signing(reason: impl Into<String>) -> Self {
        Self::Signing(reason.into())
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
