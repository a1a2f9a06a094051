//! Error payloads from the network boundary
//!
//! The boundary's own error text is kept verbatim. Interpretation (finding a
//! correlation id in it) is the correlator's job, not the transport's.

use crate::types::CorrelationId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Raw error payload as reported by the boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBoundaryError {
    /// Human-readable message, unchanged
    pub message: String,

    /// JSON-RPC error code when the boundary sent one
    #[serde(default)]
    pub code: Option<i64>,

    /// Structured transaction signature, when the boundary attached one
    #[serde(default)]
    pub signature: Option<String>,

    /// Any extra data object, unchanged
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl RawBoundaryError {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            signature: None,
            data: None,
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Display for RawBoundaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

/// Failure of a single boundary call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundaryError {
    /// The boundary could not be reached or the reply could not be read
    #[error("Transport error: {0}")]
    Transport(RawBoundaryError),

    /// The boundary answered with an error object
    #[error("Rejected: {0}")]
    Rejection(RawBoundaryError),
}

impl BoundaryError {
    pub fn raw(&self) -> &RawBoundaryError {
        match self {
            Self::Transport(raw) | Self::Rejection(raw) => raw,
        }
    }

    pub fn into_raw(self) -> RawBoundaryError {
        match self {
            Self::Transport(raw) | Self::Rejection(raw) => raw,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transport,
            Self::Rejection(_) => FailureKind::Rejection,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(RawBoundaryError::from_message(message))
    }

    pub fn rejection(message: impl Into<String>) -> Self {
        Self::Rejection(RawBoundaryError::from_message(message))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Rejection,
}

/// A failed submission: the raw payload plus the correlation id, if known
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredFailure {
    pub kind: FailureKind,
    pub raw: RawBoundaryError,
    pub correlation: Option<CorrelationId>,
}

impl StructuredFailure {
    pub fn new(kind: FailureKind, raw: RawBoundaryError) -> Self {
        let correlation = raw
            .signature
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(CorrelationId::from);
        Self {
            kind,
            raw,
            correlation,
        }
    }

    pub fn with_correlation(mut self, correlation: Option<CorrelationId>) -> Self {
        self.correlation = correlation;
        self
    }
}

impl From<BoundaryError> for StructuredFailure {
    fn from(err: BoundaryError) -> Self {
        let kind = err.kind();
        Self::new(kind, err.into_raw())
    }
}

impl fmt::Display for StructuredFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.correlation {
            Some(id) => write!(f, "{} [signature {}]", self.raw, id),
            None => write!(f, "{}", self.raw),
        }
    }
}
