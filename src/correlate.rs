//! Failure correlation
//!
//! A boundary can process a transaction and still report the attempt as
//! failed, e.g. a confirmation timeout. The correlation id recovered here
//! lets the caller look up what actually happened instead of assuming the
//! transaction was dropped.
//!
//! Correlation is best effort. `None` means no matching attempt could be
//! identified; callers should then report the raw error as is.

use crate::metrics::metrics;
use crate::rpc::{NetworkBoundary, RawBoundaryError, StructuredFailure};
use crate::types::{AccountLocator, CorrelationId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// `Transaction <id> ` or `Signature <id> ` at the start of a line, optionally
/// preceded by `...Error: `. The id is the fourth capture group.
static FAILED_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^((.*)?Error: )?(Transaction|Signature) ([A-Z0-9]{32,}) ")
        .expect("correlation pattern is valid")
});

pub const DEFAULT_CLUSTER: &str = "devnet";

/// Find a correlation id in a free-form error message
pub fn extract_from_message(message: &str) -> Option<CorrelationId> {
    FAILED_SIGNATURE
        .captures(message)
        .and_then(|caps| caps.get(4))
        .map(|m| CorrelationId::from(m.as_str()))
}

/// Correlation id for a raw boundary error
///
/// A structured `signature` field wins over anything in the message text.
pub fn correlate(raw: &RawBoundaryError) -> Option<CorrelationId> {
    if let Some(sig) = raw.signature.as_deref().filter(|s| !s.is_empty()) {
        return Some(CorrelationId::from(sig));
    }
    extract_from_message(&raw.message)
}

/// Same as [`correlate`], honoring a correlation already attached to the failure
pub fn correlate_failure(failure: &StructuredFailure) -> Option<CorrelationId> {
    failure
        .correlation
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| correlate(&failure.raw))
}

/// What an explorer link points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerTarget {
    Address(AccountLocator),
    Transaction(CorrelationId),
}

/// Block explorer link for an address or transaction on `cluster`
pub fn explorer_url(target: &ExplorerTarget, cluster: &str) -> String {
    let cluster = if cluster.is_empty() {
        DEFAULT_CLUSTER
    } else {
        cluster
    };
    match target {
        ExplorerTarget::Address(locator) => format!(
            "https://explorer.solana.com/address/{}?cluster={}",
            locator, cluster
        ),
        ExplorerTarget::Transaction(id) => {
            format!("https://explorer.solana.com/tx/{}?cluster={}", id, cluster)
        }
    }
}

/// Result of diagnosing a failed submission
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    pub correlation: Option<CorrelationId>,
    pub explorer_url: Option<String>,
    /// `None` when logs were not requested or are unavailable
    pub logs: Option<Vec<String>>,
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(id) = &self.correlation else {
            return f.write_str("no correlation id found");
        };
        writeln!(f, "==== Transaction logs for {} ====", id)?;
        if let Some(url) = &self.explorer_url {
            writeln!(f, "{}", url)?;
        }
        match &self.logs {
            Some(lines) => {
                for line in lines {
                    writeln!(f, "{}", line)?;
                }
            }
            None => writeln!(f, "No log messages provided by RPC")?,
        }
        write!(f, "==== END LOGS ====")
    }
}

/// Correlator with an optional log lookup against the boundary
pub struct FailureCorrelator {
    boundary: Arc<dyn NetworkBoundary>,
    cluster: String,
    fetch_logs: bool,
}

impl FailureCorrelator {
    pub fn new(boundary: Arc<dyn NetworkBoundary>) -> Self {
        Self {
            boundary,
            cluster: DEFAULT_CLUSTER.to_string(),
            fetch_logs: true,
        }
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = cluster.into();
        self
    }

    pub fn with_log_fetch(mut self, fetch_logs: bool) -> Self {
        self.fetch_logs = fetch_logs;
        self
    }

    /// Correlate and record the outcome in metrics
    pub fn correlate(&self, failure: &StructuredFailure) -> Option<CorrelationId> {
        let found = correlate_failure(failure);
        match &found {
            Some(id) => {
                metrics().correlations_recovered.inc();
                debug!(signature = %id, "Recovered correlation id from failure");
            }
            None => metrics().correlations_missed.inc(),
        }
        found
    }

    /// Correlate, then look up logs if enabled
    ///
    /// The log lookup never fails the diagnosis; a lookup error is logged
    /// and reported as no logs.
    pub async fn diagnose(&self, failure: &StructuredFailure) -> Diagnosis {
        let correlation = self.correlate(failure);
        let Some(id) = correlation.clone() else {
            return Diagnosis {
                correlation: None,
                explorer_url: None,
                logs: None,
            };
        };

        let logs = if self.fetch_logs {
            match self.boundary.get_transaction_log(&id).await {
                Ok(logs) => logs,
                Err(e) => {
                    warn!(signature = %id, error = %e, "Log lookup failed");
                    None
                }
            }
        } else {
            None
        };

        Diagnosis {
            explorer_url: Some(explorer_url(
                &ExplorerTarget::Transaction(id),
                &self.cluster,
            )),
            correlation,
            logs,
        }
    }
}
