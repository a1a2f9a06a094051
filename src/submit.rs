//! Submission of signed transactions
//!
//! One call, one network write. Failures come back as data: the pipeline
//! never resubmits on its own because an attempt reported as failed may
//! still have landed.

use crate::errors::{PipelineError, PipelineResult};
use crate::metrics::{metrics, Timer};
use crate::rpc::{FailureKind, NetworkBoundary, StructuredFailure};
use crate::tx_builder::SignedTransaction;
use crate::types::CorrelationId;
use std::sync::Arc;
use tracing::{info, warn};

/// Network outcome of a submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionResult {
    /// The boundary accepted the transaction under this id
    Accepted(CorrelationId),

    /// The boundary failed or rejected the attempt; payload kept verbatim
    Failed(StructuredFailure),
}

impl SubmissionResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn correlation_id(&self) -> Option<&CorrelationId> {
        match self {
            Self::Accepted(id) => Some(id),
            Self::Failed(failure) => failure.correlation.as_ref(),
        }
    }

    /// Fold a failure into the matching [`PipelineError`] variant
    pub fn into_result(self) -> PipelineResult<CorrelationId> {
        match self {
            Self::Accepted(id) => Ok(id),
            Self::Failed(failure) => Err(match failure.kind {
                FailureKind::Transport => PipelineError::Transport(failure),
                FailureKind::Rejection => PipelineError::BoundaryRejection(failure),
            }),
        }
    }
}

/// Sends signed transactions through a [`NetworkBoundary`]
#[derive(Clone)]
pub struct Submitter {
    boundary: Arc<dyn NetworkBoundary>,
}

impl Submitter {
    pub fn new(boundary: Arc<dyn NetworkBoundary>) -> Self {
        Self { boundary }
    }

    /// Submit `tx` exactly once
    ///
    /// Returns `Err` only for problems found before the network write: a
    /// freshness token already known to be expired, or a transaction that
    /// cannot be encoded. Everything the boundary reports is `Ok`.
    pub async fn submit(&self, tx: &SignedTransaction) -> PipelineResult<SubmissionResult> {
        if tx.message().freshness_token().is_known_expired() {
            metrics().submissions_stale.inc();
            return Err(PipelineError::StaleFreshnessToken);
        }
        let wire = tx.to_wire_bytes()?;

        let timer = Timer::new();
        let outcome = self.boundary.submit_transaction(&wire).await;
        timer.observe_duration(&metrics().submit_latency);

        match outcome {
            Ok(id) => {
                metrics().submissions_accepted.inc();
                info!(signature = %id, wire_len = wire.len(), "Transaction accepted");
                Ok(SubmissionResult::Accepted(id))
            }
            Err(err) => {
                let failure = StructuredFailure::from(err);
                let kind = match failure.kind {
                    FailureKind::Transport => "transport",
                    FailureKind::Rejection => "rejection",
                };
                metrics().submissions_failed.with_label_values(&[kind]).inc();
                warn!(kind, error = %failure.raw, "Transaction submission failed");
                Ok(SubmissionResult::Failed(failure))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::mock::ScriptedOutcome;
    use crate::rpc::MockBoundary;
    use crate::tx_builder::{assemble, AccountMeta, Instruction, InstructionBatcher};
    use crate::wallet::Keypair;
    use std::time::Duration;

    async fn signed(mock: &MockBoundary, payer: &Keypair) -> SignedTransaction {
        let token = mock.get_freshness_token().await.unwrap();
        let batch = InstructionBatcher::new()
            .with(Instruction::new(
                crate::address::well_known::SYSTEM_PROGRAM_ID,
                vec![AccountMeta::new(payer.locator(), true)],
                vec![0; 4],
            ))
            .unwrap()
            .finalize();
        assemble(payer.locator(), token, batch, &[payer]).unwrap()
    }

    #[tokio::test]
    async fn test_accepted_submission() {
        let mock = MockBoundary::new();
        let payer = Keypair::generate();
        let tx = signed(&mock, &payer).await;

        let result = Submitter::new(Arc::new(mock.clone()))
            .submit(&tx)
            .await
            .unwrap();
        assert_eq!(result, SubmissionResult::Accepted(tx.correlation_id().unwrap()));
        assert_eq!(mock.submit_calls().await, 1);
    }

    #[tokio::test]
    async fn test_stale_token_never_reaches_network() {
        let mock = MockBoundary::new().with_token_validity(Duration::from_millis(50));
        let payer = Keypair::generate();
        let tx = signed(&mock, &payer).await;

        // token expires between assembly and submission
        tokio::time::sleep(Duration::from_millis(120)).await;

        let err = Submitter::new(Arc::new(mock.clone()))
            .submit(&tx)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::StaleFreshnessToken));
        assert!(err.is_recoverable());
        assert_eq!(mock.submit_calls().await, 0);
    }

    #[tokio::test]
    async fn test_failure_is_wrapped_verbatim() {
        let mock = MockBoundary::new();
        let payer = Keypair::generate();
        let tx = signed(&mock, &payer).await;
        mock.script_next_submit(ScriptedOutcome::Transport("503 Service Unavailable".into()))
            .await;

        let result = Submitter::new(Arc::new(mock.clone()))
            .submit(&tx)
            .await
            .unwrap();
        match &result {
            SubmissionResult::Failed(failure) => {
                assert_eq!(failure.kind, FailureKind::Transport);
                assert_eq!(failure.raw.message, "503 Service Unavailable");
            }
            other => panic!("Expected failure, got {:?}", other),
        }
        assert!(matches!(
            result.into_result(),
            Err(PipelineError::Transport(_))
        ));
        assert_eq!(mock.submit_calls().await, 1);
    }
}
