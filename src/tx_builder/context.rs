//! Pipeline context
//!
//! Holds the network boundary, the loaded signing identities and the fee
//! payer, and threads them explicitly through each step. Nothing here is
//! mutated after construction, so one context can be shared across tasks
//! behind an `Arc`.

use super::builder::assemble;
use super::instructions::InstructionBatch;
use super::output::SignedTransaction;
use crate::correlate::{Diagnosis, FailureCorrelator, DEFAULT_CLUSTER};
use crate::errors::PipelineResult;
use crate::rpc::{NetworkBoundary, StructuredFailure};
use crate::submit::{SubmissionResult, Submitter};
use crate::types::{AccountLocator, FreshnessToken};
use crate::wallet::SignerSet;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct PipelineContext {
    boundary: Arc<dyn NetworkBoundary>,
    signers: SignerSet,
    fee_payer: AccountLocator,
    cluster: String,
}

impl PipelineContext {
    /// The fee payer is not added to `signers` implicitly; load its identity
    /// into the set if it has to sign.
    pub fn new(
        boundary: Arc<dyn NetworkBoundary>,
        signers: SignerSet,
        fee_payer: AccountLocator,
    ) -> Self {
        Self {
            boundary,
            signers,
            fee_payer,
            cluster: DEFAULT_CLUSTER.to_string(),
        }
    }

    /// Cluster name used in explorer links
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = cluster.into();
        self
    }

    pub fn fee_payer(&self) -> AccountLocator {
        self.fee_payer
    }

    pub fn signers(&self) -> &SignerSet {
        &self.signers
    }

    pub fn boundary(&self) -> &Arc<dyn NetworkBoundary> {
        &self.boundary
    }

    pub async fn fetch_token(&self) -> PipelineResult<FreshnessToken> {
        Ok(self.boundary.get_freshness_token().await?)
    }

    /// Lamports an account of `data_len` bytes must hold to stay rent exempt
    pub async fn minimum_reserve(&self, data_len: usize) -> PipelineResult<u64> {
        Ok(self.boundary.get_minimum_reserve(data_len).await?)
    }

    /// Assemble `batch` against `token`, signing with every loaded identity
    pub fn assemble(
        &self,
        token: FreshnessToken,
        batch: InstructionBatch,
    ) -> PipelineResult<SignedTransaction> {
        assemble(self.fee_payer, token, batch, &self.signers.identities())
    }

    /// Fetch a token, assemble, submit once
    ///
    /// A failed submission comes back as `SubmissionResult::Failed` with the
    /// correlation id filled in when one could be recovered.
    #[instrument(skip(self, batch), fields(instructions = batch.len()))]
    pub async fn send(&self, batch: InstructionBatch) -> PipelineResult<SubmissionResult> {
        let token = self.fetch_token().await?;
        let tx = self.assemble(token, batch)?;
        debug!(signature = ?tx.correlation_id(), "Submitting transaction");

        match Submitter::new(Arc::clone(&self.boundary)).submit(&tx).await? {
            SubmissionResult::Failed(failure) => {
                let correlation = self.correlator().correlate(&failure);
                Ok(SubmissionResult::Failed(failure.with_correlation(correlation)))
            }
            accepted => Ok(accepted),
        }
    }

    /// Correlate a failure and fetch its logs, if the network has any
    pub async fn diagnose(&self, failure: &StructuredFailure) -> Diagnosis {
        self.correlator().diagnose(failure).await
    }

    fn correlator(&self) -> FailureCorrelator {
        FailureCorrelator::new(Arc::clone(&self.boundary)).with_cluster(self.cluster.clone())
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("fee_payer", &self.fee_payer)
            .field("signers", &self.signers)
            .field("cluster", &self.cluster)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;
    use crate::rpc::mock::ScriptedOutcome;
    use crate::rpc::MockBoundary;
    use crate::tx_builder::{AccountMeta, Instruction, InstructionBatcher};
    use crate::wallet::Keypair;

    fn context(mock: &MockBoundary, payer: Arc<Keypair>) -> PipelineContext {
        let fee_payer = payer.locator();
        PipelineContext::new(
            Arc::new(mock.clone()),
            SignerSet::new().with(payer),
            fee_payer,
        )
    }

    fn transfer_batch(payer: &Keypair) -> InstructionBatch {
        InstructionBatcher::new()
            .with(Instruction::new(
                crate::address::well_known::SYSTEM_PROGRAM_ID,
                vec![
                    AccountMeta::new(payer.locator(), true),
                    AccountMeta::new(AccountLocator([9; 32]), false),
                ],
                vec![2, 0, 0, 0, 100, 0, 0, 0, 0, 0, 0, 0],
            ))
            .unwrap()
            .finalize()
    }

    #[tokio::test]
    async fn test_send_accepted() {
        let mock = MockBoundary::new();
        let payer = Arc::new(Keypair::generate());
        let ctx = context(&mock, payer.clone());

        let result = ctx.send(transfer_batch(&payer)).await.unwrap();
        assert!(result.is_accepted());
        assert_eq!(mock.token_calls().await, 1);
        assert_eq!(mock.submit_calls().await, 1);
    }

    #[tokio::test]
    async fn test_send_fills_correlation_from_message() {
        let mock = MockBoundary::new();
        let payer = Arc::new(Keypair::generate());
        let ctx = context(&mock, payer.clone());
        mock.script_next_submit(ScriptedOutcome::Reject {
            message: "Error: Transaction {signature} failed to confirm".to_string(),
            logs: None,
        })
        .await;

        let result = ctx.send(transfer_batch(&payer)).await.unwrap();
        let accepted = mock.accepted().await;
        assert!(accepted.is_empty());
        match result {
            SubmissionResult::Failed(failure) => {
                let id = failure.correlation.expect("correlation recovered");
                assert!(id.as_str().len() >= 32);
            }
            other => panic!("Expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_signer_fails_before_network_write() {
        let mock = MockBoundary::new();
        let payer = Arc::new(Keypair::generate());
        let ctx = context(&mock, payer.clone());
        let stranger = Keypair::generate();

        let err = ctx.send(transfer_batch(&stranger)).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingSignature(l) if l == stranger.locator()));
        assert!(err.is_fatal());
        assert_eq!(mock.submit_calls().await, 0);
    }

    #[tokio::test]
    async fn test_minimum_reserve_passthrough() {
        let mock = MockBoundary::new();
        let ctx = context(&mock, Arc::new(Keypair::generate()));
        assert_eq!(
            ctx.minimum_reserve(100).await.unwrap(),
            MockBoundary::rent_exempt_minimum(100)
        );
    }
}
