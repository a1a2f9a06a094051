//! In-memory network boundary for tests and dry runs
//!
//! Deterministic and never touches the network. Submissions are decoded and
//! signature checked the same way a validator would, so a transaction the
//! mock accepts is well formed.

use super::errors::{BoundaryError, RawBoundaryError};
use super::{BoundaryResult, NetworkBoundary};
use crate::tx_builder::SignedTransaction;
use crate::types::{Blockhash, CorrelationId, FreshnessToken};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Rent-exempt minimum uses the ledger's default rent parameters
const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;
const LAMPORTS_PER_BYTE_YEAR: u64 = 3_480;
const EXEMPTION_THRESHOLD_YEARS: u64 = 2;

/// Outcome forced onto the next submission
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Fail as if the endpoint were unreachable
    Transport(String),

    /// Reject the transaction. `{signature}` in the message is replaced by
    /// the transaction's signature; `logs` are stored for later lookup.
    Reject {
        message: String,
        logs: Option<Vec<String>>,
    },
}

#[derive(Debug, Default)]
struct MockState {
    token_calls: usize,
    reserve_calls: usize,
    submit_calls: usize,
    log_calls: usize,
    issued: Vec<Blockhash>,
    expired: HashSet<Blockhash>,
    scripted: VecDeque<ScriptedOutcome>,
    logs: HashMap<String, Vec<String>>,
    accepted: Vec<SignedTransaction>,
    fail_log_fetch: bool,
}

/// Mock [`NetworkBoundary`]
#[derive(Debug, Clone)]
pub struct MockBoundary {
    state: Arc<Mutex<MockState>>,
    token_validity: Duration,
}

impl Default for MockBoundary {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBoundary {
    /// Tokens issued by this mock stay fresh for 60 seconds
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            token_validity: Duration::from_secs(60),
        }
    }

    /// Issue tokens with the given validity window; `Duration::ZERO` makes
    /// every issued token already stale
    pub fn with_token_validity(mut self, validity: Duration) -> Self {
        self.token_validity = validity;
        self
    }

    /// Force the outcome of the next submission
    pub async fn script_next_submit(&self, outcome: ScriptedOutcome) {
        self.state.lock().await.scripted.push_back(outcome);
    }

    /// Every blockhash issued so far becomes unknown to the network
    pub async fn expire_issued_tokens(&self) {
        let mut state = self.state.lock().await;
        let issued = state.issued.clone();
        state.expired.extend(issued);
    }

    /// Make log lookups fail at the transport level
    pub async fn set_log_fetch_failing(&self, failing: bool) {
        self.state.lock().await.fail_log_fetch = failing;
    }

    pub async fn insert_logs(&self, correlation: &CorrelationId, logs: Vec<String>) {
        self.state
            .lock()
            .await
            .logs
            .insert(correlation.as_str().to_string(), logs);
    }

    pub async fn token_calls(&self) -> usize {
        self.state.lock().await.token_calls
    }

    pub async fn reserve_calls(&self) -> usize {
        self.state.lock().await.reserve_calls
    }

    pub async fn submit_calls(&self) -> usize {
        self.state.lock().await.submit_calls
    }

    pub async fn log_calls(&self) -> usize {
        self.state.lock().await.log_calls
    }

    /// Transactions the mock accepted, in submission order
    pub async fn accepted(&self) -> Vec<SignedTransaction> {
        self.state.lock().await.accepted.clone()
    }

    /// Rent-exempt minimum for `data_len` bytes of account data
    pub fn rent_exempt_minimum(data_len: usize) -> u64 {
        (ACCOUNT_STORAGE_OVERHEAD + data_len as u64)
            * LAMPORTS_PER_BYTE_YEAR
            * EXEMPTION_THRESHOLD_YEARS
    }
}

fn reject(message: impl Into<String>) -> BoundaryError {
    BoundaryError::Rejection(RawBoundaryError::from_message(message))
}

#[async_trait]
impl NetworkBoundary for MockBoundary {
    async fn get_freshness_token(&self) -> BoundaryResult<FreshnessToken> {
        let mut state = self.state.lock().await;
        state.token_calls += 1;

        let height = state.token_calls as u64;
        let hash: [u8; 32] = Sha256::digest(height.to_le_bytes()).into();
        let blockhash = Blockhash(hash);
        state.issued.push(blockhash);

        Ok(FreshnessToken::new(blockhash, height + 150).with_validity(self.token_validity))
    }

    async fn get_minimum_reserve(&self, data_len: usize) -> BoundaryResult<u64> {
        self.state.lock().await.reserve_calls += 1;
        Ok(Self::rent_exempt_minimum(data_len))
    }

    async fn submit_transaction(&self, wire: &[u8]) -> BoundaryResult<CorrelationId> {
        let mut state = self.state.lock().await;
        state.submit_calls += 1;

        let tx = SignedTransaction::from_wire_bytes(wire)
            .map_err(|e| reject(format!("failed to deserialize transaction: {}", e)))?;
        let signature = tx.correlation_id();
        let sig_text = signature
            .as_ref()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default();

        if let Some(outcome) = state.scripted.pop_front() {
            debug!(signature = %sig_text, ?outcome, "Mock applying scripted outcome");
            return match outcome {
                ScriptedOutcome::Transport(message) => Err(BoundaryError::transport(message)),
                ScriptedOutcome::Reject { message, logs } => {
                    if let Some(logs) = logs {
                        state.logs.insert(sig_text.clone(), logs);
                    }
                    Err(reject(message.replace("{signature}", &sig_text)))
                }
            };
        }

        let fee_payer = *tx.message().fee_payer();
        if tx.signature_for(&fee_payer).is_none() {
            return Err(reject(format!(
                "Transaction signature verification failure: fee payer {} did not sign",
                fee_payer
            )));
        }
        if !tx.verify() {
            return Err(reject("Transaction signature verification failure"));
        }
        let blockhash = tx.message().freshness_token().blockhash;
        if state.expired.contains(&blockhash) || !state.issued.contains(&blockhash) {
            return Err(reject(format!(
                "Transaction {} failed: Blockhash not found",
                sig_text
            )));
        }

        let correlation = signature.unwrap_or_else(|| CorrelationId::new(String::new()));
        state.logs.insert(
            sig_text,
            vec![format!(
                "Program log: {} instruction(s) processed",
                tx.message().instructions().len()
            )],
        );
        state.accepted.push(tx);
        Ok(correlation)
    }

    async fn get_transaction_log(
        &self,
        correlation: &CorrelationId,
    ) -> BoundaryResult<Option<Vec<String>>> {
        let mut state = self.state.lock().await;
        state.log_calls += 1;
        if state.fail_log_fetch {
            return Err(BoundaryError::transport("connection refused"));
        }
        Ok(state.logs.get(correlation.as_str()).cloned())
    }
}
