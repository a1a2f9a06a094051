//! Network boundary
//!
//! The pipeline only talks to the ledger through [`NetworkBoundary`]. Every
//! method is a single round trip with no retry; timeouts are whatever the
//! implementation's transport enforces.

pub mod errors;
pub mod http;
pub mod mock;

pub use errors::{BoundaryError, FailureKind, RawBoundaryError, StructuredFailure};
pub use http::JsonRpcBoundary;
pub use mock::MockBoundary;

use crate::types::{CorrelationId, FreshnessToken};
use async_trait::async_trait;

pub type BoundaryResult<T> = std::result::Result<T, BoundaryError>;

/// RPC surface the pipeline depends on
#[async_trait]
pub trait NetworkBoundary: Send + Sync {
    /// A recent blockhash; implementations attach the validity window they know
    async fn get_freshness_token(&self) -> BoundaryResult<FreshnessToken>;

    /// Lamports needed to keep an account of `data_len` bytes rent exempt
    async fn get_minimum_reserve(&self, data_len: usize) -> BoundaryResult<u64>;

    /// Send wire bytes; exactly one write attempt
    async fn submit_transaction(&self, wire: &[u8]) -> BoundaryResult<CorrelationId>;

    /// Log lines of a processed transaction, `None` when the network has none
    async fn get_transaction_log(
        &self,
        correlation: &CorrelationId,
    ) -> BoundaryResult<Option<Vec<String>>>;
}
