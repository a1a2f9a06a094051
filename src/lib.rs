//! Ledger Pipeline - deterministic address derivation and atomic transactions
//!
//! Derive program addresses, batch instructions, assemble and sign one
//! atomic transaction, submit it once, and recover a correlation id when the
//! submission is reported as failed.

pub mod address;
pub mod compat;
pub mod config;
pub mod correlate;
pub mod errors;
pub mod metrics;
pub mod rpc;
pub mod submit;
pub mod tx_builder;
pub mod types;
pub mod wallet;

// Re-export commonly used types
pub use address::{derive, Seeds};
pub use errors::{PipelineError, PipelineResult};
pub use rpc::{NetworkBoundary, StructuredFailure};
pub use submit::{SubmissionResult, Submitter};
pub use tx_builder::{InstructionBatch, InstructionBatcher, PipelineContext, SignedTransaction};
pub use types::{AccountLocator, CorrelationId, DerivedAddress, FreshnessToken, ProgramId};
