//! Transaction building
//!
//! The stages run strictly forward and each hands an immutable value to the
//! next:
//!
//! - **instructions**: instruction values and the ordered batcher
//! - **message**: unsigned message and its canonical byte encoding
//! - **builder**: assembly and signing, signer completeness check
//! - **output**: signed transaction and its wire form
//! - **context**: [`PipelineContext`], the explicit dependencies of a send
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use ledger_pipeline::rpc::MockBoundary;
//! use ledger_pipeline::tx_builder::{AccountMeta, Instruction, InstructionBatcher, PipelineContext};
//! use ledger_pipeline::wallet::{Keypair, SignerSet};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), ledger_pipeline::errors::PipelineError> {
//! let payer = Arc::new(Keypair::generate());
//! let ctx = PipelineContext::new(
//!     Arc::new(MockBoundary::new()),
//!     SignerSet::new().with(payer.clone()),
//!     payer.locator(),
//! );
//!
//! let batch = InstructionBatcher::new()
//!     .with(Instruction::new(
//!         ledger_pipeline::address::well_known::SYSTEM_PROGRAM_ID,
//!         vec![AccountMeta::new(payer.locator(), true)],
//!         vec![2, 0, 0, 0],
//!     ))?
//!     .finalize();
//!
//! let result = ctx.send(batch).await?;
//! # let _ = result;
//! # Ok(())
//! # }
//! ```

mod builder;
mod context;
mod instructions;
mod message;
mod output;

pub use builder::{assemble, reassemble};
pub use context::PipelineContext;
pub use instructions::{
    AccountMeta, Instruction, InstructionBatch, InstructionBatcher, MAX_ACCOUNTS_PER_INSTRUCTION,
    MAX_INSTRUCTIONS_PER_BATCH,
};
pub use message::UnsignedMessage;
pub use output::SignedTransaction;
