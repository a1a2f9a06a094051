//! Unsigned message and its canonical byte encoding
//!
//! Signatures cover these exact bytes, so the layout is fixed:
//!
//! ```text
//! fee_payer            32 bytes
//! blockhash            32 bytes
//! instruction count    u64 LE
//! per instruction:
//!   program id         32 bytes
//!   account count      u64 LE
//!   per account:       locator 32 | is_writable 1 | is_signer 1
//!   payload length     u64 LE
//!   payload            bytes
//! ```
//!
//! This is bincode's fixed-int little-endian encoding of [`UnsignedMessage`];
//! field order in the structs below must not change.

use super::instructions::{Instruction, InstructionBatch};
use crate::errors::{PipelineError, PipelineResult};
use crate::types::{AccountLocator, FreshnessToken};
use serde::{Deserialize, Serialize};

/// Fee payer, freshness token and instructions; built once per attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedMessage {
    fee_payer: AccountLocator,
    freshness_token: FreshnessToken,
    instructions: Vec<Instruction>,
}

impl UnsignedMessage {
    pub fn new(
        fee_payer: AccountLocator,
        freshness_token: FreshnessToken,
        batch: InstructionBatch,
    ) -> Self {
        Self {
            fee_payer,
            freshness_token,
            instructions: batch.into_inner(),
        }
    }

    pub fn fee_payer(&self) -> &AccountLocator {
        &self.fee_payer
    }

    pub fn freshness_token(&self) -> &FreshnessToken {
        &self.freshness_token
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Canonical bytes that every signature is computed over
    pub fn serialize(&self) -> PipelineResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Inverse of [`serialize`](Self::serialize); trailing bytes are rejected
    pub fn deserialize(bytes: &[u8]) -> PipelineResult<Self> {
        let message: Self = bincode::deserialize(bytes)?;
        let consumed = bincode::serialized_size(&message)? as usize;
        if consumed != bytes.len() {
            return Err(PipelineError::Serialization(format!(
                "{} trailing bytes after message",
                bytes.len() - consumed
            )));
        }
        Ok(message)
    }

    /// Back to a batch, e.g. to reassemble with a fresh token
    pub fn into_batch(self) -> InstructionBatch {
        InstructionBatch::from_vec(self.instructions)
    }
}
