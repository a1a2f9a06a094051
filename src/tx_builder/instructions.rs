//! Instructions and the ordered batch they travel in
//!
//! The batcher only checks the shape of each instruction. Ordering and
//! cross-instruction consistency (creating an account before initializing it
//! in the same batch) are the caller's precondition; the ledger itself does
//! not validate them either.

use crate::errors::{PipelineError, PipelineResult};
use crate::types::{AccountLocator, ProgramId};
use serde::{Deserialize, Serialize};

/// Most instructions one batch (and so one transaction) may carry
pub const MAX_INSTRUCTIONS_PER_BATCH: usize = 64;

/// Most account references a single instruction may carry
pub const MAX_ACCOUNTS_PER_INSTRUCTION: usize = u8::MAX as usize;

/// Reference from an instruction to an account
///
/// Field order is part of the canonical encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountMeta {
    pub locator: AccountLocator,
    pub is_writable: bool,
    pub is_signer: bool,
}

impl AccountMeta {
    /// Writable account reference
    pub fn new(locator: AccountLocator, is_signer: bool) -> Self {
        Self {
            locator,
            is_writable: true,
            is_signer,
        }
    }

    /// Read-only account reference
    pub fn new_readonly(locator: AccountLocator, is_signer: bool) -> Self {
        Self {
            locator,
            is_writable: false,
            is_signer,
        }
    }
}

/// One call into a program; immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    program_id: ProgramId,
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: ProgramId, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }

    pub fn program_id(&self) -> &ProgramId {
        &self.program_id
    }

    pub fn accounts(&self) -> &[AccountMeta] {
        &self.accounts
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Locators this instruction requires signatures from, in account order
    pub fn signers(&self) -> impl Iterator<Item = &AccountLocator> {
        self.accounts
            .iter()
            .filter(|meta| meta.is_signer)
            .map(|meta| &meta.locator)
    }

    fn shape_error(&self) -> Option<String> {
        if self.data.is_empty() {
            return Some(format!(
                "empty payload for program {}",
                self.program_id
            ));
        }
        if self.accounts.len() > MAX_ACCOUNTS_PER_INSTRUCTION {
            return Some(format!(
                "{} account references exceeds the maximum of {}",
                self.accounts.len(),
                MAX_ACCOUNTS_PER_INSTRUCTION
            ));
        }
        None
    }
}

/// Ordered, finalized sequence of instructions for one transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionBatch {
    instructions: Vec<Instruction>,
}

impl InstructionBatch {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Distinct signer locators across all instructions, in first-seen order
    pub fn required_signers(&self) -> Vec<AccountLocator> {
        let mut out: Vec<AccountLocator> = Vec::new();
        for locator in self.instructions.iter().flat_map(Instruction::signers) {
            if !out.contains(locator) {
                out.push(*locator);
            }
        }
        out
    }

    /// Every locator any instruction references, including program ids
    pub fn referenced_locators(&self) -> impl Iterator<Item = &AccountLocator> {
        self.instructions.iter().flat_map(|ix| {
            std::iter::once(&ix.program_id).chain(ix.accounts.iter().map(|m| &m.locator))
        })
    }

    pub(crate) fn into_inner(self) -> Vec<Instruction> {
        self.instructions
    }

    pub(crate) fn from_vec(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

impl<'a> IntoIterator for &'a InstructionBatch {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

/// Accumulates instructions in order; pure builder with no side effects
#[derive(Debug, Default)]
pub struct InstructionBatcher {
    instructions: Vec<Instruction>,
}

impl InstructionBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append after shape-checking
    ///
    /// # Errors
    ///
    /// `InvalidInstruction` if the payload is empty, the instruction carries
    /// too many account references, or the batch is full.
    pub fn append(&mut self, instruction: Instruction) -> PipelineResult<()> {
        let index = self.instructions.len();
        if index >= MAX_INSTRUCTIONS_PER_BATCH {
            return Err(PipelineError::invalid_instruction(
                index,
                format!("batch already holds {} instructions", MAX_INSTRUCTIONS_PER_BATCH),
            ));
        }
        if let Some(reason) = instruction.shape_error() {
            return Err(PipelineError::invalid_instruction(index, reason));
        }
        self.instructions.push(instruction);
        Ok(())
    }

    /// Chaining form of [`append`](Self::append)
    pub fn with(mut self, instruction: Instruction) -> PipelineResult<Self> {
        self.append(instruction)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn finalize(self) -> InstructionBatch {
        InstructionBatch {
            instructions: self.instructions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ix(program: u8, data: &[u8], accounts: Vec<AccountMeta>) -> Instruction {
        Instruction::new(AccountLocator([program; 32]), accounts, data.to_vec())
    }

    #[test]
    fn test_batch_preserves_order() {
        let mut batcher = InstructionBatcher::new();
        for i in 1..=5u8 {
            batcher.append(ix(i, &[i], vec![])).unwrap();
        }
        let batch = batcher.finalize();
        let programs: Vec<u8> = batch.instructions().iter().map(|i| i.program_id().0[0]).collect();
        assert_eq!(programs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_payload_rejected() {
        let mut batcher = InstructionBatcher::new();
        batcher.append(ix(1, &[0], vec![])).unwrap();
        let err = batcher.append(ix(2, &[], vec![])).unwrap_err();
        match err {
            PipelineError::InvalidInstruction { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("empty payload"));
            }
            other => panic!("Expected InvalidInstruction, got {:?}", other),
        }
        // the rejected instruction was not accumulated
        assert_eq!(batcher.len(), 1);
    }

    #[test]
    fn test_too_many_accounts_rejected() {
        let metas = vec![AccountMeta::new(AccountLocator([1u8; 32]), false); MAX_ACCOUNTS_PER_INSTRUCTION + 1];
        let mut batcher = InstructionBatcher::new();
        assert!(batcher.append(ix(1, &[1], metas)).is_err());
    }

    #[test]
    fn test_batch_capacity() {
        let mut batcher = InstructionBatcher::new();
        for _ in 0..MAX_INSTRUCTIONS_PER_BATCH {
            batcher.append(ix(1, &[1], vec![])).unwrap();
        }
        assert!(matches!(
            batcher.append(ix(1, &[1], vec![])),
            Err(PipelineError::InvalidInstruction { index, .. }) if index == MAX_INSTRUCTIONS_PER_BATCH
        ));
    }

    #[test]
    fn test_no_cross_instruction_validation() {
        // initializing before creating is the caller's problem, not the batcher's
        let account = AccountLocator([7u8; 32]);
        let batch = InstructionBatcher::new()
            .with(ix(2, b"init", vec![AccountMeta::new(account, false)]))
            .and_then(|b| b.with(ix(1, b"create", vec![AccountMeta::new(account, true)])))
            .unwrap()
            .finalize();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_required_signers_deduplicated() {
        let a = AccountLocator([1u8; 32]);
        let b = AccountLocator([2u8; 32]);
        let c = AccountLocator([3u8; 32]);
        let batch = InstructionBatcher::new()
            .with(ix(9, &[1], vec![AccountMeta::new(a, true), AccountMeta::new(c, false)]))
            .and_then(|x| {
                x.with(ix(
                    9,
                    &[2],
                    vec![AccountMeta::new_readonly(b, true), AccountMeta::new(a, true)],
                ))
            })
            .unwrap()
            .finalize();
        assert_eq!(batch.required_signers(), vec![a, b]);
    }

    #[test]
    fn test_meta_constructors() {
        let l = AccountLocator([1u8; 32]);
        let w = AccountMeta::new(l, true);
        assert!(w.is_writable && w.is_signer);
        let r = AccountMeta::new_readonly(l, false);
        assert!(!r.is_writable && !r.is_signer);
    }
}
