//! Solana SDK compatibility layer
//!
//! Conversions between this crate's value types and `solana-sdk`'s. Useful
//! for composing batches from SDK instruction builders (e.g.
//! `system_instruction::create_account`) and for checking derivations
//! against the SDK.
//!
//! All conversions are lossless; both sides are the same 32/64 raw bytes.

use crate::tx_builder::{AccountMeta, Instruction};
use crate::types::{AccountLocator, Blockhash, Signature};
use solana_sdk::{hash::Hash, instruction as sdk, pubkey::Pubkey, signature as sdk_sig};

impl From<Pubkey> for AccountLocator {
    #[inline]
    fn from(pubkey: Pubkey) -> Self {
        AccountLocator(pubkey.to_bytes())
    }
}

impl From<AccountLocator> for Pubkey {
    #[inline]
    fn from(locator: AccountLocator) -> Self {
        Pubkey::new_from_array(locator.to_bytes())
    }
}

impl From<Hash> for Blockhash {
    #[inline]
    fn from(hash: Hash) -> Self {
        Blockhash(hash.to_bytes())
    }
}

impl From<Blockhash> for Hash {
    #[inline]
    fn from(blockhash: Blockhash) -> Self {
        Hash::new_from_array(blockhash.0)
    }
}

impl From<Signature> for sdk_sig::Signature {
    #[inline]
    fn from(signature: Signature) -> Self {
        sdk_sig::Signature::from(signature.to_bytes())
    }
}

/// Convert an SDK instruction into a batchable [`Instruction`]
///
/// # Example
///
/// ```rust,no_run
/// # #![allow(deprecated)]
/// use ledger_pipeline::compat;
/// use solana_sdk::{pubkey::Pubkey, system_instruction};
///
/// let from = Pubkey::new_unique();
/// let to = Pubkey::new_unique();
/// let ix = compat::from_sdk_instruction(&system_instruction::transfer(&from, &to, 1_000));
/// assert_eq!(ix.signers().count(), 1);
/// ```
#[must_use]
pub fn from_sdk_instruction(ix: &sdk::Instruction) -> Instruction {
    let accounts = ix
        .accounts
        .iter()
        .map(|meta| AccountMeta {
            locator: meta.pubkey.into(),
            is_writable: meta.is_writable,
            is_signer: meta.is_signer,
        })
        .collect();
    Instruction::new(ix.program_id.into(), accounts, ix.data.clone())
}

/// Convert an [`Instruction`] into its SDK form
#[must_use]
pub fn to_sdk_instruction(ix: &Instruction) -> sdk::Instruction {
    sdk::Instruction {
        program_id: (*ix.program_id()).into(),
        accounts: ix
            .accounts()
            .iter()
            .map(|meta| sdk::AccountMeta {
                pubkey: meta.locator.into(),
                is_signer: meta.is_signer,
                is_writable: meta.is_writable,
            })
            .collect(),
        data: ix.data().to_vec(),
    }
}
