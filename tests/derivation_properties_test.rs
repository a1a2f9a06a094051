//! Property tests for derivation, batching, assembly and the message codec

use ledger_pipeline::address::{self, is_on_curve, verify_derived, MAX_SEED_LEN};
use ledger_pipeline::errors::PipelineError;
use ledger_pipeline::tx_builder::{
    assemble, AccountMeta, Instruction, InstructionBatcher, UnsignedMessage,
    MAX_INSTRUCTIONS_PER_BATCH,
};
use ledger_pipeline::types::{AccountLocator, Blockhash, FreshnessToken};
use ledger_pipeline::wallet::{Keypair, SigningIdentity};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn seed() -> impl Strategy<Value = Vec<u8>> {
    vec(any::<u8>(), 0..=MAX_SEED_LEN)
}

fn locator() -> impl Strategy<Value = AccountLocator> {
    any::<[u8; 32]>().prop_map(AccountLocator)
}

fn account_meta() -> impl Strategy<Value = AccountMeta> {
    (locator(), any::<bool>(), any::<bool>()).prop_map(|(locator, is_writable, is_signer)| {
        AccountMeta {
            locator,
            is_writable,
            is_signer,
        }
    })
}

fn instruction() -> impl Strategy<Value = Instruction> {
    (locator(), vec(account_meta(), 0..6), vec(any::<u8>(), 1..48))
        .prop_map(|(program, accounts, data)| Instruction::new(program, accounts, data))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_derivation_is_deterministic_and_off_curve(
        program in locator(),
        seeds in vec(seed(), 0..4),
    ) {
        let slices: Vec<&[u8]> = seeds.iter().map(Vec::as_slice).collect();
        let first = address::derive(&program, &slices).unwrap();
        let second = address::derive(&program, &slices).unwrap();

        prop_assert_eq!(first, second);
        prop_assert!(!is_on_curve(first.locator().as_bytes()));
        prop_assert!(verify_derived(&program, &slices, first.bump(), &first.locator()));
    }

    #[test]
    fn prop_seed_order_matters(
        program in locator(),
        a in vec(any::<u8>(), 1..=MAX_SEED_LEN),
        b in vec(any::<u8>(), 1..=MAX_SEED_LEN),
    ) {
        // [a, b] and [b, a] hash the same bytes when a ++ b == b ++ a
        let mut ab = a.clone();
        ab.extend_from_slice(&b);
        let mut ba = b.clone();
        ba.extend_from_slice(&a);
        prop_assume!(ab != ba);

        let forward = address::derive(&program, &[a.as_slice(), b.as_slice()]).unwrap();
        let reverse = address::derive(&program, &[b.as_slice(), a.as_slice()]).unwrap();
        prop_assert_ne!(forward.locator(), reverse.locator());
    }

    #[test]
    fn prop_batching_does_not_change_derivation(
        program in locator(),
        owner in locator(),
        copies in 1usize..6,
    ) {
        let expected = address::derive(&program, &[b"profile", owner.as_ref()]).unwrap();

        let mut batcher = InstructionBatcher::new();
        for _ in 0..copies {
            let derived = address::derive(&program, &[b"profile", owner.as_ref()]).unwrap();
            batcher
                .append(Instruction::new(
                    program,
                    vec![AccountMeta::new(derived.locator(), false)],
                    vec![1],
                ))
                .unwrap();
        }
        let batch = batcher.finalize();

        prop_assert!(batch.referenced_locators().all(|l| *l == expected.locator()));
        prop_assert_eq!(
            address::derive(&program, &[b"profile", owner.as_ref()]).unwrap(),
            expected
        );
    }

    #[test]
    fn prop_message_round_trip(
        fee_payer in locator(),
        blockhash in any::<[u8; 32]>(),
        instructions in vec(instruction(), 0..=MAX_INSTRUCTIONS_PER_BATCH),
    ) {
        let mut batcher = InstructionBatcher::new();
        for ix in instructions {
            batcher.append(ix).unwrap();
        }
        let message = UnsignedMessage::new(
            fee_payer,
            FreshnessToken::new(Blockhash(blockhash), 0),
            batcher.finalize(),
        );

        let bytes = message.serialize().unwrap();
        prop_assert_eq!(UnsignedMessage::deserialize(&bytes).unwrap(), message);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// `MissingSignature` iff some `is_signer` account has no identity
    #[test]
    fn prop_signature_completeness(
        // which of four identities each instruction requires
        required in vec(vec(0usize..4, 0..4), 0..5),
        supplied in vec(0usize..4, 0..5),
    ) {
        let keys: Vec<Keypair> = (0u8..4).map(|i| Keypair::from_seed(&[i + 1; 32])).collect();

        let mut batcher = InstructionBatcher::new();
        for signer_idxs in &required {
            let accounts = signer_idxs
                .iter()
                .map(|&i| AccountMeta::new(keys[i].locator(), true))
                .collect();
            batcher
                .append(Instruction::new(AccountLocator([0x42; 32]), accounts, vec![0]))
                .unwrap();
        }

        let signers: Vec<&dyn SigningIdentity> = supplied
            .iter()
            .map(|&i| &keys[i] as &dyn SigningIdentity)
            .collect();
        let needed: BTreeSet<usize> = required.iter().flatten().copied().collect();
        let have: BTreeSet<usize> = supplied.iter().copied().collect();

        let result = assemble(
            keys[0].locator(),
            FreshnessToken::new(Blockhash([9; 32]), 10),
            batcher.finalize(),
            &signers,
        );

        if needed.is_subset(&have) {
            let tx = result.unwrap();
            prop_assert!(tx.verify());
            prop_assert_eq!(tx.signatures().len(), have.len());
        } else {
            prop_assert!(matches!(result, Err(PipelineError::MissingSignature(_))));
        }
    }
}
