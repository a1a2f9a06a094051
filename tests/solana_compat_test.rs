//! Cross-checks against the Solana SDK and SPL helpers
//!
//! Derived locators must match the ledger's own implementation byte for
//! byte, otherwise programs would not find the accounts we address.

use ledger_pipeline::address::{self, derive_with_seed, well_known};
use ledger_pipeline::compat;
use ledger_pipeline::types::AccountLocator;
use solana_sdk::pubkey::Pubkey;

#[test]
fn test_find_program_address_matches_sdk() {
    let program = Pubkey::new_unique();
    let owner = Pubkey::new_unique();

    for seeds in [
        vec![b"profile".as_slice(), owner.as_ref()],
        vec![b"todo".as_slice(), owner.as_ref(), &[0u8]],
        vec![b"todo".as_slice(), owner.as_ref(), &[255u8]],
        vec![],
    ] {
        let (expected, bump) = Pubkey::find_program_address(&seeds, &program);
        let derived = address::derive(&program.into(), &seeds).unwrap();
        assert_eq!(Pubkey::from(derived.locator()), expected);
        assert_eq!(derived.bump(), bump);
    }
}

#[test]
fn test_create_program_address_matches_sdk() {
    let program = Pubkey::new_unique();
    let (expected, bump) = Pubkey::find_program_address(&[b"vault"], &program);

    let created = address::create_program_address(&[b"vault", &[bump]], &program.into()).unwrap();
    assert_eq!(Pubkey::from(created), expected);
}

#[test]
fn test_create_with_seed_matches_sdk() {
    let base = Pubkey::new_unique();
    let owner = Pubkey::new_unique();
    let expected = Pubkey::create_with_seed(&base, "stake:0", &owner).unwrap();

    let derived = derive_with_seed(&base.into(), "stake:0", &owner.into()).unwrap();
    assert_eq!(Pubkey::from(derived), expected);
}

#[test]
fn test_program_ids_match_spl() {
    assert_eq!(
        Pubkey::from(well_known::TOKEN_PROGRAM_ID),
        spl_token::id()
    );
    assert_eq!(
        Pubkey::from(well_known::ASSOCIATED_TOKEN_PROGRAM_ID),
        spl_associated_token_account::id()
    );
    assert_eq!(
        Pubkey::from(well_known::SYSTEM_PROGRAM_ID),
        solana_sdk::system_program::id()
    );
    assert_eq!(
        Pubkey::from(well_known::RENT_SYSVAR_ID),
        solana_sdk::sysvar::rent::id()
    );
}

#[test]
fn test_associated_token_address_matches_spl() {
    let wallet = Pubkey::new_unique();
    let mint = Pubkey::new_unique();

    for token_program in [well_known::TOKEN_PROGRAM_ID, well_known::TOKEN_2022_PROGRAM_ID] {
        let expected =
            spl_associated_token_account::get_associated_token_address_with_program_id(
                &wallet,
                &mint,
                &token_program.into(),
            );
        let derived =
            well_known::associated_token_address(&wallet.into(), &mint.into(), &token_program)
                .unwrap();
        assert_eq!(Pubkey::from(derived.locator()), expected);
    }
}

#[test]
fn test_metadata_addresses_match_sdk_derivation() {
    let mint = Pubkey::new_unique();
    let metadata_program: Pubkey = well_known::TOKEN_METADATA_PROGRAM_ID.into();

    let (metadata, _) = Pubkey::find_program_address(
        &[b"metadata", metadata_program.as_ref(), mint.as_ref()],
        &metadata_program,
    );
    let (edition, _) = Pubkey::find_program_address(
        &[
            b"metadata",
            metadata_program.as_ref(),
            mint.as_ref(),
            b"edition",
        ],
        &metadata_program,
    );

    let mint: AccountLocator = mint.into();
    assert_eq!(
        Pubkey::from(well_known::metadata_address(&mint).unwrap().locator()),
        metadata
    );
    assert_eq!(
        Pubkey::from(well_known::master_edition_address(&mint).unwrap().locator()),
        edition
    );
}

#[test]
#[allow(deprecated)]
fn test_sdk_instruction_batches_unchanged() {
    use ledger_pipeline::tx_builder::InstructionBatcher;
    use solana_sdk::system_instruction;

    let payer = Pubkey::new_unique();
    let new_account = Pubkey::new_unique();
    let sdk_ixs = vec![
        system_instruction::create_account(&payer, &new_account, 1_461_600, 82, &spl_token::id()),
        system_instruction::transfer(&payer, &new_account, 10),
    ];

    let mut batcher = InstructionBatcher::new();
    for ix in &sdk_ixs {
        batcher.append(compat::from_sdk_instruction(ix)).unwrap();
    }
    let batch = batcher.finalize();

    let back: Vec<_> = batch
        .instructions()
        .iter()
        .map(compat::to_sdk_instruction)
        .collect();
    assert_eq!(back, sdk_ixs);
    assert_eq!(
        batch.required_signers(),
        vec![AccountLocator::from(payer), AccountLocator::from(new_account)]
    );
}
