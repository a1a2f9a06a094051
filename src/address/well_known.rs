//! Program ids and seed layouts used by the token, metadata and todo flows

use super::derive;
use crate::errors::PipelineResult;
use crate::types::{AccountLocator, DerivedAddress, ProgramId};

/// `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: ProgramId = AccountLocator::new([0u8; 32]);

/// `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: ProgramId = AccountLocator::new([
    6, 221, 246, 225, 215, 101, 161, 147, 217, 203, 225, 70, 206, 235, 121, 172, 28, 180, 133,
    237, 95, 91, 55, 145, 58, 140, 245, 133, 126, 255, 0, 169,
]);

/// `TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb`
pub const TOKEN_2022_PROGRAM_ID: ProgramId = AccountLocator::new([
    6, 221, 246, 225, 238, 117, 143, 222, 24, 66, 93, 188, 228, 108, 205, 218, 182, 26, 252, 77,
    131, 185, 13, 39, 254, 189, 249, 40, 216, 161, 139, 252,
]);

/// `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: ProgramId = AccountLocator::new([
    140, 151, 37, 143, 78, 36, 137, 241, 187, 61, 16, 41, 20, 142, 13, 131, 11, 90, 19, 153, 218,
    255, 16, 132, 4, 142, 123, 216, 219, 233, 248, 89,
]);

/// `metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s`
pub const TOKEN_METADATA_PROGRAM_ID: ProgramId = AccountLocator::new([
    11, 112, 101, 177, 227, 209, 124, 69, 56, 157, 82, 127, 107, 4, 195, 205, 88, 184, 108, 115,
    26, 160, 253, 181, 73, 182, 209, 188, 3, 248, 41, 70,
]);

/// `SysvarRent111111111111111111111111111111111`
pub const RENT_SYSVAR_ID: AccountLocator = AccountLocator::new([
    6, 167, 213, 23, 25, 44, 92, 81, 33, 140, 201, 76, 61, 74, 241, 127, 88, 218, 238, 8, 155,
    161, 253, 68, 227, 219, 217, 138, 0, 0, 0, 0,
]);

/// Devnet deployment of the todo program, `Ergn84VsTZf5kZay4aioNy3fqq7DyJTSePQ4xi4bZbT`
pub const DEFAULT_TODO_PROGRAM_ID: ProgramId = AccountLocator::new([
    3, 140, 186, 255, 135, 132, 102, 99, 121, 183, 203, 225, 141, 176, 202, 34, 168, 197, 97, 54,
    106, 201, 41, 158, 100, 82, 7, 172, 93, 222, 137, 174,
]);

pub const METADATA_SEED: &[u8] = b"metadata";
pub const EDITION_SEED: &[u8] = b"edition";
pub const PROFILE_SEED: &[u8] = b"profile";
pub const TODO_SEED: &[u8] = b"todo";

/// Token account owned by `wallet` for `mint` under `token_program`
pub fn associated_token_address(
    wallet: &AccountLocator,
    mint: &AccountLocator,
    token_program: &ProgramId,
) -> PipelineResult<DerivedAddress> {
    derive(
        &ASSOCIATED_TOKEN_PROGRAM_ID,
        &[wallet.as_ref(), token_program.as_ref(), mint.as_ref()],
    )
}

/// Metadata account attached to a mint
pub fn metadata_address(mint: &AccountLocator) -> PipelineResult<DerivedAddress> {
    derive(
        &TOKEN_METADATA_PROGRAM_ID,
        &[
            METADATA_SEED,
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
        ],
    )
}

/// Master edition account of an NFT mint
pub fn master_edition_address(mint: &AccountLocator) -> PipelineResult<DerivedAddress> {
    derive(
        &TOKEN_METADATA_PROGRAM_ID,
        &[
            METADATA_SEED,
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
            EDITION_SEED,
        ],
    )
}

/// Per-owner profile account of the todo program: `["profile", owner]`
pub fn todo_profile_address(
    todo_program: &ProgramId,
    owner: &AccountLocator,
) -> PipelineResult<DerivedAddress> {
    derive(todo_program, &[PROFILE_SEED, owner.as_ref()])
}

/// Todo item account: `["todo", profile, [index]]`
///
/// The index is a single byte, so one profile addresses at most 256 items.
pub fn todo_item_address(
    todo_program: &ProgramId,
    profile: &AccountLocator,
    index: u8,
) -> PipelineResult<DerivedAddress> {
    derive(todo_program, &[TODO_SEED, profile.as_ref(), &[index]])
}
