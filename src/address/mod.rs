//! Program-derived address computation
//!
//! A derived locator is `SHA-256(seeds.. || bump || program_id || PDA_MARKER)`
//! for the highest bump in `255..=0` whose digest is not a valid ed25519
//! point. No private key exists for such a locator, so only the owning
//! program can sign for it.
//!
//! Derivation is pure and deterministic: the same `(program, seeds)` yields
//! the same locator and bump in every process, which is what lets two parties
//! agree on an address without talking to each other.

pub mod seeds;
pub mod well_known;

pub use seeds::Seeds;

use crate::errors::{PipelineError, PipelineResult};
use crate::metrics::metrics;
use crate::types::{AccountLocator, DerivedAddress, ProgramId};
use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Maximum length of a single seed
pub const MAX_SEED_LEN: usize = 32;

/// Maximum number of seeds, including the bump
pub const MAX_SEEDS: usize = 16;

/// Domain separator appended after the program id
pub const PDA_MARKER: &[u8; 21] = b"ProgramDerivedAddress";

/// Whether `bytes` decompress to a point on the ed25519 curve
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

fn check_seeds(seeds: &[&[u8]], max_seeds: usize) -> PipelineResult<()> {
    if seeds.len() > max_seeds {
        return Err(PipelineError::invalid_seeds(format!(
            "{} seeds exceeds the maximum of {}",
            seeds.len(),
            max_seeds
        )));
    }
    for (idx, seed) in seeds.iter().enumerate() {
        if seed.len() > MAX_SEED_LEN {
            return Err(PipelineError::invalid_seeds(format!(
                "seed {} is {} bytes, maximum is {}",
                idx,
                seed.len(),
                MAX_SEED_LEN
            )));
        }
    }
    Ok(())
}

/// Hash seeds (which must already include the bump) for `program_id`
///
/// Fails with `InvalidSeeds` when the digest lands on the curve.
pub fn create_program_address(
    seeds: &[&[u8]],
    program_id: &ProgramId,
) -> PipelineResult<AccountLocator> {
    check_seeds(seeds, MAX_SEEDS)?;

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);
    let digest: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&digest) {
        return Err(PipelineError::invalid_seeds(
            "derived address lies on the ed25519 curve",
        ));
    }
    Ok(AccountLocator(digest))
}

/// Find the canonical derived locator and bump for `(program_id, seeds)`
///
/// The bump is appended as a trailing one-byte seed, so at most
/// `MAX_SEEDS - 1` caller seeds are accepted.
pub fn derive(program_id: &ProgramId, seeds: &[&[u8]]) -> PipelineResult<DerivedAddress> {
    check_seeds(seeds, MAX_SEEDS - 1)?;

    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
        with_bump.extend_from_slice(seeds);
        with_bump.push(&bump_seed);

        match create_program_address(&with_bump, program_id) {
            Ok(locator) => {
                debug!(
                    program = %program_id,
                    locator = %locator,
                    bump = bump,
                    seed_count = seeds.len(),
                    "Derived program address"
                );
                metrics().addresses_derived.inc();
                metrics()
                    .derive_bump_iterations
                    .observe(f64::from(u8::MAX - bump) + 1.0);
                return Ok(DerivedAddress { locator, bump });
            }
            Err(PipelineError::InvalidSeeds(_)) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(PipelineError::DerivationExhausted {
        program: *program_id,
    })
}

/// Re-derive with a known bump and check it matches `expected`
pub fn verify_derived(
    program_id: &ProgramId,
    seeds: &[&[u8]],
    bump: u8,
    expected: &AccountLocator,
) -> bool {
    let bump_seed = [bump];
    let mut with_bump: Vec<&[u8]> = seeds.to_vec();
    with_bump.push(&bump_seed);
    matches!(create_program_address(&with_bump, program_id), Ok(l) if l == *expected)
}

/// Address for a base key plus a string seed: `SHA-256(base || seed || owner)`
///
/// Unlike program-derived locators these may be on the curve; the base key
/// signs for them.
pub fn derive_with_seed(
    base: &AccountLocator,
    seed: &str,
    owner: &ProgramId,
) -> PipelineResult<AccountLocator> {
    if seed.len() > MAX_SEED_LEN {
        return Err(PipelineError::invalid_seeds(format!(
            "seed is {} bytes, maximum is {}",
            seed.len(),
            MAX_SEED_LEN
        )));
    }
    let owner_bytes = owner.as_bytes();
    if owner_bytes.ends_with(PDA_MARKER) {
        return Err(PipelineError::invalid_seeds(
            "owner ends with the derived-address marker",
        ));
    }

    let mut hasher = Sha256::new();
    hasher.update(base.as_bytes());
    hasher.update(seed.as_bytes());
    hasher.update(owner_bytes);
    Ok(AccountLocator(hasher.finalize().into()))
}
