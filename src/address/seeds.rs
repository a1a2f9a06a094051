//! Owned seed list builder
//!
//! Seed order is part of the derivation identity, so the builder only ever
//! appends. Limits are checked as seeds are added so a malformed list fails
//! where it is built rather than deep inside `derive`.

use super::{derive, MAX_SEEDS, MAX_SEED_LEN};
use crate::errors::{PipelineError, PipelineResult};
use crate::types::{AccountLocator, DerivedAddress, ProgramId};

/// Ordered list of owned seeds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Seeds {
    seeds: Vec<Vec<u8>>,
}

impl Seeds {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, seed: Vec<u8>) -> PipelineResult<Self> {
        // one slot stays reserved for the bump
        if self.seeds.len() + 1 >= MAX_SEEDS {
            return Err(PipelineError::invalid_seeds(format!(
                "at most {} seeds may precede the bump",
                MAX_SEEDS - 1
            )));
        }
        if seed.len() > MAX_SEED_LEN {
            return Err(PipelineError::invalid_seeds(format!(
                "seed {} is {} bytes, maximum is {}",
                self.seeds.len(),
                seed.len(),
                MAX_SEED_LEN
            )));
        }
        self.seeds.push(seed);
        Ok(self)
    }

    /// Literal discriminating tag such as `"profile"`; must be non-empty
    pub fn tag(self, tag: &str) -> PipelineResult<Self> {
        if tag.is_empty() {
            return Err(PipelineError::invalid_seeds(format!(
                "tag seed {} is empty",
                self.seeds.len()
            )));
        }
        self.push(tag.as_bytes().to_vec())
    }

    /// Another locator's 32 raw bytes
    pub fn locator(self, locator: &AccountLocator) -> PipelineResult<Self> {
        self.push(locator.as_bytes().to_vec())
    }

    /// A single-byte index
    ///
    /// Indices are encoded as exactly one byte, so only 256 distinct values
    /// (0..=255) exist per prefix. Wider counters need a different encoding
    /// such as [`Seeds::bytes`] with `u32::to_le_bytes`.
    pub fn index(self, index: u8) -> PipelineResult<Self> {
        self.push(vec![index])
    }

    /// Arbitrary raw bytes
    pub fn bytes(self, bytes: &[u8]) -> PipelineResult<Self> {
        self.push(bytes.to_vec())
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Borrowed view suitable for [`derive`]
    pub fn as_slices(&self) -> Vec<&[u8]> {
        self.seeds.iter().map(Vec::as_slice).collect()
    }

    pub fn derive(&self, program_id: &ProgramId) -> PipelineResult<DerivedAddress> {
        derive(program_id, &self.as_slices())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_matches_slice_derivation() {
        let program = AccountLocator([9u8; 32]);
        let owner = AccountLocator([1u8; 32]);

        let built = Seeds::new()
            .tag("profile")
            .and_then(|s| s.locator(&owner))
            .unwrap()
            .derive(&program)
            .unwrap();
        let direct = derive(&program, &[b"profile", owner.as_ref()]).unwrap();
        assert_eq!(built, direct);
    }

    #[test]
    fn test_empty_tag_rejected() {
        assert!(matches!(
            Seeds::new().tag(""),
            Err(PipelineError::InvalidSeeds(_))
        ));
        // raw bytes may be empty
        assert!(Seeds::new().bytes(&[]).is_ok());
    }

    #[test]
    fn test_index_is_one_byte() {
        let seeds = Seeds::new().index(255).unwrap();
        assert_eq!(seeds.as_slices(), vec![&[255u8][..]]);
    }

    #[test]
    fn test_seed_count_leaves_room_for_bump() {
        let mut seeds = Seeds::new();
        for i in 0..(MAX_SEEDS - 1) {
            seeds = seeds.index(i as u8).unwrap();
        }
        assert_eq!(seeds.len(), MAX_SEEDS - 1);
        assert!(seeds.clone().index(0).is_err());
        assert!(seeds.derive(&AccountLocator([3u8; 32])).is_ok());
    }

    #[test]
    fn test_oversized_seed_rejected() {
        assert!(Seeds::new().bytes(&[0u8; MAX_SEED_LEN + 1]).is_err());
        assert!(Seeds::new().tag(&"t".repeat(MAX_SEED_LEN)).is_ok());
    }
}
