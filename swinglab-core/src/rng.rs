//! Deterministic RNG hierarchy.
//!
//! A master seed generates one sub-seed per `(label, trial)` pair. Sub-seeds
//! come from BLAKE3 over the tuple, not from a shared stream, so a trial gets
//! the same generator no matter which thread runs it or in what order.

use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Sub-seed for `(label, trial)`. Independent of derivation order.
    pub fn sub_seed(&self, label: &str, trial: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(label.as_bytes());
        hasher.update(&trial.to_le_bytes());
        let hash = hasher.finalize();
        let mut word = [0u8; 8];
        word.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(word)
    }

    /// Seeded generator for one trial.
    pub fn rng_for(&self, label: &str, trial: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(label, trial))
    }
}
