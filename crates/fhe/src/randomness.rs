// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::FheError;
use eld_events::Seed;
use rand::{rngs::OsRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::{Arc, Mutex, PoisonError};

pub type SharedRng = Arc<Mutex<ChaCha20Rng>>;

/// Supplies the entropy a draw turns into its encrypted random index.
///
/// Whoever controls the seed controls the winner, so the instance wired into a deployment is a
/// trust assumption of that deployment.
pub trait RandomnessSource: Send + Sync {
    fn next_seed(&self) -> Result<Seed, FheError>;
}

/// Operating system entropy.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandomness;

impl RandomnessSource for OsRandomness {
    fn next_seed(&self) -> Result<Seed, FheError> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| FheError::Randomness(e.to_string()))?;
        Ok(Seed(bytes))
    }
}

/// Deterministic stream for tests and reproducible simulations.
#[derive(Clone)]
pub struct SeededRandomness {
    rng: SharedRng,
}

impl SeededRandomness {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }

    pub fn from_u64(seed: u64) -> Self {
        Self::new(Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))))
    }
}

impl RandomnessSource for SeededRandomness {
    fn next_seed(&self) -> Result<Seed, FheError> {
        let mut bytes = [0u8; 32];
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_bytes(&mut bytes);
        Ok(Seed(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_stream_is_reproducible() {
        let a = SeededRandomness::from_u64(7);
        let b = SeededRandomness::from_u64(7);
        assert_eq!(a.next_seed().unwrap(), b.next_seed().unwrap());
        assert_ne!(a.next_seed().unwrap(), SeededRandomness::from_u64(8).next_seed().unwrap());
    }

    #[test]
    fn os_seeds_differ() {
        assert_ne!(OsRandomness.next_seed().unwrap(), OsRandomness.next_seed().unwrap());
    }
}
