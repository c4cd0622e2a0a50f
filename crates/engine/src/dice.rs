//! Deterministic, seedable, counter-tracked RNG for combat rolls.
//!
//! Directly grounded on the ambient-stack reference engine's `dice.rs`:
//! a `ChaCha8Rng` wrapped with a replay-friendly roll counter.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A seedable RNG whose state (seed + counter) is itself part of
/// `GameState`, so two engines given the same seed and the same action
/// sequence produce byte-identical dice traces.
///
/// Serializes as just `(seed, counter)`: `ChaCha8Rng` itself carries no
/// serde impl worth relying on, and replaying `counter` rolls from `seed`
/// on deserialize reproduces the exact same generator position.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "RngRepr", into = "RngRepr")]
pub struct DeterministicRng {
    seed: u64,
    counter: u64,
    rng: Option<ChaCha8Rng>,
}

#[derive(Serialize, Deserialize)]
struct RngRepr {
    seed: u64,
    counter: u64,
}

impl From<RngRepr> for DeterministicRng {
    fn from(repr: RngRepr) -> Self {
        DeterministicRng::restore(repr.seed, repr.counter)
    }
}

impl From<DeterministicRng> for RngRepr {
    fn from(rng: DeterministicRng) -> Self {
        RngRepr { seed: rng.seed, counter: rng.counter }
    }
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        DeterministicRng {
            seed,
            counter: 0,
            rng: Some(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Reconstruct from a persisted `(seed, counter)` pair, fast-forwarding
    /// by re-rolling `counter` d6 to reach the same logical position. Used
    /// when restoring a `GameState` from a snapshot.
    pub fn restore(seed: u64, counter: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..counter {
            let _: u32 = rng.gen_range(1..=6);
        }
        DeterministicRng {
            seed,
            counter,
            rng: Some(rng),
        }
    }

    fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        self.rng.get_or_insert_with(|| ChaCha8Rng::seed_from_u64(self.seed))
    }

    /// Roll one six-sided die, returning 1..=6.
    pub fn roll_d6(&mut self) -> u32 {
        self.counter += 1;
        self.rng_mut().gen_range(1..=6)
    }

    /// Roll `count` six-sided dice, in order.
    pub fn roll_dice(&mut self, count: u32) -> Vec<u32> {
        (0..count).map(|_| self.roll_d6()).collect()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_same_sequence() {
        let mut a = DeterministicRng::new(42);
        let mut b = DeterministicRng::new(42);
        let rolls_a: Vec<u32> = (0..20).map(|_| a.roll_d6()).collect();
        let rolls_b: Vec<u32> = (0..20).map(|_| b.roll_d6()).collect();
        assert_eq!(rolls_a, rolls_b);
    }

    #[test]
    fn rolls_are_in_range() {
        let mut rng = DeterministicRng::new(1);
        for _ in 0..200 {
            let roll = rng.roll_d6();
            assert!((1..=6).contains(&roll));
        }
    }

    #[test]
    fn counter_advances_with_every_roll() {
        let mut rng = DeterministicRng::new(7);
        assert_eq!(rng.counter(), 0);
        rng.roll_dice(5);
        assert_eq!(rng.counter(), 5);
    }

    #[test]
    fn restore_reproduces_the_remaining_sequence() {
        let mut original = DeterministicRng::new(99);
        let prefix = original.roll_dice(10);
        let suffix_original = original.roll_dice(10);

        let mut restored = DeterministicRng::restore(99, 10);
        let suffix_restored = restored.roll_dice(10);

        assert_eq!(suffix_original, suffix_restored);
        assert_eq!(prefix.len(), 10);
    }
}
