//! Randomness for battle outcomes.
//!
//! ## Two generators
//!
//! - `BattleRng`: deterministic ChaCha8 stream that decides every
//!   gameplay-affecting roll. Only the host owns one; the guest receives
//!   the results inside action messages.
//! - `CosmeticRng`: unsynchronized entropy for purely visual variation
//!   (particle jitter and the like). Either peer may use it, because nothing
//!   it produces reaches game state.
//!
//! ```
//! use battle_sync::core::BattleRng;
//!
//! let mut rng = BattleRng::new(7);
//! let roll = rng.get_random_int(1, 6);
//! assert!((1..=6).contains(&roll));
//!
//! let deck = vec!["a", "b", "c"];
//! let shuffled = rng.shuffle_array(&deck);
//! assert_eq!(shuffled.len(), 3);
//! assert_eq!(deck, vec!["a", "b", "c"]); // input untouched
//! ```

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Deterministic RNG for host-authoritative rolls.
#[derive(Clone, Debug)]
pub struct BattleRng {
    inner: ChaCha8Rng,
    seed: u64,
    draws: u64,
}

impl BattleRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            draws: 0,
        }
    }

    /// Uniform integer in `[min, max]`, both bounds inclusive.
    ///
    /// Reversed bounds are swapped rather than rejected.
    pub fn get_random_int(&mut self, min: i64, max: i64) -> i64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.draws += 1;
        self.inner.gen_range(lo..=hi)
    }

    /// Uniform integer percentage in `[0, 100]`.
    pub fn get_random_percent(&mut self) -> u32 {
        self.draws += 1;
        self.inner.gen_range(0..=100)
    }

    /// Roll against a percentage chance.
    ///
    /// Draws from `[0, 100)`, so `chance` succeeds exactly `chance` times in
    /// a hundred. 0 never succeeds; 100 or more always does.
    pub fn roll_percent(&mut self, chance: u32) -> bool {
        self.draws += 1;
        let roll: u32 = self.inner.gen_range(0..100);
        roll < chance
    }

    /// Return a shuffled copy of `items` (Fisher-Yates via `rand`).
    #[must_use]
    pub fn shuffle_array<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut shuffled = items.to_vec();
        self.draws += 1;
        shuffled.shuffle(&mut self.inner);
        shuffled
    }

    /// Number of rolls made so far. Useful in debug logs when chasing
    /// divergence.
    #[must_use]
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> BattleRngState {
        BattleRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
            draws: self.draws,
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &BattleRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
            draws: state.draws,
        }
    }
}

/// Serializable RNG state for checkpointing.
///
/// Uses ChaCha8 word position for O(1) serialization regardless of
/// how many random numbers have been generated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRngState {
    /// Original seed
    pub seed: u64,
    /// ChaCha8 word position (128-bit counter)
    pub word_pos: u128,
    /// Rolls made before the checkpoint
    pub draws: u64,
}

/// Local, unsynchronized randomness for visual variation only.
#[derive(Debug)]
pub struct CosmeticRng {
    inner: StdRng,
}

impl CosmeticRng {
    /// Seed from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            inner: StdRng::from_entropy(),
        }
    }

    /// Random value in `[-spread, spread]`.
    pub fn jitter(&mut self, spread: f32) -> f32 {
        if spread <= 0.0 {
            return 0.0;
        }
        self.inner.gen_range(-spread..=spread)
    }
}

impl Default for CosmeticRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
