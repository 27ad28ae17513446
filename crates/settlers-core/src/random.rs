//! Substitutable source of randomness.
//!
//! Every random decision in the engine (board layout, deck order, dice,
//! theft) goes through [`RandomSource`], so a host can plug in a seeded
//! generator and tests can script exact outcomes.

use rand::rngs::{StdRng, ThreadRng};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Random decisions the rules engine needs
pub trait RandomSource {
    /// Roll one six-sided die (1-6)
    fn roll_die(&mut self) -> u8;

    /// Pick an index in `0..len`. Returns 0 when `len` is 0.
    fn pick(&mut self, len: usize) -> usize;

    /// Fisher-Yates shuffle driven by [`RandomSource::pick`]
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.pick(i + 1);
            items.swap(i, j);
        }
    }
}

impl RandomSource for StdRng {
    fn roll_die(&mut self) -> u8 {
        self.gen_range(1..=6)
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.gen_range(0..len)
    }
}

impl RandomSource for ThreadRng {
    fn roll_die(&mut self) -> u8 {
        self.gen_range(1..=6)
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.gen_range(0..len)
    }
}

/// Replays queued outcomes, for tests and recorded games.
///
/// Once a queue runs dry, dice come up 1 and picks return index 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptedRandom {
    dice: VecDeque<u8>,
    picks: VecDeque<usize>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue individual die faces
    pub fn with_dice(mut self, faces: impl IntoIterator<Item = u8>) -> Self {
        self.dice.extend(faces);
        self
    }

    /// Queue pick indices
    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn roll_die(&mut self) -> u8 {
        self.dice.pop_front().unwrap_or(1).clamp(1, 6)
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.picks.pop_front().unwrap_or(0) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_std_rng_die_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let face = rng.roll_die();
            assert!((1..=6).contains(&face), "die face {} out of range", face);
        }
    }

    #[test]
    fn test_seeded_shuffle_is_deterministic() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        RandomSource::shuffle(&mut StdRng::seed_from_u64(42), &mut a);
        RandomSource::shuffle(&mut StdRng::seed_from_u64(42), &mut b);
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_scripted_replays_queue() {
        let mut rng = ScriptedRandom::new().with_dice([3, 4]).with_picks([5, 1]);
        assert_eq!(rng.roll_die(), 3);
        assert_eq!(rng.roll_die(), 4);
        assert_eq!(rng.pick(10), 5);
        assert_eq!(rng.pick(10), 1);

        // Exhausted
        assert_eq!(rng.roll_die(), 1);
        assert_eq!(rng.pick(10), 0);
    }

    #[test]
    fn test_scripted_pick_wraps_to_len() {
        let mut rng = ScriptedRandom::new().with_picks([7]);
        assert_eq!(rng.pick(3), 1);
        assert_eq!(rng.pick(0), 0);
    }
}
