//! Random source implementations

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::RandomProvider;

/// Non-reproducible generator seeded from the operating system
pub struct EntropyRandom {
    rng: StdRng,
}

impl Default for EntropyRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropyRandom {
    /// Create a generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomProvider for EntropyRandom {
    fn seed(&mut self, seed: u32) {
        self.rng = StdRng::seed_from_u64(u64::from(seed));
    }

    fn random_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }
}

/// Reproducible generator: the same seed yields the same sequence on every platform
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Create a generator starting at `seed`
    pub fn new(seed: u32) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(u64::from(seed)),
        }
    }
}

impl RandomProvider for SeededRandom {
    fn seed(&mut self, seed: u32) {
        self.rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
    }

    fn random_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }
}

/// Fake generator that replays queued values
///
/// Each draw pops the next queued value (or uses the fallback once the queue is
/// empty) and clamps it into the requested range, so tests can steer branch
/// decisions without knowing the exact call sequence.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    queue: VecDeque<i32>,
    fallback: i32,
    draws: usize,
}

impl ScriptedRandom {
    /// Always return `value`, clamped into each requested range
    pub fn constant(value: i32) -> Self {
        Self {
            queue: VecDeque::new(),
            fallback: value,
            draws: 0,
        }
    }

    /// Replay `values` in order, then fall back to `fallback`
    pub fn with_values(values: impl IntoIterator<Item = i32>, fallback: i32) -> Self {
        Self {
            queue: values.into_iter().collect(),
            fallback,
            draws: 0,
        }
    }

    /// Queue more values behind the ones not yet consumed
    pub fn push(&mut self, value: i32) {
        self.queue.push_back(value);
    }

    /// Number of draws made so far
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl RandomProvider for ScriptedRandom {
    fn seed(&mut self, _seed: u32) {}

    fn random_range(&mut self, min: i32, max: i32) -> i32 {
        self.draws += 1;
        let value = self.queue.pop_front().unwrap_or(self.fallback);
        if max <= min {
            return min;
        }
        value.clamp(min, max - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = SeededRandom::new(12345);
        let mut b = SeededRandom::new(12345);

        let first: Vec<i32> = (0..32).map(|_| a.random_range(-50, 50)).collect();
        let second: Vec<i32> = (0..32).map(|_| b.random_range(-50, 50)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reseed_restarts_sequence() {
        let mut rng = SeededRandom::new(7);
        let first: Vec<i32> = (0..8).map(|_| rng.random_below(100)).collect();
        rng.seed(7);
        let again: Vec<i32> = (0..8).map(|_| rng.random_below(100)).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_range_is_half_open() {
        let mut rng = SeededRandom::new(1);
        for _ in 0..1000 {
            let v = rng.random_range(-2, 3);
            assert!((-2..3).contains(&v), "{} outside [-2, 3)", v);
        }
    }

    #[test]
    fn test_empty_range_returns_min() {
        let mut rng = EntropyRandom::new();
        assert_eq!(rng.random_range(5, 5), 5);
        assert_eq!(rng.random_range(5, 2), 5);
    }

    #[test]
    fn test_scripted_random_replays_and_clamps() {
        let mut rng = ScriptedRandom::with_values([10, 500, -7], 0);
        assert_eq!(rng.random_below(100), 10);
        assert_eq!(rng.random_below(100), 99);
        assert_eq!(rng.random_range(-5, 5), -5);
        assert_eq!(rng.random_range(-5, 5), 0);
        assert_eq!(rng.draws(), 4);
    }
}
