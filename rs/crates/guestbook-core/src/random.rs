use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the visitor counter's randomness.
pub trait RandomSource: Send {
    /// Uniform integer in `[low, high)`. Callers guarantee `low < high`.
    fn range(&mut self, low: u32, high: u32) -> u32;
}

/// Entropy-seeded generator used by the running server.
pub struct ThreadRandom(StdRng);

impl ThreadRandom {
    pub fn new() -> Self {
        ThreadRandom(StdRng::from_entropy())
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn range(&mut self, low: u32, high: u32) -> u32 {
        self.0.gen_range(low..high)
    }
}

/// Deterministic generator; the same seed always yields the same sequence.
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        SeededRandom(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn range(&mut self, low: u32, high: u32) -> u32 {
        self.0.gen_range(low..high)
    }
}
