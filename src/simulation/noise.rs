//! Injectable randomness for the measurement simulator

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the uniform noise applied to simulated measurements
pub trait NoiseSource {
    /// Draw a value uniformly from `[low, high)`. A degenerate range returns `low`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Pseudo-random noise backed by `StdRng`
#[derive(Debug, Clone)]
pub struct RandomNoise {
    rng: StdRng,
}

impl RandomNoise {
    /// Seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseSource for RandomNoise {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if !(high > low) {
            return low;
        }
        self.rng.gen_range(low..high)
    }
}

/// Noise source that always returns 0.0, for noise-free runs
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNoise;

impl NoiseSource for ZeroNoise {
    fn uniform(&mut self, _low: f64, _high: f64) -> f64 {
        0.0
    }
}

impl<N: NoiseSource + ?Sized> NoiseSource for Box<N> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (**self).uniform(low, high)
    }
}
