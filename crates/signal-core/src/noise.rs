use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Injectable pseudo-randomness for the simulated indicator feed.
///
/// All indicator fabrication draws through this wrapper so tests can seed it
/// and replay the pipeline deterministically. This is a declared simulation
/// stand-in, not a real data feed.
pub struct Noise {
    rng: StdRng,
}

impl Noise {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform draw in `[lo, hi]`.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if lo >= hi {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }

    /// Uniform integer draw in `[lo, hi]`.
    pub fn uniform_int(&mut self, lo: u32, hi: u32) -> u32 {
        if lo >= hi {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }
}
