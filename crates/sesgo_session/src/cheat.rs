//! Debug-only fast-forward capability.
//!
//! The sampler is a capability object: the scheduler only holds one when
//! the deployment enabled `debug`, so the synthetic path is structurally
//! unreachable in production.

use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Samples synthetic reaction times around a caller-supplied mean with a
/// fixed spread.
#[derive(Debug, Clone, Copy)]
pub struct CheatSampler {
    spread: f64,
}

impl CheatSampler {
    pub fn new() -> Self {
        Self { spread: 0.3 }
    }

    /// One synthetic latency, clamped to non-negative.
    pub fn sample<R: Rng>(&self, mean: f64, rng: &mut R) -> f64 {
        let latency = match Normal::new(mean, self.spread) {
            Ok(dist) => dist.sample(rng),
            // mean was not finite; fall back to it verbatim
            Err(_) => mean,
        };
        latency.max(0.0)
    }
}

impl Default for CheatSampler {
    fn default() -> Self {
        Self::new()
    }
}
