//! Exponential inter-arrival sampler
//!
//! Sleeping for an exponentially distributed delay between arrivals makes the
//! producer a Poisson process. Delays come from the inverse-CDF transform
//! `-ln(u) / rate` with `u` uniform on the open interval (0, 1); `u` can never
//! be exactly 0, so the logarithm is always finite.
//!
//! The rate is the reciprocal of the mean inter-arrival interval: an interval
//! of 0.01 s is a rate of 100 arrivals per second.
//!
//! # Example
//!
//! ```
//! use poissonio::distribution::exponential::InterArrivalSampler;
//!
//! let mut sampler = InterArrivalSampler::with_seed(3);
//! let delay = sampler.sample(100.0);
//! assert!(delay > 0.0 && delay.is_finite());
//! ```

use rand::distributions::Open01;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Map a uniform variate to an exponential one
///
/// # Arguments
///
/// * `u` - Uniform draw in (0, 1)
/// * `rate` - Arrivals per second, must be positive
///
/// # Returns
///
/// Delay in seconds. Non-positive rates yield `f64::INFINITY`.
#[inline]
pub fn exponential_variate(u: f64, rate: f64) -> f64 {
    if rate <= 0.0 {
        return f64::INFINITY;
    }
    -u.ln() / rate
}

/// Convert a mean inter-arrival interval in seconds into a rate
#[inline]
pub fn rate_from_interval(interval_secs: f64) -> f64 {
    1.0 / interval_secs
}

/// Source of exponentially distributed delays
///
/// Holds only the random source; each [`sample`](Self::sample) is independent
/// of the previous ones.
#[derive(Debug, Clone)]
pub struct InterArrivalSampler {
    rng: Xoshiro256PlusPlus,
}

impl InterArrivalSampler {
    /// Create a sampler with random seed
    pub fn new() -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_entropy(),
        }
    }

    /// Create a sampler with specific seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Draw the next delay in seconds for the given rate
    #[inline]
    pub fn sample(&mut self, rate: f64) -> f64 {
        let u: f64 = self.rng.sample(Open01);
        exponential_variate(u, rate)
    }
}

impl Default for InterArrivalSampler {
    fn default() -> Self {
        Self::new()
    }
}
