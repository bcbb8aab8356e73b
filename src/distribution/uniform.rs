//! Uniform random distribution
//!
//! Every block of the extent is equally likely. Used for the random-read and
//! random-write classes, and for the percentile draw that picks each item's
//! task class.
//!
//! # Example
//!
//! ```
//! use poissonio::distribution::{Distribution, uniform::UniformDistribution};
//!
//! let mut dist = UniformDistribution::with_seed(1);
//! for _ in 0..10 {
//!     assert!(dist.next_block(1024) < 1024);
//! }
//! ```

use super::Distribution;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Uniform block generator backed by xoshiro256++
#[derive(Debug, Clone)]
pub struct UniformDistribution {
    rng: Xoshiro256PlusPlus,
}

impl UniformDistribution {
    /// Create a new uniform distribution with random seed
    pub fn new() -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_entropy(),
        }
    }
    
    /// Create a new uniform distribution with specific seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl UniformDistribution {
    /// Draw an integer in [1, 100]
    #[inline]
    pub fn percent(&mut self) -> u8 {
        self.rng.gen_range(1..=100)
    }
}

impl Default for UniformDistribution {
    fn default() -> Self {
        Self::new()
    }
}

impl Distribution for UniformDistribution {
    #[inline(always)]
    fn next_block(&mut self, num_blocks: u64) -> u64 {
        if num_blocks == 0 {
            return 0;
        }
        self.rng.gen_range(0..num_blocks)
    }
}
