//! Random and sequential offset generation
//!
//! The workload model draws three kinds of values from this module:
//!
//! - **Inter-arrival delays** ([`exponential`]): exponentially distributed
//!   waits that turn the producer into a Poisson arrival process.
//! - **Random block numbers** ([`uniform`]): uniform choice of a block within
//!   the target extent for the random classes.
//! - **Sequential offsets** ([`sequential`]): a wrapping cursor per sequential
//!   class.
//!
//! # Block-Based Design
//!
//! Random offsets are generated as block numbers (0, 1, 2, ..., N-1) rather than
//! byte offsets, so they come out aligned to the configured block size. With an
//! alignment of 1 every byte offset in the extent is a block.
//!
//! The workload model converts block numbers to byte offsets:
//! `offset = block_num * alignment`
//!
//! # Example
//!
//! ```
//! use poissonio::distribution::{Distribution, uniform::UniformDistribution};
//!
//! let mut dist = UniformDistribution::with_seed(7);
//! let block_num = dist.next_block(1024); // Random block in range [0, 1024)
//! assert!(block_num < 1024);
//!
//! let alignment = 4096;
//! let offset = block_num * alignment;
//! assert_eq!(offset % alignment, 0);
//! ```

/// Block number generation
///
/// # Thread Safety
///
/// Distributions must be `Send` so the workload model can move into the
/// producer thread. Each model owns its own instance.
pub trait Distribution: Send {
    /// Generate next block number within range
    ///
    /// # Arguments
    ///
    /// * `num_blocks` - Number of addressable blocks in the extent
    ///
    /// # Returns
    ///
    /// A block number in the range [0, num_blocks), or 0 when `num_blocks` is 0.
    fn next_block(&mut self, num_blocks: u64) -> u64;
}

pub mod exponential;
pub mod sequential;
pub mod uniform;
