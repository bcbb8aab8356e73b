//! Typed errors for the benchmark core
//!
//! Application code works with `anyhow::Result` (see [`crate::Result`]) and adds
//! context at every boundary. The variants here are the conditions a caller may
//! want to match on: a profile that can never be run, an allocation that failed
//! before any thread started, and an IO that transferred fewer bytes than asked.

use crate::workload::TaskClass;
use thiserror::Error;

/// Reasons a work profile is rejected at construction time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// Class probabilities do not add up to 100
    #[error("class probabilities must sum to 100, got {0}")]
    ProbabilitySum(u32),

    /// Cumulative thresholds are not ascending or do not end at 100
    #[error("cumulative thresholds must be ascending and end at 100, got {0:?}")]
    NotCumulative([u8; 4]),

    /// Every class has a zero probability
    #[error("at least one task class must be enabled")]
    NoClassEnabled,

    /// An enabled class has an IO size of zero bytes
    #[error("{0} is enabled but its IO size is 0")]
    ZeroSize(TaskClass),
}

/// Fatal benchmark errors
#[derive(Debug, Error)]
pub enum BenchError {
    /// A fixed-size structure could not be allocated before the run started
    #[error("allocation failed: {0}")]
    Allocation(String),

    /// The work profile is invalid
    #[error("invalid work profile: {0}")]
    InvalidProfile(#[from] ProfileError),

    /// A positioned read or write moved fewer bytes than requested
    #[error(
        "short {class}: offset={offset}, expected {expected} bytes, transferred {actual} bytes"
    )]
    IoSizeMismatch {
        class: TaskClass,
        offset: u64,
        expected: u64,
        actual: u64,
    },

    /// The target has no addressable bytes
    #[error("target extent is empty: {0}")]
    EmptyExtent(String),
}

impl From<crate::queue::QueueError> for BenchError {
    fn from(err: crate::queue::QueueError) -> Self {
        BenchError::Allocation(err.to_string())
    }
}
