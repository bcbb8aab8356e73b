//! Workload model
//!
//! Turns a [`WorkProfile`] and a target extent into a stream of [`WorkItem`]s.
//! Each call to [`WorkloadModel::generate`]:
//!
//! 1. Draws an integer in [1, 100] and picks the first class whose cumulative
//!    threshold is at least the draw.
//! 2. Chooses an offset. Random classes pick a uniform block of the extent;
//!    sequential classes take their cursor's position and advance it by the
//!    class size, wrapping to 0 when the next position would reach the end.
//! 3. Clamps the length so the IO never runs past the extent.
//! 4. Stamps the item with the next value of a single sequence counter shared
//!    by all classes.
//!
//! The model owns all of this state, so only one thread (the producer) calls
//! `generate`. Seeded construction makes the stream reproducible.
//!
//! # Example
//!
//! ```
//! use poissonio::workload::{TaskClass, WorkProfile, WorkloadModel};
//!
//! let profile = WorkProfile::from_percentages([0, 0, 100, 0], [0, 0, 400, 0]).unwrap();
//! let mut model = WorkloadModel::with_seed(profile, 1000, 1, 1);
//!
//! let offsets: Vec<u64> = (0..4).map(|_| model.generate().offset).collect();
//! assert_eq!(offsets, vec![0, 400, 800, 0]);
//! ```

pub mod profile;

pub use profile::{ClassSet, TaskClass, WorkProfile};

use crate::distribution::sequential::SequentialCursor;
use crate::distribution::uniform::UniformDistribution;
use crate::distribution::Distribution;

/// One IO request travelling from the producer to the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    /// Position in generation order, unique per run
    pub sequence: u64,
    /// Byte offset into the target
    pub offset: u64,
    /// Byte count, already clamped to the extent
    pub length: u64,
    pub class: TaskClass,
}

/// Clamp an IO so it ends at or before `extent`
///
/// # Returns
///
/// `length` when the IO fits, otherwise `extent - offset` (0 if `offset` is
/// already past the end).
#[inline]
pub fn clamp_length(extent: u64, offset: u64, length: u64) -> u64 {
    length.min(extent.saturating_sub(offset))
}

/// Generator of work items for one run
#[derive(Debug, Clone)]
pub struct WorkloadModel {
    profile: WorkProfile,
    extent: u64,
    alignment: u64,
    next_sequence: u64,
    /// Cursors for sequential-read and sequential-write
    read_cursor: SequentialCursor,
    write_cursor: SequentialCursor,
    uniform: UniformDistribution,
}

impl WorkloadModel {
    /// Create a model with a random seed
    ///
    /// # Arguments
    ///
    /// * `profile` - Workload mix
    /// * `extent` - Addressable bytes of the target
    /// * `alignment` - Granularity of random offsets in bytes (1 for any byte)
    pub fn new(profile: WorkProfile, extent: u64, alignment: u64) -> Self {
        Self::build(profile, extent, alignment, UniformDistribution::new())
    }

    /// Create a model with specific seed
    pub fn with_seed(profile: WorkProfile, extent: u64, alignment: u64, seed: u64) -> Self {
        Self::build(profile, extent, alignment, UniformDistribution::with_seed(seed))
    }

    fn build(
        profile: WorkProfile,
        extent: u64,
        alignment: u64,
        uniform: UniformDistribution,
    ) -> Self {
        Self {
            profile,
            extent,
            alignment: alignment.max(1),
            next_sequence: 0,
            read_cursor: SequentialCursor::new(),
            write_cursor: SequentialCursor::new(),
            uniform,
        }
    }

    #[inline]
    pub fn profile(&self) -> &WorkProfile {
        &self.profile
    }

    #[inline]
    pub fn extent(&self) -> u64 {
        self.extent
    }

    /// Number of items generated so far
    #[inline]
    pub fn generated(&self) -> u64 {
        self.next_sequence
    }

    /// Generate the next item, choosing its class from the profile
    pub fn generate(&mut self) -> WorkItem {
        let draw = self.uniform.percent();
        let class = self.profile.classify(draw);
        self.generate_class(class)
    }

    /// Generate the next item for a given class
    ///
    /// Advances the shared sequence counter and, for sequential classes, that
    /// class's cursor.
    pub fn generate_class(&mut self, class: TaskClass) -> WorkItem {
        let size = self.profile.size(class);

        let offset = match class {
            TaskClass::RandomRead | TaskClass::RandomWrite => {
                let num_blocks = self.extent / self.alignment;
                self.uniform.next_block(num_blocks) * self.alignment
            }
            TaskClass::SequentialRead => self.read_cursor.advance(size, self.extent),
            TaskClass::SequentialWrite => self.write_cursor.advance(size, self.extent),
        };

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        WorkItem {
            sequence,
            offset,
            length: clamp_length(self.extent, offset, size),
            class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(percentages: [u8; 4], sizes: [u64; 4]) -> WorkProfile {
        WorkProfile::from_percentages(percentages, sizes).unwrap()
    }

    #[test]
    fn test_clamp_length() {
        assert_eq!(clamp_length(1000, 900, 400), 100);
        assert_eq!(clamp_length(1000, 600, 400), 400);
        assert_eq!(clamp_length(1000, 0, 4000), 1000);
        assert_eq!(clamp_length(1000, 1000, 10), 0);
        assert_eq!(clamp_length(1000, 5000, 10), 0);
    }

    #[test]
    fn test_sequential_read_offsets_wrap() {
        let mut model = WorkloadModel::with_seed(profile([0, 0, 100, 0], [0, 0, 400, 0]), 1000, 1, 5);

        let items: Vec<WorkItem> = (0..4).map(|_| model.generate()).collect();
        let offsets: Vec<u64> = items.iter().map(|i| i.offset).collect();
        let lengths: Vec<u64> = items.iter().map(|i| i.length).collect();

        assert_eq!(offsets, vec![0, 400, 800, 0]);
        // The third IO would run past the extent
        assert_eq!(lengths, vec![400, 400, 200, 400]);
    }

    #[test]
    fn test_sequential_cursors_are_independent() {
        let mut model = WorkloadModel::with_seed(profile([0, 0, 50, 50], [0, 0, 100, 300]), 10_000, 1, 5);

        assert_eq!(model.generate_class(TaskClass::SequentialRead).offset, 0);
        assert_eq!(model.generate_class(TaskClass::SequentialWrite).offset, 0);
        assert_eq!(model.generate_class(TaskClass::SequentialRead).offset, 100);
        assert_eq!(model.generate_class(TaskClass::SequentialWrite).offset, 300);
        assert_eq!(model.generate_class(TaskClass::SequentialRead).offset, 200);
    }

    #[test]
    fn test_sequence_shared_across_classes() {
        let mut model = WorkloadModel::with_seed(profile([25, 25, 25, 25], [512; 4]), 1 << 20, 1, 11);

        for expected in 0..1000 {
            assert_eq!(model.generate().sequence, expected);
        }
        assert_eq!(model.generated(), 1000);
    }

    #[test]
    fn test_random_offsets_inside_extent() {
        let extent = 1 << 20;
        let mut model = WorkloadModel::with_seed(profile([50, 50, 0, 0], [512, 8192, 0, 0]), extent, 1, 3);

        for _ in 0..10_000 {
            let item = model.generate();
            assert!(item.offset < extent);
            assert!(item.offset + item.length <= extent);
            assert!(item.length > 0);
        }
    }

    #[test]
    fn test_random_offsets_aligned() {
        let mut model = WorkloadModel::with_seed(profile([100, 0, 0, 0], [4096, 0, 0, 0]), 1 << 24, 4096, 3);

        for _ in 0..1000 {
            let item = model.generate();
            assert_eq!(item.offset % 4096, 0);
            assert_eq!(item.length, 4096);
        }
    }

    #[test]
    fn test_mix_follows_percentages() {
        let mut model = WorkloadModel::with_seed(profile([10, 25, 50, 15], [512; 4]), 1 << 30, 1, 77);
        let mut counts = [0u32; 4];
        let n = 40_000;
        for _ in 0..n {
            counts[model.generate().class.index()] += 1;
        }

        let expected = [0.10, 0.25, 0.50, 0.15];
        for (count, share) in counts.iter().zip(expected) {
            let observed = *count as f64 / n as f64;
            assert!((observed - share).abs() < 0.02, "observed {} expected {}", observed, share);
        }
    }

    #[test]
    fn test_seeded_models_repeat() {
        let p = profile([40, 20, 20, 20], [512, 1024, 2048, 4096]);
        let mut a = WorkloadModel::with_seed(p.clone(), 1 << 20, 1, 2024);
        let mut b = WorkloadModel::with_seed(p, 1 << 20, 1, 2024);
        for _ in 0..100 {
            assert_eq!(a.generate(), b.generate());
        }
    }
}
