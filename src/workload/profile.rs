//! Task classes and the work profile

use crate::error::ProfileError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four kinds of IO the benchmark issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskClass {
    RandomRead,
    RandomWrite,
    SequentialRead,
    SequentialWrite,
}

impl TaskClass {
    /// All classes in profile order
    ///
    /// This order fixes threshold comparison, report rows and statistics
    /// file records.
    pub const ALL: [TaskClass; 4] = [
        TaskClass::RandomRead,
        TaskClass::RandomWrite,
        TaskClass::SequentialRead,
        TaskClass::SequentialWrite,
    ];

    /// Position of the class in [`TaskClass::ALL`]
    #[inline]
    pub fn index(self) -> usize {
        match self {
            TaskClass::RandomRead => 0,
            TaskClass::RandomWrite => 1,
            TaskClass::SequentialRead => 2,
            TaskClass::SequentialWrite => 3,
        }
    }

    #[inline]
    pub fn is_read(self) -> bool {
        matches!(self, TaskClass::RandomRead | TaskClass::SequentialRead)
    }

    #[inline]
    pub fn is_write(self) -> bool {
        !self.is_read()
    }

    #[inline]
    pub fn is_sequential(self) -> bool {
        matches!(self, TaskClass::SequentialRead | TaskClass::SequentialWrite)
    }

    /// Name used in reports and log lines
    pub fn as_str(self) -> &'static str {
        match self {
            TaskClass::RandomRead => "random-read",
            TaskClass::RandomWrite => "random-write",
            TaskClass::SequentialRead => "sequential-read",
            TaskClass::SequentialWrite => "sequential-write",
        }
    }
}

impl fmt::Display for TaskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bit set of enabled task classes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassSet(u8);

impl ClassSet {
    pub const EMPTY: ClassSet = ClassSet(0);

    #[inline]
    pub fn insert(&mut self, class: TaskClass) {
        self.0 |= 1 << class.index();
    }

    #[inline]
    pub fn contains(self, class: TaskClass) -> bool {
        self.0 & (1 << class.index()) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Enabled classes in profile order
    pub fn iter(self) -> impl Iterator<Item = TaskClass> {
        TaskClass::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

/// Immutable description of the workload mix
///
/// Holds the cumulative thresholds used to pick a class for each item, the IO
/// size of every class and the set of classes with a non-zero share. Built
/// once before any thread starts and only read afterwards.
///
/// # Example
///
/// ```
/// use poissonio::workload::{TaskClass, WorkProfile};
///
/// let profile = WorkProfile::from_percentages([10, 25, 50, 15], [4096; 4]).unwrap();
/// assert_eq!(profile.thresholds(), [10, 35, 85, 100]);
/// assert_eq!(profile.classify(36), TaskClass::SequentialRead);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkProfile {
    thresholds: [u8; 4],
    sizes: [u64; 4],
    enabled: ClassSet,
}

impl WorkProfile {
    /// Build a profile from per-class percentages
    ///
    /// # Arguments
    ///
    /// * `percentages` - Share of each class in [`TaskClass::ALL`] order
    /// * `sizes` - IO size in bytes of each class
    ///
    /// # Errors
    ///
    /// Rejects percentages that do not sum to 100, an empty class set, and an
    /// enabled class with a zero size.
    pub fn from_percentages(percentages: [u8; 4], sizes: [u64; 4]) -> Result<Self, ProfileError> {
        let sum: u32 = percentages.iter().map(|&p| p as u32).sum();
        if sum != 100 {
            return Err(ProfileError::ProbabilitySum(sum));
        }

        let mut thresholds = [0u8; 4];
        let mut running = 0u8;
        for (threshold, pct) in thresholds.iter_mut().zip(percentages) {
            running += pct;
            *threshold = running;
        }

        Self::from_thresholds(thresholds, sizes)
    }

    /// Build a profile from cumulative thresholds
    ///
    /// Class `i` is enabled when its threshold is above the previous one.
    ///
    /// # Errors
    ///
    /// Rejects thresholds that decrease or do not end at 100, an empty class
    /// set, and an enabled class with a zero size.
    pub fn from_thresholds(thresholds: [u8; 4], sizes: [u64; 4]) -> Result<Self, ProfileError> {
        let ascending = thresholds.windows(2).all(|w| w[0] <= w[1]);
        if !ascending || thresholds[3] != 100 {
            return Err(ProfileError::NotCumulative(thresholds));
        }

        let mut enabled = ClassSet::EMPTY;
        let mut previous = 0u8;
        for class in TaskClass::ALL {
            let threshold = thresholds[class.index()];
            if threshold > previous {
                enabled.insert(class);
            }
            previous = threshold;
        }

        if enabled.is_empty() {
            return Err(ProfileError::NoClassEnabled);
        }
        if let Some(class) = enabled.iter().find(|c| sizes[c.index()] == 0) {
            return Err(ProfileError::ZeroSize(class));
        }

        Ok(Self {
            thresholds,
            sizes,
            enabled,
        })
    }

    /// Pick the class for a draw in [1, 100]
    ///
    /// Returns the first class, in profile order, whose cumulative threshold is
    /// greater than or equal to `draw`.
    pub fn classify(&self, draw: u8) -> TaskClass {
        TaskClass::ALL
            .into_iter()
            .find(|c| self.thresholds[c.index()] >= draw)
            .unwrap_or(TaskClass::SequentialWrite)
    }

    #[inline]
    pub fn thresholds(&self) -> [u8; 4] {
        self.thresholds
    }

    /// Share of `class` in percent
    pub fn percentage(&self, class: TaskClass) -> u8 {
        let idx = class.index();
        let previous = if idx == 0 { 0 } else { self.thresholds[idx - 1] };
        self.thresholds[idx] - previous
    }

    #[inline]
    pub fn size(&self, class: TaskClass) -> u64 {
        self.sizes[class.index()]
    }

    #[inline]
    pub fn enabled(&self) -> ClassSet {
        self.enabled
    }

    #[inline]
    pub fn is_enabled(&self, class: TaskClass) -> bool {
        self.enabled.contains(class)
    }

    /// Largest IO size among enabled classes
    pub fn max_io_size(&self) -> u64 {
        self.enabled
            .iter()
            .map(|c| self.size(c))
            .max()
            .unwrap_or(0)
    }

    /// True when any enabled class writes
    pub fn has_writes(&self) -> bool {
        self.enabled.iter().any(TaskClass::is_write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes() -> [u64; 4] {
        [512, 1024, 2048, 4096]
    }

    #[test]
    fn test_classify_bucket_edges() {
        let profile = WorkProfile::from_thresholds([10, 35, 85, 100], sizes()).unwrap();
        let cases = [
            (1, TaskClass::RandomRead),
            (10, TaskClass::RandomRead),
            (11, TaskClass::RandomWrite),
            (35, TaskClass::RandomWrite),
            (36, TaskClass::SequentialRead),
            (85, TaskClass::SequentialRead),
            (86, TaskClass::SequentialWrite),
            (100, TaskClass::SequentialWrite),
        ];
        for (draw, expected) in cases {
            assert_eq!(profile.classify(draw), expected, "draw {}", draw);
        }
    }

    #[test]
    fn test_percentages_become_cumulative() {
        let profile = WorkProfile::from_percentages([10, 25, 50, 15], sizes()).unwrap();
        assert_eq!(profile.thresholds(), [10, 35, 85, 100]);
        assert_eq!(profile.percentage(TaskClass::RandomWrite), 25);
        assert_eq!(profile.percentage(TaskClass::SequentialWrite), 15);
        assert_eq!(profile.enabled().len(), 4);
    }

    #[test]
    fn test_sum_must_be_100() {
        assert_eq!(
            WorkProfile::from_percentages([10, 10, 10, 10], sizes()),
            Err(ProfileError::ProbabilitySum(40))
        );
        assert_eq!(
            WorkProfile::from_percentages([100, 100, 0, 0], sizes()),
            Err(ProfileError::ProbabilitySum(200))
        );
        assert_eq!(
            WorkProfile::from_percentages([0, 0, 0, 0], sizes()),
            Err(ProfileError::ProbabilitySum(0))
        );
    }

    #[test]
    fn test_thresholds_must_be_cumulative() {
        assert!(matches!(
            WorkProfile::from_thresholds([50, 40, 90, 100], sizes()),
            Err(ProfileError::NotCumulative(_))
        ));
        assert!(matches!(
            WorkProfile::from_thresholds([10, 20, 30, 90], sizes()),
            Err(ProfileError::NotCumulative(_))
        ));
    }

    #[test]
    fn test_disabled_classes_never_chosen() {
        let profile = WorkProfile::from_percentages([0, 0, 100, 0], sizes()).unwrap();
        assert_eq!(profile.enabled().iter().collect::<Vec<_>>(), vec![TaskClass::SequentialRead]);
        for draw in 1..=100 {
            assert_eq!(profile.classify(draw), TaskClass::SequentialRead);
        }
        assert!(!profile.has_writes());
    }

    #[test]
    fn test_zero_size_rejected_only_when_enabled() {
        assert_eq!(
            WorkProfile::from_percentages([50, 50, 0, 0], [512, 0, 0, 0]),
            Err(ProfileError::ZeroSize(TaskClass::RandomWrite))
        );
        let profile = WorkProfile::from_percentages([100, 0, 0, 0], [512, 0, 0, 0]).unwrap();
        assert_eq!(profile.max_io_size(), 512);
    }

    #[test]
    fn test_class_helpers() {
        assert!(TaskClass::RandomRead.is_read());
        assert!(TaskClass::SequentialWrite.is_write());
        assert!(TaskClass::SequentialRead.is_sequential());
        assert!(!TaskClass::RandomWrite.is_sequential());
        for (i, class) in TaskClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
        }
        assert_eq!(TaskClass::SequentialWrite.to_string(), "sequential-write");
    }
}
