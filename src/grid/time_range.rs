use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::storm_errors::StormError;

/// Contiguous range of frame indices `[start, end)` within a dataset.
///
/// A range with `start >= end` is empty; it is a valid value, handed to workers that
/// receive a zero-length share of the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: usize,
    pub end: usize,
}

impl TimeRange {
    pub fn new(start: usize, end: usize) -> Self {
        TimeRange { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Absolute index range in the underlying dataset.
    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end.max(self.start)
    }

    /// Split the range into `num` contiguous sub-ranges whose lengths differ by at most one.
    ///
    /// The `i`-th sub-range is
    /// `[start + i·q + (r·i)/num, start + (i+1)·q + (r·(i+1))/num)` with `q = len / num`
    /// and `r = len % num`, so the extra frames are spread across the partitions.
    ///
    /// Errors
    /// ----------
    /// * [`StormError::InvalidParameter`] if `num == 0`.
    pub fn split(&self, num: usize) -> Result<Vec<TimeRange>, StormError> {
        if num == 0 {
            return Err(StormError::InvalidParameter(
                "number of partitions must be >= 1".into(),
            ));
        }
        let len = self.len();
        let chunk = len / num;
        let remainder = len % num;

        Ok((0..num)
            .map(|i| {
                TimeRange::new(
                    self.start + i * chunk + remainder * i / num,
                    self.start + (i + 1) * chunk + remainder * (i + 1) / num,
                )
            })
            .collect())
    }
}

impl From<Range<usize>> for TimeRange {
    fn from(r: Range<usize>) -> Self {
        TimeRange::new(r.start, r.end)
    }
}

#[cfg(test)]
mod time_range_test {
    use super::*;

    #[test]
    fn test_split_covers_range() {
        let parts = TimeRange::new(3, 13).split(4).unwrap();
        assert_eq!(
            parts,
            vec![
                TimeRange::new(3, 5),
                TimeRange::new(5, 8),
                TimeRange::new(8, 10),
                TimeRange::new(10, 13)
            ]
        );
        let lens: Vec<usize> = parts.iter().map(TimeRange::len).collect();
        assert_eq!(lens.iter().sum::<usize>(), 10);
        assert!(lens.iter().max().unwrap() - lens.iter().min().unwrap() <= 1);
    }

    #[test]
    fn test_split_more_parts_than_frames() {
        let parts = TimeRange::new(0, 2).split(4).unwrap();
        assert_eq!(parts.iter().filter(|p| p.is_empty()).count(), 2);
        assert_eq!(parts.last().unwrap().end, 2);
    }

    #[test]
    fn test_split_zero_is_rejected() {
        assert!(matches!(
            TimeRange::new(0, 10).split(0),
            Err(StormError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let r = TimeRange::new(5, 2);
        assert!(r.is_empty());
        assert_eq!(r.len(), 0);
        assert_eq!(r.as_range().len(), 0);
    }
}
