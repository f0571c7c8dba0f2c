//! In-memory [`GridSource`] backend.
//!
//! [`MemoryGrid`] keeps the whole dataset behind an [`Arc`], so [`GridSource::split`]
//! only copies a time range and a pointer. It is the backend used by tests, benches, and
//! callers that already hold their field in memory (e.g. produced by another library).
use std::{ops::Range, sync::Arc};

use crate::{
    constants::{Degree, Timestamp},
    grid::{check_frame_range, Frame, GridSource, TimeRange},
    storm_errors::StormError,
    time::TimeUnits,
};

/// The full `(time, lat, lon)` dataset shared by every partition of a [`MemoryGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct GridData {
    pub time: Vec<Timestamp>,
    pub lat: Vec<Degree>,
    pub lon: Vec<Degree>,
    pub frames: Vec<Frame>,
    pub time_units: Option<TimeUnits>,
}

impl GridData {
    /// Assemble a dataset, checking that every frame is `lat.len() × lon.len()` and that
    /// there is one frame per time value.
    pub fn new(
        time: Vec<Timestamp>,
        lat: Vec<Degree>,
        lon: Vec<Degree>,
        frames: Vec<Frame>,
    ) -> Result<Self, StormError> {
        if frames.len() != time.len() {
            return Err(StormError::DimensionMismatch(format!(
                "{} frames for {} time values",
                frames.len(),
                time.len()
            )));
        }
        if let Some((it, f)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.shape() != (lat.len(), lon.len()))
        {
            return Err(StormError::DimensionMismatch(format!(
                "frame {it} is {:?}, expected ({}, {})",
                f.shape(),
                lat.len(),
                lon.len()
            )));
        }
        Ok(GridData {
            time,
            lat,
            lon,
            frames,
            time_units: None,
        })
    }

    pub fn with_time_units(mut self, units: TimeUnits) -> Self {
        self.time_units = Some(units);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MemoryGrid {
    data: Arc<GridData>,
    trange: TimeRange,
    open: bool,
}

impl MemoryGrid {
    /// A grid over the whole time axis of `data`.
    pub fn new(data: GridData) -> Self {
        let trange = TimeRange::new(0, data.time.len());
        MemoryGrid {
            data: Arc::new(data),
            trange,
            open: false,
        }
    }

    /// A grid restricted to `trange` (absolute frame indices, clamped to the dataset).
    pub fn with_range(data: Arc<GridData>, trange: TimeRange) -> Self {
        let end = trange.end.min(data.time.len());
        MemoryGrid {
            data,
            trange: TimeRange::new(trange.start.min(end), end),
            open: false,
        }
    }

    fn ensure_open(&self) -> Result<(), StormError> {
        if self.open {
            Ok(())
        } else {
            Err(StormError::InvalidState(
                "memory grid must be opened before reading".into(),
            ))
        }
    }
}

impl GridSource for MemoryGrid {
    fn open(&mut self) -> Result<(), StormError> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn time_range(&self) -> TimeRange {
        self.trange
    }

    fn frames(&self, range: Range<usize>) -> Result<Vec<Frame>, StormError> {
        self.ensure_open()?;
        check_frame_range(&range, self.num_frames())?;
        let start = self.trange.start + range.start;
        let end = self.trange.start + range.end;
        Ok(self.data.frames[start..end].to_vec())
    }

    fn times(&self) -> Result<Vec<Timestamp>, StormError> {
        self.ensure_open()?;
        Ok(self.data.time[self.trange.as_range()].to_vec())
    }

    fn lat(&self) -> Result<Vec<Degree>, StormError> {
        self.ensure_open()?;
        Ok(self.data.lat.clone())
    }

    fn lon(&self) -> Result<Vec<Degree>, StormError> {
        self.ensure_open()?;
        Ok(self.data.lon.clone())
    }

    fn time_units(&self) -> Option<&TimeUnits> {
        self.data.time_units.as_ref()
    }

    fn split(&self, num: usize) -> Result<Vec<Self>, StormError> {
        if self.open {
            return Err(StormError::InvalidState(
                "memory grid must not be opened before split".into(),
            ));
        }
        Ok(self
            .trange
            .split(num)?
            .into_iter()
            .map(|r| MemoryGrid::with_range(Arc::clone(&self.data), r))
            .collect())
    }
}
