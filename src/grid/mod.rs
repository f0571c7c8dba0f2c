//! # Grid sources
//!
//! The detector never reads files itself: it pulls frames through the [`GridSource`]
//! trait, a pluggable source of a `(time, lat, lon)` scalar field. A source is built from
//! configuration only (paths, variable names, time range) and must be opened explicitly
//! with [`GridSource::open`] before any read; [`GridSession`] wraps that lifecycle in a
//! guard that closes the source on every exit path.
//!
//! Modules
//! -----------------
//! * [`frame`] – one time step of the field, with a validity mask.
//! * [`time_range`] – contiguous frame ranges and their even split across workers.
//! * [`memory_grid`] – in-memory backend sharing its data between partitions.
//! * [`json_grid`] – JSON file backend loaded on `open()`.
//!
//! Partitioning
//! -----------------
//! [`GridSource::split`] returns `n` unopened sub-sources covering disjoint, contiguous,
//! increasing time ranges whose lengths differ by at most one frame. A partition may be
//! empty when there are fewer frames than workers; reads on it return empty results.
pub mod frame;
pub mod json_grid;
pub mod memory_grid;
pub mod time_range;

use std::ops::{Deref, DerefMut, Range};

use crate::{
    constants::{Degree, Timestamp},
    storm_errors::StormError,
    time::TimeUnits,
};

pub use frame::Frame;
pub use time_range::TimeRange;

/// A source of 2-D frames indexed by time.
///
/// Frame indices are **relative** to the time range of the source: index `0` is the first
/// frame of the partition, not of the underlying dataset.
pub trait GridSource {
    /// Acquire the underlying resources. Calling `open` on an opened source is a no-op.
    fn open(&mut self) -> Result<(), StormError>;

    /// Release the underlying resources. Calling `close` on a closed source is a no-op.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Time range of the source within the underlying dataset.
    fn time_range(&self) -> TimeRange;

    /// Number of frames of this source.
    fn num_frames(&self) -> usize {
        self.time_range().len()
    }

    /// Read the frames `range` (relative indices, end exclusive).
    ///
    /// An empty range returns an empty vector; an inverted range or a range past the end
    /// of the source is an error.
    fn frames(&self, range: Range<usize>) -> Result<Vec<Frame>, StormError>;

    /// Read a single frame (relative index).
    fn frame(&self, index: usize) -> Result<Frame, StormError> {
        let len = self.num_frames();
        if index >= len {
            return Err(StormError::FrameOutOfBounds { index, len });
        }
        self.frames(index..index + 1)?
            .pop()
            .ok_or(StormError::FrameOutOfBounds { index, len })
    }

    /// Time axis values of the frames of this source.
    fn times(&self) -> Result<Vec<Timestamp>, StormError>;

    /// Latitude of every grid row, in degrees.
    fn lat(&self) -> Result<Vec<Degree>, StormError>;

    /// Longitude of every grid column, in degrees.
    fn lon(&self) -> Result<Vec<Degree>, StormError>;

    /// Units of the time axis, when the source declares them.
    fn time_units(&self) -> Option<&TimeUnits> {
        None
    }

    /// Split the source into `num` unopened sub-sources over contiguous time ranges.
    ///
    /// Errors
    /// ----------
    /// * [`StormError::InvalidParameter`] if `num == 0`.
    /// * [`StormError::InvalidState`] if the source is already opened.
    fn split(&self, num: usize) -> Result<Vec<Self>, StormError>
    where
        Self: Sized;
}

/// Check a relative frame request against a source of `len` frames.
pub(crate) fn check_frame_range(range: &Range<usize>, len: usize) -> Result<(), StormError> {
    if range.start > range.end {
        return Err(StormError::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }
    if range.end > len {
        return Err(StormError::FrameOutOfBounds {
            index: range.end - 1,
            len,
        });
    }
    Ok(())
}

/// Scoped access to an opened [`GridSource`].
///
/// The source is opened by [`GridSession::open`] and closed when the session is dropped,
/// including on early returns and panics.
///
/// ```rust,no_run
/// use stormtrack::grid::{GridSession, GridSource, json_grid::JsonGrid};
///
/// # fn run() -> Result<(), stormtrack::storm_errors::StormError> {
/// let mut grid = JsonGrid::new("slp.2012.json", "slp");
/// let session = GridSession::open(&mut grid)?;
/// let first = session.frame(0)?;
/// # Ok(()) }
/// ```
pub struct GridSession<'a, G: GridSource> {
    grid: &'a mut G,
}

impl<'a, G: GridSource> GridSession<'a, G> {
    pub fn open(grid: &'a mut G) -> Result<Self, StormError> {
        grid.open()?;
        Ok(GridSession { grid })
    }
}

impl<G: GridSource> Deref for GridSession<'_, G> {
    type Target = G;

    fn deref(&self) -> &Self::Target {
        self.grid
    }
}

impl<G: GridSource> DerefMut for GridSession<'_, G> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.grid
    }
}

impl<G: GridSource> Drop for GridSession<'_, G> {
    fn drop(&mut self) {
        self.grid.close();
    }
}
