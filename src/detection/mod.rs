//! # Storm center detection
//!
//! Finds the pressure lows (or highs) of each frame of a gridded field.
//!
//! Algorithm
//! -----------------
//! 1. Missing cells are filled with `+∞` when searching minima, `−∞` when searching
//!    maxima, so they can never win a window comparison.
//! 2. [`extrema_filter`]: a cell is a raw extremum when it equals the extreme of the
//!    `size × size` window centered on it (longitudes wrap, polar rows are skipped) and,
//!    when `threshold > 0`, it lies more than `threshold` below the 9th smallest value of
//!    the window (for maxima, more than `threshold` above the window minimum).
//! 3. [`laplace`]: clusters of raw extrema are reduced to the cell with the strongest
//!    Laplacian magnitude of its neighbourhood.
//! 4. Surviving cells are emitted as [`Center`]s in row-major order with their original
//!    (unfilled) value.
//!
//! Entry points
//! -----------------
//! * [`detect_frame`] – one frame already in memory.
//! * [`detect`] – every frame of an opened [`GridSource`], read in chunks of
//!   [`DetectParams::chart_buffer`] frames.
//!
//! Example
//! -----------------
//! ```rust,no_run
//! use stormtrack::detection::{detect, DetectParams, ExtremaMode};
//! use stormtrack::grid::{json_grid::JsonGrid, GridSession};
//!
//! # fn run() -> Result<(), stormtrack::storm_errors::StormError> {
//! let params = DetectParams::builder()
//!     .size(5)
//!     .threshold(0.0)
//!     .mode(ExtremaMode::Minimum)
//!     .build()?;
//!
//! let mut grid = JsonGrid::new("slp.2012.json", "slp");
//! let session = GridSession::open(&mut grid)?;
//! let frames = detect(&*session, &params)?;
//! # Ok(()) }
//! ```
pub mod extrema_filter;
pub mod laplace;

use std::{fmt, str::FromStr};

use itertools::iproduct;
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    centers::{Center, DetectedFrame},
    constants::{Degree, Timestamp, DEFAULT_CHART_BUFFER, DEFAULT_WINDOW_SIZE},
    grid::{Frame, GridSource},
    storm_errors::StormError,
};

use extrema_filter::local_extrema_filter;
use laplace::remove_dup_laplace;

/// Which kind of extremum is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremaMode {
    /// Pressure lows (cyclones).
    #[default]
    #[serde(alias = "min")]
    Minimum,
    /// Pressure highs (anticyclones).
    #[serde(alias = "max")]
    Maximum,
}

impl ExtremaMode {
    /// Value substituted to missing cells so they never win the window test.
    pub fn fill_value(&self) -> f64 {
        match self {
            ExtremaMode::Minimum => f64::INFINITY,
            ExtremaMode::Maximum => f64::NEG_INFINITY,
        }
    }
}

impl FromStr for ExtremaMode {
    type Err = StormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" | "minimum" => Ok(ExtremaMode::Minimum),
            "max" | "maximum" => Ok(ExtremaMode::Maximum),
            other => Err(StormError::InvalidParameter(format!(
                "unknown extrema mode '{other}', expected 'min' or 'max'"
            ))),
        }
    }
}

impl fmt::Display for ExtremaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtremaMode::Minimum => write!(f, "min"),
            ExtremaMode::Maximum => write!(f, "max"),
        }
    }
}

/// Tuning of the detector.
///
/// Fields
/// -----------------
/// * `size` – edge length of the search window, odd and `>= 3` (default 5).
/// * `threshold` – minimal depth of an extremum in field units, `0` disables the depth
///   test (default `0.0`).
/// * `mode` – minima or maxima (default [`ExtremaMode::Minimum`]).
/// * `chart_buffer` – number of frames read from the source at once (default 400).
///
/// Build it with [`DetectParams::builder`] to get validation, or call
/// [`DetectParams::validate`] on a hand-made value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectParams {
    pub size: usize,
    pub threshold: f64,
    pub mode: ExtremaMode,
    pub chart_buffer: usize,
}

impl Default for DetectParams {
    fn default() -> Self {
        DetectParams {
            size: DEFAULT_WINDOW_SIZE,
            threshold: 0.0,
            mode: ExtremaMode::Minimum,
            chart_buffer: DEFAULT_CHART_BUFFER,
        }
    }
}

impl DetectParams {
    pub fn builder() -> DetectParamsBuilder {
        DetectParamsBuilder::new()
    }

    /// Check every field.
    ///
    /// Errors
    /// ----------
    /// * [`StormError::InvalidParameter`] for an even or `< 3` window size, a negative or
    ///   non-finite threshold, or a zero `chart_buffer`.
    pub fn validate(&self) -> Result<(), StormError> {
        if self.size < 3 || self.size % 2 == 0 {
            return Err(StormError::InvalidParameter(format!(
                "window size must be odd and >= 3, got {}",
                self.size
            )));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(StormError::InvalidParameter(format!(
                "threshold must be finite and non-negative, got {}",
                self.threshold
            )));
        }
        if self.chart_buffer == 0 {
            return Err(StormError::InvalidParameter(
                "chart_buffer must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DetectParamsBuilder {
    params: DetectParams,
}

impl DetectParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: DetectParams::default(),
        }
    }

    pub fn size(mut self, v: usize) -> Self {
        self.params.size = v;
        self
    }
    pub fn threshold(mut self, v: f64) -> Self {
        self.params.threshold = v;
        self
    }
    pub fn mode(mut self, v: ExtremaMode) -> Self {
        self.params.mode = v;
        self
    }
    pub fn chart_buffer(mut self, v: usize) -> Self {
        self.params.chart_buffer = v;
        self
    }

    /// Validate and return the parameters, see [`DetectParams::validate`].
    pub fn build(self) -> Result<DetectParams, StormError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

/// Detect the centers of a single frame.
///
/// Arguments
/// ---------
/// * `frame`: the field at time `time`, rows along `lat`, columns along `lon`
/// * `time`: time axis value stamped on every center
/// * `lat`, `lon`: grid coordinates in degrees
/// * `params`: detector tuning
///
/// Return
/// ------
/// * the centers of the frame in row-major order, possibly none.
///
/// Errors
/// ----------
/// * [`StormError::InvalidParameter`] if `params` does not validate.
/// * [`StormError::DimensionMismatch`] if the coordinates do not match the frame shape.
pub fn detect_frame(
    frame: &Frame,
    time: Timestamp,
    lat: &[Degree],
    lon: &[Degree],
    params: &DetectParams,
) -> Result<DetectedFrame, StormError> {
    params.validate()?;
    let (nrows, ncols) = frame.shape();
    if lat.len() != nrows || lon.len() != ncols {
        return Err(StormError::DimensionMismatch(format!(
            "frame is {nrows}x{ncols} but coordinates are {}x{}",
            lat.len(),
            lon.len()
        )));
    }

    let filled = frame.filled(params.mode.fill_value());
    let raw = local_extrema_filter(
        &filled,
        frame.valid(),
        params.size,
        params.threshold,
        params.mode,
    );
    let kept = remove_dup_laplace(&filled, &raw, params.size);

    let centers = iproduct!(0..nrows, 0..ncols)
        .filter(|&(i, j)| kept[(i, j)] && frame.is_valid(i, j))
        .map(|(i, j)| Center::new(time, lat[i], lon[j], frame.values()[(i, j)]))
        .collect();
    Ok(DetectedFrame::new(time, centers))
}

/// Detect the centers of every frame of an opened grid source.
///
/// Frames are pulled `params.chart_buffer` at a time so that only one chunk of the
/// partition is held in memory.
///
/// Return
/// ------
/// * one [`DetectedFrame`] per time step, in time order. A source with no frame
///   yields an empty vector.
///
/// Errors
/// ----------
/// * [`StormError::InvalidState`] if the source is not opened.
/// * any error of [`detect_frame`] or of the source reads.
pub fn detect<G: GridSource>(
    grid: &G,
    params: &DetectParams,
) -> Result<Vec<DetectedFrame>, StormError> {
    params.validate()?;
    if !grid.is_open() {
        return Err(StormError::InvalidState(
            "grid source must be opened before detection".into(),
        ));
    }
    let nframes = grid.num_frames();
    if nframes == 0 {
        return Ok(Vec::new());
    }

    let time = grid.times()?;
    let lat = grid.lat()?;
    let lon = grid.lon()?;

    #[cfg(feature = "progress")]
    let pb = {
        let pb = ProgressBar::new(nframes as u64);
        pb.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} frames | ETA {eta}")
                .expect("indicatif template"),
        );
        pb
    };

    let mut detected = Vec::with_capacity(nframes);
    let mut chunk: Vec<Frame> = Vec::new();
    for (it, &t) in time.iter().enumerate().take(nframes) {
        let ib = it % params.chart_buffer;
        if ib == 0 {
            chunk = grid.frames(it..(it + params.chart_buffer).min(nframes))?;
        }
        let frame = chunk.get(ib).ok_or(StormError::FrameOutOfBounds {
            index: it,
            len: nframes,
        })?;
        let frame_centers = detect_frame(frame, t, &lat, &lon, params)?;
        debug!(
            "Step {}/{}: found {} centers",
            it + 1,
            nframes,
            frame_centers.len()
        );
        detected.push(frame_centers);

        #[cfg(feature = "progress")]
        pb.inc(1);
    }

    #[cfg(feature = "progress")]
    pb.finish_and_clear();

    Ok(detected)
}
