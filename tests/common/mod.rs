#![allow(dead_code)]

use nalgebra::DMatrix;
use stormtrack::{Center, DetectedFrame, Frame, GridData, MemoryGrid, TimeUnits};

pub const NLAT: usize = 37;
pub const NLON: usize = 72;
pub const STEP_HOURS: f64 = 6.0;
pub const BACKGROUND: f64 = 1010.0;

/// 5° global grid, latitudes from 90 to -90.
pub fn lat() -> Vec<f64> {
    (0..NLAT).map(|i| 90.0 - 5.0 * i as f64).collect()
}

pub fn lon() -> Vec<f64> {
    (0..NLON).map(|j| 5.0 * j as f64).collect()
}

/// A synthetic low of `depth` centered on grid cell `(row, col)`.
#[derive(Debug, Clone, Copy)]
pub struct Low {
    pub row: usize,
    pub col: usize,
    pub depth: f64,
}

/// Background field with Gaussian lows; longitude distance wraps around the globe.
pub fn field(nlat: usize, nlon: usize, lows: &[Low]) -> DMatrix<f64> {
    DMatrix::from_fn(nlat, nlon, |i, j| {
        lows.iter().fold(BACKGROUND, |acc, low| {
            let di = i as f64 - low.row as f64;
            let raw = (j as f64 - low.col as f64).abs();
            let dj = raw.min(nlon as f64 - raw);
            acc - low.depth * (-(di * di + dj * dj) / 4.5).exp()
        })
    })
}

/// Two lows drifting one cell east per frame, far apart from each other.
pub fn drifting_lows(t: usize) -> Vec<Low> {
    vec![
        Low {
            row: 10,
            col: (5 + t) % NLON,
            depth: 20.0,
        },
        Low {
            row: 25,
            col: (40 + t) % NLON,
            depth: 15.0,
        },
    ]
}

/// `nframes` six-hourly frames of [`drifting_lows`].
pub fn drifting_dataset(nframes: usize) -> GridData {
    let frames = (0..nframes)
        .map(|t| Frame::from_values(field(NLAT, NLON, &drifting_lows(t))))
        .collect();
    GridData::new(
        (0..nframes).map(|t| t as f64 * STEP_HOURS).collect(),
        lat(),
        lon(),
        frames,
    )
    .unwrap()
    .with_time_units(TimeUnits::parse("hours since 2012-01-01 00:00:00").unwrap())
}

pub fn drifting_grid(nframes: usize) -> MemoryGrid {
    MemoryGrid::new(drifting_dataset(nframes))
}

pub fn frame_of(time: f64, points: &[(f64, f64)]) -> DetectedFrame {
    DetectedFrame::new(
        time,
        points
            .iter()
            .map(|&(lat, lon)| Center::new(time, lat, lon, 1000.0))
            .collect(),
    )
}

/// Install a test logger once; later calls are no-ops.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
