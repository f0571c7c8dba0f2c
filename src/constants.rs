//! # Constants and type definitions for stormtrack
//!
//! This module centralizes the **physical constants**, **default tuning values**, and
//! **unit type aliases** shared by detection, linking and merging.
//!
//! ## Overview
//!
//! - Geodesic constants (Earth radius, degrees ↔ radians)
//! - Defaults for the extrema detector and the frame linker
//! - Type aliases documenting the unit carried by a bare `f64`

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// Mean Earth radius used by the haversine distance, in kilometers
pub const EARTH_RADIUS: Kilometer = 6367.0;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

// -------------------------------------------------------------------------------------------------
// Detection and linking defaults
// -------------------------------------------------------------------------------------------------

/// Default edge length of the square search window (grid cells)
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Number of frames read from a grid source in one request
pub const DEFAULT_CHART_BUFFER: usize = 400;

/// Zero-based rank, in the sorted search window, that must clear the depth threshold
pub const DEPTH_RANK: usize = 8;

/// Default maximum distance between two consecutive centers of a track
pub const DEFAULT_LINK_THRESHOLD: Kilometer = 500.0;

/// Minimum number of centers for a track to be reported as a long track
pub const LONG_TRACK_MIN_LEN: usize = 8;

/// Minimum first-to-last displacement for a track to be reported as a long track
pub const LONG_TRACK_MIN_DISTANCE: Kilometer = 1000.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Numeric value of the grid time axis (units given by the source, e.g. hours since an epoch)
pub type Timestamp = f64;
