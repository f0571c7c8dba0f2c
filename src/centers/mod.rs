//! # Storm centers
//!
//! A [`Center`] is one detected extremum: the time step of the frame it was found in,
//! the latitude/longitude of the grid cell, and the field value at that cell.
//! Centers are produced by [`detection`](crate::detection) and consumed, read-only, by
//! [`linking`](crate::linking).
//!
//! Distances between centers live in [`geodesic`].
pub mod geodesic;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    constants::{Degree, Kilometer, Timestamp},
    storm_errors::StormError,
};

/// One detected storm center.
///
/// # Fields
///
/// * `time` - Value of the grid time axis for the frame the center was detected in
/// * `lat` - Latitude of the grid cell in degrees
/// * `lon` - Longitude of the grid cell in degrees
/// * `value` - Field value at the grid cell (e.g. sea-level pressure). A non-finite
///   value is written as `null` and read back as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Center {
    time: Timestamp,
    lat: Degree,
    lon: Degree,
    #[serde(with = "finite_or_null")]
    value: f64,
}

mod finite_or_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

impl Center {
    pub fn new(time: Timestamp, lat: Degree, lon: Degree, value: f64) -> Self {
        Center {
            time,
            lat,
            lon,
            value,
        }
    }

    pub fn time(&self) -> Timestamp {
        self.time
    }

    pub fn lat(&self) -> Degree {
        self.lat
    }

    pub fn lon(&self) -> Degree {
        self.lon
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Check that the center can take part in distance computations.
    ///
    /// Return
    /// ------
    /// * `Ok(())` if `time` and `lon` are finite and `lat` is a finite value in `[-90, 90]`,
    ///   otherwise [`StormError::InvalidArgument`] describing the offending field.
    pub fn validate(&self) -> Result<(), StormError> {
        if !self.time.is_finite() {
            return Err(StormError::InvalidArgument(format!(
                "center time must be finite, got {}",
                self.time
            )));
        }
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(StormError::InvalidArgument(format!(
                "center latitude must be within [-90, 90], got {}",
                self.lat
            )));
        }
        if !self.lon.is_finite() {
            return Err(StormError::InvalidArgument(format!(
                "center longitude must be finite, got {}",
                self.lon
            )));
        }
        Ok(())
    }

    /// Great-circle distance to `other`, see [`geodesic::abs_dist`].
    pub fn abs_dist(&self, other: &Center) -> Result<Kilometer, StormError> {
        geodesic::abs_dist(self, other)
    }

    /// Signed north-south distance to `other`, see [`geodesic::lat_dist`].
    pub fn lat_dist(&self, other: &Center) -> Result<Kilometer, StormError> {
        geodesic::lat_dist(self, other)
    }

    /// Signed east-west distance to `other`, see [`geodesic::lon_dist`].
    pub fn lon_dist(&self, other: &Center) -> Result<Kilometer, StormError> {
        geodesic::lon_dist(self, other)
    }
}

impl fmt::Display for Center {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[time={}, lat={}, lon={}, value={}]",
            self.time, self.lat, self.lon, self.value
        )
    }
}

/// All centers detected in one frame, tagged with the frame time.
///
/// The time is carried separately from the centers so that a frame without any
/// detection still advances the bookkeeping of a [`TrackSet`](crate::tracks::TrackSet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFrame {
    pub time: Timestamp,
    pub centers: Vec<Center>,
}

impl DetectedFrame {
    pub fn new(time: Timestamp, centers: Vec<Center>) -> Self {
        DetectedFrame { time, centers }
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}
