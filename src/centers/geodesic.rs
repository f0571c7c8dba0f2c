//! Distances between two [`Center`]s on a spherical Earth of radius
//! [`EARTH_RADIUS`](crate::constants::EARTH_RADIUS).
//!
//! All inputs are in degrees and all outputs in kilometers. Every function validates
//! both operands first and returns [`StormError::InvalidArgument`] for a center with
//! non-finite coordinates or a latitude outside `[-90, 90]`.
use crate::{
    centers::Center,
    constants::{Kilometer, EARTH_RADIUS, RADEG},
    storm_errors::StormError,
};

fn check_pair(a: &Center, b: &Center) -> Result<(), StormError> {
    a.validate()?;
    b.validate()
}

/// Haversine great-circle distance between two centers.
///
/// Arguments
/// ---------
/// * `a`, `b`: the two centers, lat/lon in degrees
///
/// Return
/// ------
/// * `2R·asin(sqrt(sin²(Δlat/2) + cos(lat_a)·cos(lat_b)·sin²(Δlon/2)))` in kilometers
pub fn abs_dist(a: &Center, b: &Center) -> Result<Kilometer, StormError> {
    check_pair(a, b)?;

    let half_dlat = (b.lat() - a.lat()) / 2.0 * RADEG;
    let half_dlon = (b.lon() - a.lon()) / 2.0 * RADEG;

    let h = half_dlat.sin().powi(2)
        + (a.lat() * RADEG).cos() * (b.lat() * RADEG).cos() * half_dlon.sin().powi(2);

    // rounding can push h slightly above 1 for antipodal points
    Ok(2.0 * EARTH_RADIUS * h.sqrt().min(1.0).asin())
}

/// Signed north-south distance `R·Δlat`, positive when `b` is north of `a`.
pub fn lat_dist(a: &Center, b: &Center) -> Result<Kilometer, StormError> {
    check_pair(a, b)?;
    Ok(EARTH_RADIUS * (b.lat() - a.lat()) * RADEG)
}

/// Signed east-west distance `R·Δlon·cos(mean latitude)`, positive when `b` is east of `a`.
pub fn lon_dist(a: &Center, b: &Center) -> Result<Kilometer, StormError> {
    check_pair(a, b)?;
    let mean_lat = (a.lat() + b.lat()) / 2.0;
    Ok(EARTH_RADIUS * (b.lon() - a.lon()) * RADEG * (mean_lat * RADEG).cos())
}
