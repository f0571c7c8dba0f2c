//! Sliding-window local extrema test.
//!
//! Every cell is compared with the `size × size` window centered on it. Columns
//! (longitudes) wrap around; rows (latitudes) do not, and the `size / 2` rows closest to
//! each pole are never candidates.
use itertools::iproduct;
use nalgebra::DMatrix;

use crate::{constants::DEPTH_RANK, detection::ExtremaMode};

/// Column index `j + offset`, wrapped around a row of `ncols` cells.
#[inline]
pub(crate) fn wrap_col(j: usize, offset: isize, ncols: usize) -> usize {
    (j as isize + offset).rem_euclid(ncols as isize) as usize
}

/// Decide whether `center` is a deep enough extremum of `window`.
///
/// `window` includes the center itself and is reordered by this function.
fn is_extremum(center: f64, window: &mut [f64], threshold: f64, mode: ExtremaMode) -> bool {
    let extreme = match mode {
        ExtremaMode::Minimum => window.iter().copied().fold(f64::INFINITY, f64::min),
        ExtremaMode::Maximum => window.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };
    if center != extreme {
        return false;
    }
    if threshold == 0.0 {
        return true;
    }

    window.sort_unstable_by(f64::total_cmp);
    let rank = DEPTH_RANK.min(window.len() - 1);
    match mode {
        ExtremaMode::Minimum => window[rank] - center > threshold,
        ExtremaMode::Maximum => center - window[0] > threshold,
    }
}

/// Raw extrema mask of a frame.
///
/// Arguments
/// ---------
/// * `filled`: frame values where missing cells were replaced by `+∞` (minimum search)
///   or `−∞` (maximum search)
/// * `valid`: validity mask of the frame; invalid cells are never candidates
/// * `size`: odd window edge length
/// * `threshold`: minimal depth, `0` disables the depth test
/// * `mode`: search for minima or maxima
///
/// Return
/// ------
/// * a boolean matrix of the frame shape, `true` on every raw extremum
pub(crate) fn local_extrema_filter(
    filled: &DMatrix<f64>,
    valid: &DMatrix<bool>,
    size: usize,
    threshold: f64,
    mode: ExtremaMode,
) -> DMatrix<bool> {
    let (nrows, ncols) = filled.shape();
    let half = size / 2;
    let mut out = DMatrix::from_element(nrows, ncols, false);
    if ncols == 0 || nrows < size {
        return out;
    }

    let offsets = -(half as isize)..=half as isize;
    let mut window = Vec::with_capacity(size * size);

    for (i, j) in iproduct!(half..nrows - half, 0..ncols) {
        if !valid[(i, j)] {
            continue;
        }
        window.clear();
        window.extend(
            iproduct!(i - half..=i + half, offsets.clone())
                .map(|(wi, dj)| filled[(wi, wrap_col(j, dj, ncols))]),
        );
        out[(i, j)] = is_extremum(filled[(i, j)], &mut window, threshold, mode);
    }
    out
}
