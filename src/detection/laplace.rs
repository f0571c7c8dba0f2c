//! Duplicate suppression of raw extrema.
//!
//! Neighbouring cells of one physical low (or high) frequently all pass the window test.
//! The cluster is reduced to the cell where the field curvature, measured by the discrete
//! Laplacian, is the strongest.
use itertools::iproduct;
use nalgebra::DMatrix;

use crate::detection::extrema_filter::wrap_col;

/// Five-point discrete Laplacian `up + down + left + right − 4·center`.
///
/// Longitudes wrap around; the first and last rows reuse their own value for the
/// missing neighbour.
pub(crate) fn laplacian(data: &DMatrix<f64>) -> DMatrix<f64> {
    let (nrows, ncols) = data.shape();
    DMatrix::from_fn(nrows, ncols, |i, j| {
        let up = data[(i.saturating_sub(1), j)];
        let down = data[((i + 1).min(nrows - 1), j)];
        let left = data[(i, wrap_col(j, -1, ncols))];
        let right = data[(i, wrap_col(j, 1, ncols))];
        up + down + left + right - 4.0 * data[(i, j)]
    })
}

/// Keep, within every `size × size` neighbourhood, only the raw extremum with the
/// largest Laplacian magnitude.
///
/// A candidate with a zero magnitude (flat plateau) is always dropped. When two
/// candidates of one neighbourhood share the largest magnitude, the one that comes
/// first in row-major order is kept.
///
/// Arguments
/// ---------
/// * `filled`: frame values with missing cells substituted (see
///   [`local_extrema_filter`](crate::detection::extrema_filter::local_extrema_filter))
/// * `mask`: raw extrema mask
/// * `size`: neighbourhood edge length
pub(crate) fn remove_dup_laplace(
    filled: &DMatrix<f64>,
    mask: &DMatrix<bool>,
    size: usize,
) -> DMatrix<bool> {
    let (nrows, ncols) = filled.shape();
    let half = (size / 2) as isize;

    let score = laplacian(filled).zip_map(mask, |l, m| if m { l.abs() } else { 0.0 });

    DMatrix::from_fn(nrows, ncols, |i, j| {
        let own = score[(i, j)];
        // also rejects NaN
        if !(own > 0.0) {
            return false;
        }
        let own_index = i * ncols + j;
        let rows = i.saturating_sub(half as usize)..=(i + half as usize).min(nrows - 1);

        !iproduct!(rows, -half..=half).any(|(wi, dj)| {
            let wj = wrap_col(j, dj, ncols);
            let other = score[(wi, wj)];
            let other_index = wi * ncols + wj;
            other > own || (other == own && other_index < own_index)
        })
    })
}
