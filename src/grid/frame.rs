use nalgebra::DMatrix;

use crate::storm_errors::StormError;

/// One time step of a gridded field.
///
/// Rows are latitudes, columns are longitudes. Every cell carries a validity flag; an
/// invalid (missing) cell keeps whatever number was stored in `values` but is never
/// reported as an extremum.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    values: DMatrix<f64>,
    valid: DMatrix<bool>,
}

impl Frame {
    /// Build a frame where every non-finite value (NaN, ±∞) is treated as missing.
    pub fn from_values(values: DMatrix<f64>) -> Self {
        let valid = values.map(f64::is_finite);
        Frame { values, valid }
    }

    /// Build a frame where cells equal to `fill_value`, as well as non-finite cells, are missing.
    pub fn with_fill_value(values: DMatrix<f64>, fill_value: f64) -> Self {
        let valid = values.map(|v| v.is_finite() && v != fill_value);
        Frame { values, valid }
    }

    /// Build a frame from explicit values and validity mask.
    pub fn with_mask(values: DMatrix<f64>, valid: DMatrix<bool>) -> Result<Self, StormError> {
        if values.shape() != valid.shape() {
            return Err(StormError::DimensionMismatch(format!(
                "values are {:?} but mask is {:?}",
                values.shape(),
                valid.shape()
            )));
        }
        Ok(Frame { values, valid })
    }

    /// Build a frame from row-major rows, `None` marking a missing cell.
    pub fn from_rows(rows: &[Vec<Option<f64>>]) -> Result<Self, StormError> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != ncols) {
            return Err(StormError::DimensionMismatch(format!(
                "row {bad} has {} columns, expected {ncols}",
                rows[bad].len()
            )));
        }
        let values = DMatrix::from_fn(nrows, ncols, |i, j| rows[i][j].unwrap_or(f64::NAN));
        Ok(Frame::from_values(values))
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn valid(&self) -> &DMatrix<bool> {
        &self.valid
    }

    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.valid[(row, col)]
    }

    /// `true` if at least one cell is missing.
    pub fn has_missing(&self) -> bool {
        self.valid.iter().any(|v| !v)
    }

    /// Copy of the values where every missing cell is replaced by `fill`.
    pub fn filled(&self, fill: f64) -> DMatrix<f64> {
        self.values
            .zip_map(&self.valid, |v, ok| if ok { v } else { fill })
    }
}
