//! JSON file [`GridSource`] backend.
//!
//! [`JsonGrid`] is configured with a path and a variable name only; the file is read on
//! [`GridSource::open`] and released on [`GridSource::close`]. The expected document is
//!
//! ```json
//! {
//!   "time": [0.0, 6.0],
//!   "time_units": "hours since 1800-01-01 00:00:0.0",
//!   "lat": [90.0, 87.5],
//!   "lon": [0.0, 2.5],
//!   "fill_value": -9999.0,
//!   "variables": { "slp": [[[101325.0, null], [101200.0, 101180.0]],
//!                          [[101320.0, 101310.0], [101190.0, 101170.0]]] }
//! }
//! ```
//!
//! with each variable laid out as `[time][lat][lon]`. `latitude` / `longitude` are
//! accepted for the coordinate names; `time_units` and `fill_value` are optional. A
//! `null` cell, or a cell equal to `fill_value`, is missing.
use std::{collections::HashMap, fs, ops::Range};

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use nalgebra::DMatrix;
use serde::Deserialize;

use crate::{
    constants::{Degree, Timestamp},
    grid::{check_frame_range, Frame, GridSource, TimeRange},
    storm_errors::StormError,
    time::TimeUnits,
};

#[derive(Debug, Deserialize)]
struct GridDocument {
    time: Vec<Timestamp>,
    #[serde(default)]
    time_units: Option<String>,
    #[serde(alias = "latitude")]
    lat: Vec<Degree>,
    #[serde(alias = "longitude")]
    lon: Vec<Degree>,
    #[serde(default)]
    fill_value: Option<f64>,
    variables: HashMap<String, Vec<Vec<Vec<Option<f64>>>>>,
}

#[derive(Debug, Deserialize)]
struct TimeAxisOnly {
    time: Vec<Timestamp>,
}

#[derive(Debug, Clone)]
struct LoadedGrid {
    time: Vec<Timestamp>,
    lat: Vec<Degree>,
    lon: Vec<Degree>,
    frames: Vec<Frame>,
    time_units: Option<TimeUnits>,
}

#[derive(Debug, Clone)]
pub struct JsonGrid {
    path: Utf8PathBuf,
    varname: String,
    trange: Option<TimeRange>,
    loaded: Option<LoadedGrid>,
}

impl JsonGrid {
    /// Configure a grid over the whole time axis. Nothing is read until [`GridSource::open`].
    pub fn new(path: impl Into<Utf8PathBuf>, varname: &str) -> Self {
        JsonGrid {
            path: path.into(),
            varname: varname.to_string(),
            trange: None,
            loaded: None,
        }
    }

    /// Restrict the grid to the absolute frame range `trange`.
    pub fn with_range(mut self, trange: TimeRange) -> Self {
        self.trange = Some(trange);
        self
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn varname(&self) -> &str {
        &self.varname
    }

    fn read_time_len(&self) -> Result<usize, StormError> {
        let text = fs::read_to_string(&self.path)?;
        let axis: TimeAxisOnly = serde_json::from_str(&text)?;
        Ok(axis.time.len())
    }

    fn loaded(&self) -> Result<&LoadedGrid, StormError> {
        self.loaded.as_ref().ok_or_else(|| {
            StormError::InvalidState(format!("grid file {} is not opened", self.path))
        })
    }

    fn load(&self) -> Result<LoadedGrid, StormError> {
        let text = fs::read_to_string(&self.path)?;
        let mut doc: GridDocument = serde_json::from_str(&text)?;

        let var = doc
            .variables
            .remove(&self.varname)
            .ok_or_else(|| StormError::VariableNotFound(self.varname.clone()))?;
        if var.len() != doc.time.len() {
            return Err(StormError::DimensionMismatch(format!(
                "variable {} has {} time steps, time axis has {}",
                self.varname,
                var.len(),
                doc.time.len()
            )));
        }

        let full = TimeRange::new(0, doc.time.len());
        let trange = self.trange.unwrap_or(full);
        let end = trange.end.min(full.end);
        let window = TimeRange::new(trange.start.min(end), end).as_range();

        let (nlat, nlon) = (doc.lat.len(), doc.lon.len());
        let mut frames = Vec::with_capacity(window.len());
        for (it, rows) in var[window.clone()].iter().enumerate() {
            if rows.len() != nlat || rows.iter().any(|r| r.len() != nlon) {
                return Err(StormError::DimensionMismatch(format!(
                    "time step {} of {} is not {nlat}x{nlon}",
                    window.start + it,
                    self.varname
                )));
            }
            let values = DMatrix::from_fn(nlat, nlon, |i, j| rows[i][j].unwrap_or(f64::NAN));
            frames.push(match doc.fill_value {
                Some(fill) => Frame::with_fill_value(values, fill),
                None => Frame::from_values(values),
            });
        }

        let time_units = doc
            .time_units
            .as_deref()
            .map(TimeUnits::parse)
            .transpose()?;

        Ok(LoadedGrid {
            time: doc.time[window].to_vec(),
            lat: doc.lat,
            lon: doc.lon,
            frames,
            time_units,
        })
    }
}

impl GridSource for JsonGrid {
    fn open(&mut self) -> Result<(), StormError> {
        if self.loaded.is_none() {
            let loaded = self.load()?;
            debug!(
                "opened {} ({}: {} frames of {}x{})",
                self.path,
                self.varname,
                loaded.frames.len(),
                loaded.lat.len(),
                loaded.lon.len()
            );
            self.loaded = Some(loaded);
        }
        Ok(())
    }

    fn close(&mut self) {
        self.loaded = None;
    }

    fn is_open(&self) -> bool {
        self.loaded.is_some()
    }

    /// Configured range, clamped to the file once opened. Before the first `open`, a grid
    /// created without an explicit range reports an empty range.
    fn time_range(&self) -> TimeRange {
        match (&self.loaded, self.trange) {
            (Some(loaded), Some(r)) => TimeRange::new(r.start, r.start + loaded.time.len()),
            (Some(loaded), None) => TimeRange::new(0, loaded.time.len()),
            (None, Some(r)) => r,
            (None, None) => TimeRange::new(0, 0),
        }
    }

    fn frames(&self, range: Range<usize>) -> Result<Vec<Frame>, StormError> {
        let loaded = self.loaded()?;
        check_frame_range(&range, loaded.frames.len())?;
        Ok(loaded.frames[range].to_vec())
    }

    fn times(&self) -> Result<Vec<Timestamp>, StormError> {
        Ok(self.loaded()?.time.clone())
    }

    fn lat(&self) -> Result<Vec<Degree>, StormError> {
        Ok(self.loaded()?.lat.clone())
    }

    fn lon(&self) -> Result<Vec<Degree>, StormError> {
        Ok(self.loaded()?.lon.clone())
    }

    fn time_units(&self) -> Option<&TimeUnits> {
        self.loaded.as_ref().and_then(|l| l.time_units.as_ref())
    }

    fn split(&self, num: usize) -> Result<Vec<Self>, StormError> {
        if self.is_open() {
            return Err(StormError::InvalidState(
                "JsonGrid must not be opened before split".into(),
            ));
        }
        let base = match self.trange {
            Some(r) => r,
            None => TimeRange::new(0, self.read_time_len()?),
        };
        Ok(base
            .split(num)?
            .into_iter()
            .map(|r| JsonGrid::new(self.path.clone(), &self.varname).with_range(r))
            .collect())
    }
}
