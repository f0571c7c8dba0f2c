//! # Storm tracking pipeline
//!
//! [`StormTracker`] chains the three stages over a [`GridSource`]:
//!
//! 1. split the time axis into one partition per worker,
//! 2. on each partition, [`detect`] the centers of every frame and link them with
//!    [`Linker::append_center`](crate::linking::Linker::append_center),
//! 3. merge the partial track sets with [`tree_reduce`].
//!
//! Configuration
//! -----------------
//! [`TrackerConfig`] gathers the detector parameters, the linking threshold and the
//! [`ExecutionStrategy`]. It can be built in code or read from JSON, where every field
//! is optional:
//!
//! ```json
//! {
//!   "detect": { "size": 5, "threshold": 0.0, "mode": "min", "chart_buffer": 400 },
//!   "link_threshold": 500.0,
//!   "strategy": { "kind": "threaded", "workers": 4 }
//! }
//! ```
//!
//! Example
//! -----------------
//! ```rust,no_run
//! use stormtrack::{grid::json_grid::JsonGrid, StormTracker, TrackerConfig};
//!
//! # fn run() -> Result<(), stormtrack::storm_errors::StormError> {
//! let config = TrackerConfig::from_json_file("tracker.json")?;
//! let tracker = StormTracker::new(config)?;
//! let tracks = tracker.run(&JsonGrid::new("slp.2012.json", "slp"))?;
//! println!("{:#}", tracks.stats());
//! # Ok(()) }
//! ```
use std::{fs, thread};

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    centers::DetectedFrame,
    constants::{Kilometer, DEFAULT_LINK_THRESHOLD},
    detection::{detect, DetectParams},
    grid::{GridSession, GridSource},
    linking::Linker,
    parallel::{tree_reduce, ChannelExchange, ExecutionStrategy},
    storm_errors::StormError,
    tracks::TrackSet,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub detect: DetectParams,
    pub link_threshold: Kilometer,
    pub strategy: ExecutionStrategy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            detect: DetectParams::default(),
            link_threshold: DEFAULT_LINK_THRESHOLD,
            strategy: ExecutionStrategy::Serial,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), StormError> {
        self.detect.validate()?;
        Linker::new(self.link_threshold)?;
        self.strategy.validate()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, StormError> {
        let config: TrackerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Utf8Path>) -> Result<Self, StormError> {
        let text = fs::read_to_string(path.as_ref())?;
        TrackerConfig::from_json_str(&text)
    }
}

#[derive(Debug, Clone)]
pub struct StormTracker {
    config: TrackerConfig,
    linker: Linker,
}

impl StormTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, StormError> {
        config.validate()?;
        let linker = Linker::new(config.link_threshold)?;
        Ok(StormTracker { config, linker })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn linker(&self) -> &Linker {
        &self.linker
    }

    /// Link already detected frames into a track set.
    pub fn link_frames(&self, frames: &[DetectedFrame]) -> Result<TrackSet, StormError> {
        self.linker.link(frames)
    }

    /// Open `grid`, detect its centers and link them. The grid is closed on return.
    pub fn track_partition<G: GridSource>(&self, grid: &mut G) -> Result<TrackSet, StormError> {
        let session = GridSession::open(grid)?;
        let range = session.time_range();
        match (session.time_units(), session.times()?.first()) {
            (Some(units), Some(&t0)) => info!(
                "partition {}..{}: {} frames from {}",
                range.start,
                range.end,
                range.len(),
                units.to_epoch(t0)
            ),
            _ => info!(
                "partition {}..{}: {} frames",
                range.start,
                range.end,
                range.len()
            ),
        }

        let frames = detect(&*session, &self.config.detect)?;
        let tracks = self.link_frames(&frames)?;
        info!(
            "partition {}..{}: {}",
            range.start,
            range.end,
            tracks.stats()
        );
        Ok(tracks)
    }

    /// Track storms over the whole time range of `grid`.
    ///
    /// `grid` must not be opened: it is split into the partitions of the configured
    /// [`ExecutionStrategy`], and each partition is opened by its worker.
    pub fn run<G: GridSource + Send>(&self, grid: &G) -> Result<TrackSet, StormError> {
        match self.config.strategy {
            ExecutionStrategy::Serial => {
                let mut part = grid.split(1)?.into_iter().next().ok_or_else(|| {
                    StormError::InvalidState("grid split returned no partition".into())
                })?;
                self.track_partition(&mut part)
            }
            ExecutionStrategy::Threaded { workers } => self.run_threaded(grid, workers),
        }
    }

    fn run_threaded<G: GridSource + Send>(
        &self,
        grid: &G,
        workers: usize,
    ) -> Result<TrackSet, StormError> {
        let parts = grid.split(workers)?;
        let exchanges = ChannelExchange::group(parts.len());
        info!("tracking with {} worker threads", parts.len());

        let results: Vec<Result<Option<TrackSet>, StormError>> = thread::scope(|scope| {
            let handles: Vec<_> = parts
                .into_iter()
                .zip(exchanges)
                .map(|(mut part, exchange)| {
                    scope.spawn(move || -> Result<Option<TrackSet>, StormError> {
                        let local = self.track_partition(&mut part)?;
                        tree_reduce(&exchange, &self.linker, local)
                    })
                })
                .collect();
            handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(StormError::Transport(format!("worker {rank} panicked")))
                    })
                })
                .collect()
        });

        // a worker failure surfaces as transport errors on its peers: report the cause
        let mut merged = None;
        let mut transport = None;
        for result in results {
            match result {
                Ok(Some(tracks)) => merged = Some(tracks),
                Ok(None) => {}
                Err(err @ StormError::Transport(_)) => {
                    transport.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }
        if let Some(err) = transport {
            return Err(err);
        }
        merged.ok_or_else(|| StormError::InvalidState("no worker returned the merged track set".into()))
    }
}

#[cfg(test)]
mod storm_tracker_test {
    use super::*;
    use crate::detection::ExtremaMode;

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config = TrackerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, TrackerConfig::default());
    }

    #[test]
    fn test_config_from_json() {
        let config = TrackerConfig::from_json_str(
            r#"{
                "detect": { "size": 7, "mode": "max" },
                "link_threshold": 800.0,
                "strategy": { "kind": "threaded", "workers": 4 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.detect.size, 7);
        assert_eq!(config.detect.mode, ExtremaMode::Maximum);
        assert_eq!(config.detect.chart_buffer, 400);
        assert_eq!(config.link_threshold, 800.0);
        assert_eq!(config.strategy.workers(), 4);
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            TrackerConfig::from_json_str(r#"{"detect": {"size": 4}}"#),
            Err(StormError::InvalidParameter(_))
        ));
        assert!(matches!(
            TrackerConfig::from_json_str(r#"{"link_threshold": -3.0}"#),
            Err(StormError::InvalidParameter(_))
        ));
        assert!(matches!(
            TrackerConfig::from_json_str(r#"{"strategy": {"kind": "threaded", "workers": 0}}"#),
            Err(StormError::InvalidParameter(_))
        ));
        assert!(matches!(
            TrackerConfig::from_json_str("{ not json"),
            Err(StormError::JsonError(_))
        ));
    }
}
