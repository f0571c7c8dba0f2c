//! # Parallel execution and reduction
//!
//! The time axis is split into contiguous partitions, each tracked independently by one
//! worker. Partial track sets are then merged pairwise along a binary tree:
//!
//! ```text
//!  s = 2   0 <- 1   2 <- 3   4 <- 5   6
//!  s = 4   0 <----- 2        4 <----- 6
//!  s = 8   0 <-------------- 4
//! ```
//!
//! At step `s` a worker with `rank % s == s/2` sends its set to `rank - s/2` and stops;
//! a worker with `rank % s == 0` receives from `rank + s/2` (when it exists) and
//! merges it after its own set. The reduced set ends on rank 0 after `⌈log2(n)⌉` steps.
//!
//! Transfers go through the [`Exchange`] trait; [`channel_exchange::ChannelExchange`] is
//! the in-process implementation used by the threaded pipeline.
pub mod channel_exchange;

use log::info;
use serde::{Deserialize, Serialize};

use crate::{linking::Linker, storm_errors::StormError, tracks::TrackSet};

pub use channel_exchange::ChannelExchange;

/// How a [`StormTracker`](crate::storm_tracker::StormTracker) runs.
///
/// Serialized with a `kind` tag: `{"kind": "serial"}` or
/// `{"kind": "threaded", "workers": 4}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExecutionStrategy {
    /// A single partition on the calling thread.
    #[default]
    Serial,
    /// One partition per worker thread, merged by [`tree_reduce`].
    Threaded { workers: usize },
}

impl ExecutionStrategy {
    /// Number of partitions of the time axis.
    pub fn workers(&self) -> usize {
        match self {
            ExecutionStrategy::Serial => 1,
            ExecutionStrategy::Threaded { workers } => *workers,
        }
    }

    pub fn validate(&self) -> Result<(), StormError> {
        if self.workers() == 0 {
            return Err(StormError::InvalidParameter(
                "threaded execution needs at least one worker".into(),
            ));
        }
        Ok(())
    }
}

/// Blocking point-to-point transfer of track sets between ranks of a worker group.
pub trait Exchange {
    fn rank(&self) -> usize;

    /// Number of ranks of the group.
    fn size(&self) -> usize;

    /// Hand `tracks` over to `dest`. Does not wait for the matching `recv`.
    fn send(&self, dest: usize, tag: usize, tracks: TrackSet) -> Result<(), StormError>;

    /// Wait for the set sent by `source` with `tag`.
    fn recv(&self, source: usize, tag: usize) -> Result<TrackSet, StormError>;
}

/// Merge the partial sets of every rank of `exchange` into rank 0.
///
/// Arguments
/// ---------
/// * `exchange`: endpoint of the calling rank
/// * `linker`: linker used for every merge step
/// * `tracks`: track set of the calling rank's partition
///
/// Return
/// ------
/// * `Some(merged)` on rank 0, `None` on every other rank once its set was sent.
pub fn tree_reduce<E: Exchange>(
    exchange: &E,
    linker: &Linker,
    tracks: TrackSet,
) -> Result<Option<TrackSet>, StormError> {
    let rank = exchange.rank();
    let size = exchange.size();
    let mut tracks = tracks;

    let mut step = 2;
    while step / 2 < size {
        let half = step / 2;
        if rank % step == half {
            exchange.send(rank - half, step, tracks)?;
            return Ok(None);
        }
        if rank % step == 0 && rank + half < size {
            let right = exchange.recv(rank + half, step)?;
            linker.extend_track(&mut tracks, right)?;
            info!(
                "rank {rank}: merged rank {} at step {step} ({} tracks)",
                rank + half,
                tracks.len()
            );
        }
        step *= 2;
    }
    Ok(Some(tracks))
}

/// Merge partial sets of consecutive partitions left to right.
pub fn merge_sequential(
    linker: &Linker,
    parts: impl IntoIterator<Item = TrackSet>,
) -> Result<TrackSet, StormError> {
    let mut merged = TrackSet::new();
    for part in parts {
        linker.extend_track(&mut merged, part)?;
    }
    Ok(merged)
}
