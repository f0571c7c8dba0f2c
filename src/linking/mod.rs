//! # Linking centers into tracks
//!
//! [`Linker`] grows a [`TrackSet`] one [`DetectedFrame`] at a time and merges track sets
//! built over consecutive time ranges.
//!
//! Matching rule
//! -----------------
//! Open track ends and new centers are paired by mutual nearest neighbour over the
//! great-circle distance, discarding pairs at `threshold` km or more (see
//! [`matching`]). Ties between equidistant candidates go to the lowest index.
//!
//! Frame update ([`Linker::append_center`])
//! -----------------
//! * First frame of a set: every center opens a track listed in both `head` and `tail`.
//! * Later frames: a matched center continues its track, an unmatched one opens a new
//!   track. When the frame comes more than one frame interval after the previous one,
//!   every center opens a new track.
//! * `tail` becomes the tracks touched by the frame, `tend` the frame time, and the
//!   frame interval `dt` is recorded at the second frame.
//!
//! Merge ([`Linker::extend_track`])
//! -----------------
//! The tracks opened at the first frame of the later set are matched against the open
//! ends of the earlier set, continued tracks are concatenated and the others adopted.
//! Merging `a` with `b` gives the same tracks as linking the frames of `a` then `b`.
pub mod matching;

use std::collections::{HashMap, HashSet};

use ahash::RandomState;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    centers::{Center, DetectedFrame},
    constants::{Kilometer, DEFAULT_LINK_THRESHOLD},
    storm_errors::StormError,
    tracks::{Track, TrackSet},
};

use matching::mutual_nearest;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Linker {
    threshold: Kilometer,
}

impl Default for Linker {
    fn default() -> Self {
        Linker {
            threshold: DEFAULT_LINK_THRESHOLD,
        }
    }
}

impl Linker {
    /// Create a linker matching centers closer than `threshold` kilometers.
    ///
    /// Errors
    /// ----------
    /// * [`StormError::InvalidParameter`] if `threshold` is negative or not finite.
    pub fn new(threshold: Kilometer) -> Result<Self, StormError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(StormError::InvalidParameter(format!(
                "link threshold must be finite and non-negative, got {threshold}"
            )));
        }
        Ok(Linker { threshold })
    }

    pub fn threshold(&self) -> Kilometer {
        self.threshold
    }

    /// Match `centers` against the open ends of `tracks`.
    ///
    /// Return
    /// ------
    /// * for every center, the index in `tracks` of the track it continues, or `None`.
    pub fn match_center(
        &self,
        tracks: &TrackSet,
        centers: &[Center],
    ) -> Result<Vec<Option<usize>>, StormError> {
        let (open, ends): (Vec<usize>, Vec<Center>) = tracks
            .tail
            .iter()
            .filter_map(|&i| tracks.tracks[i].last().map(|c| (i, *c)))
            .unzip();
        let matches = mutual_nearest(&ends, centers, self.threshold)?;
        Ok(matches
            .into_iter()
            .map(|m| m.map(|end| open[end]))
            .collect())
    }

    /// Append the centers of the next frame to `tracks`.
    ///
    /// Frames must be fed in increasing time order. A center appended to a track whose
    /// last center is not older is dropped without error, see [`Track::push`].
    pub fn append_center(
        &self,
        tracks: &mut TrackSet,
        frame: &DetectedFrame,
    ) -> Result<(), StormError> {
        let time = frame.time;

        let Some(tstart) = tracks.tstart else {
            for center in &frame.centers {
                let index = tracks.open_track(Track::from_center(*center));
                tracks.head.push(index);
                tracks.tail.push(index);
            }
            tracks.tstart = Some(time);
            tracks.tend = Some(time);
            return Ok(());
        };

        let gap = match (tracks.dt, tracks.tend) {
            (Some(dt), Some(tend)) => time - dt > tend,
            _ => false,
        };
        let matches = self.match_center(tracks, &frame.centers)?;

        let mut tail = Vec::with_capacity(frame.len());
        for (center, matched) in frame.centers.iter().zip(matches) {
            let index = match matched {
                Some(index) if !gap => {
                    tracks.tracks[index].push(*center);
                    index
                }
                _ => tracks.open_track(Track::from_center(*center)),
            };
            tail.push(index);
        }

        tracks.tail = tail;
        tracks.tend = Some(time);
        if tracks.dt.is_none() {
            tracks.dt = Some(time - tstart);
        }
        Ok(())
    }

    /// Link a sequence of frames into a fresh track set.
    pub fn link(&self, frames: &[DetectedFrame]) -> Result<TrackSet, StormError> {
        let mut tracks = TrackSet::new();
        for frame in frames {
            self.append_center(&mut tracks, frame)?;
        }
        Ok(tracks)
    }

    /// Match the first center of every head track of `b` against the open ends of `a`.
    ///
    /// Return
    /// ------
    /// * one entry per `b.head()` track, in `head` order: the index in `a` of the track
    ///   it continues, or `None`.
    pub fn match_track(&self, a: &TrackSet, b: &TrackSet) -> Result<Vec<Option<usize>>, StormError> {
        self.match_center(a, &b.head_starts())
    }

    /// Merge `b`, built over the time range right after the one of `a`, into `a`.
    ///
    /// An empty `b` leaves `a` unchanged and an empty `a` takes `b` as is. Otherwise the
    /// open tracks of the result are the tracks that were open in `b`, listed by
    /// increasing index.
    pub fn extend_track(&self, a: &mut TrackSet, b: TrackSet) -> Result<(), StormError> {
        let Some(b_start) = b.tstart else {
            return Ok(());
        };
        let Some(a_start) = a.tstart else {
            *a = b;
            return Ok(());
        };

        let (heads, starts): (Vec<usize>, Vec<Center>) = b
            .head
            .iter()
            .filter_map(|&i| b.tracks[i].first().map(|c| (i, *c)))
            .unzip();
        let continued: HashMap<usize, usize, RandomState> = heads
            .into_iter()
            .zip(self.match_center(a, &starts)?)
            .filter_map(|(ib, matched)| matched.map(|ia| (ib, ia)))
            .collect();
        let open: HashSet<usize, RandomState> = b.tail.iter().copied().collect();

        let mut tail = Vec::with_capacity(open.len());
        let mut dropped = 0;
        for (ib, track) in b.tracks.into_iter().enumerate() {
            let ia = match continued.get(&ib) {
                Some(&ia) => {
                    dropped += a.tracks[ia].append_track(track);
                    ia
                }
                None => a.open_track(track),
            };
            if open.contains(&ib) {
                tail.push(ia);
            }
        }
        tail.sort_unstable();

        if dropped > 0 {
            warn!("merge dropped {dropped} out-of-order centers");
        }

        a.tail = tail;
        a.tend = b.tend;
        if a.dt.is_none() {
            a.dt = Some(b_start - a_start);
        }
        Ok(())
    }
}
