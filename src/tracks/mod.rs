//! # Tracks and track sets
//!
//! A [`Track`] is a time-ordered chain of [`Center`]s believed to be the same moving
//! storm. A [`TrackSet`] is the collection being built frame after frame by the
//! [`Linker`](crate::linking::Linker), together with the bookkeeping needed to extend it
//! with the next frame or to merge it with a track set built over a later time range.
//!
//! Data Model
//! -----------------
//! * **`tracks`** – every track ever opened, never removed.
//! * **`head`** – indices of the tracks opened at the first frame of the set. Only these
//!   tracks can continue a track of an earlier set when two sets are merged.
//! * **`tail`** – indices of the tracks that received a center in the most recent frame,
//!   the open frontier matched against the next frame.
//! * **`tstart` / `tend` / `dt`** – first frame time, latest frame time, and the frame
//!   interval inferred from the first two frames (frozen afterwards).
//!
//! Persistence
//! -----------------
//! [`TrackSet`] derives serde traits; [`TrackSet::to_json`] and [`TrackSet::from_json`]
//! round-trip every field losslessly. A missing center value is stored as `null` and
//! restored as NaN.
use std::{fmt, ops::Index};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    centers::Center,
    constants::{Kilometer, Timestamp},
    storm_errors::StormError,
};

/// A strictly time-increasing sequence of centers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    centers: SmallVec<[Center; 8]>,
}

impl Track {
    pub fn new() -> Self {
        Track::default()
    }

    /// Start a track from its first center.
    pub fn from_center(center: Center) -> Self {
        let mut track = Track::new();
        track.push(center);
        track
    }

    /// Append a center at the end of the track.
    ///
    /// A center whose time is not strictly greater than the time of the current last
    /// center is **silently dropped**: tracks are monotonic and callers must not feed
    /// out-of-order frames.
    ///
    /// Return
    /// ------
    /// * `true` if the center was appended, `false` if it was dropped.
    pub fn push(&mut self, center: Center) -> bool {
        match self.centers.last() {
            Some(last) if center.time() <= last.time() => false,
            _ => {
                self.centers.push(center);
                true
            }
        }
    }

    /// Append every center of `other` in order, applying the same drop rule as
    /// [`Track::push`] to each of them.
    ///
    /// Return
    /// ------
    /// * the number of centers that were dropped.
    pub fn append_track(&mut self, other: Track) -> usize {
        other
            .centers
            .into_iter()
            .filter(|c| !self.push(*c))
            .count()
    }

    pub fn first(&self) -> Option<&Center> {
        self.centers.first()
    }

    pub fn last(&self) -> Option<&Center> {
        self.centers.last()
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Center> {
        self.centers.iter()
    }

    pub fn as_slice(&self) -> &[Center] {
        &self.centers
    }

    /// Great-circle distance between the first and the last center.
    pub fn displacement(&self) -> Result<Kilometer, StormError> {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => first.abs_dist(last),
            _ => Ok(0.0),
        }
    }
}

impl Index<usize> for Track {
    type Output = Center;

    fn index(&self, index: usize) -> &Self::Output {
        &self.centers[index]
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a Center;
    type IntoIter = std::slice::Iter<'a, Center>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Center> for Track {
    /// Collect centers into a track; out-of-order centers are dropped as in [`Track::push`].
    fn from_iter<I: IntoIterator<Item = Center>>(iter: I) -> Self {
        let mut track = Track::new();
        for c in iter {
            track.push(c);
        }
        track
    }
}

/// The collection of tracks built by a [`Linker`](crate::linking::Linker).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSet {
    pub(crate) tracks: Vec<Track>,
    pub(crate) head: Vec<usize>,
    pub(crate) tail: Vec<usize>,
    pub(crate) tstart: Option<Timestamp>,
    pub(crate) tend: Option<Timestamp>,
    pub(crate) dt: Option<Timestamp>,
}

impl TrackSet {
    pub fn new() -> Self {
        TrackSet::default()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn head(&self) -> &[usize] {
        &self.head
    }

    pub fn tail(&self) -> &[usize] {
        &self.tail
    }

    pub fn tstart(&self) -> Option<Timestamp> {
        self.tstart
    }

    pub fn tend(&self) -> Option<Timestamp> {
        self.tend
    }

    pub fn dt(&self) -> Option<Timestamp> {
        self.dt
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// `true` if no frame has ever been appended to the set.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.tstart.is_none()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Last center of every open track, in `tail` order.
    pub fn open_ends(&self) -> Vec<Center> {
        self.tail
            .iter()
            .filter_map(|&i| self.tracks[i].last().copied())
            .collect()
    }

    /// First center of every track opened at the first frame, in `head` order.
    pub fn head_starts(&self) -> Vec<Center> {
        self.head
            .iter()
            .filter_map(|&i| self.tracks[i].first().copied())
            .collect()
    }

    /// Push a new track and return its index.
    pub(crate) fn open_track(&mut self, track: Track) -> usize {
        self.tracks.push(track);
        self.tracks.len() - 1
    }

    /// Count the tracks with at least `min_len` centers whose first and last centers
    /// are at least `min_distance` kilometers apart.
    ///
    /// The usual report uses [`LONG_TRACK_MIN_LEN`](crate::constants::LONG_TRACK_MIN_LEN)
    /// and [`LONG_TRACK_MIN_DISTANCE`](crate::constants::LONG_TRACK_MIN_DISTANCE).
    pub fn long_tracks(&self, min_len: usize, min_distance: Kilometer) -> Result<usize, StormError> {
        let mut count = 0;
        for track in self.tracks.iter().filter(|t| t.len() >= min_len) {
            if track.displacement()? >= min_distance {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Summary of the set, see [`TrackSetStats`].
    pub fn stats(&self) -> TrackSetStats {
        TrackSetStats {
            tracks: self.tracks.len(),
            centers: self.tracks.iter().map(Track::len).sum(),
            open: self.tail.len(),
            longest: self.tracks.iter().map(Track::len).max().unwrap_or(0),
        }
    }

    /// Serialize the whole set (tracks and bookkeeping) to a JSON string.
    pub fn to_json(&self) -> Result<String, StormError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a set previously written by [`TrackSet::to_json`].
    pub fn from_json(json: &str) -> Result<Self, StormError> {
        let set: TrackSet = serde_json::from_str(json)?;
        if let Some(&bad) = set
            .head
            .iter()
            .chain(set.tail.iter())
            .find(|&&i| i >= set.tracks.len())
        {
            return Err(StormError::InvalidState(format!(
                "track index {bad} out of range for a set of {} tracks",
                set.tracks.len()
            )));
        }
        if let Some(bad) = set
            .tracks
            .iter()
            .position(|t| !t.centers.windows(2).all(|w| w[0].time() < w[1].time()))
        {
            return Err(StormError::InvalidState(format!(
                "track {bad} is not strictly increasing in time"
            )));
        }
        Ok(set)
    }
}

impl Index<usize> for TrackSet {
    type Output = Track;

    fn index(&self, index: usize) -> &Self::Output {
        &self.tracks[index]
    }
}

impl<'a> IntoIterator for &'a TrackSet {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Summary counts of a [`TrackSet`].
///
/// Display
/// -----------------
/// * `format!("{}", stats)` – compact single line, e.g. `tracks=12, centers=80, open=3, longest=14`
/// * `format!("{:#}", stats)` – aligned multi-line table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSetStats {
    pub tracks: usize,
    pub centers: usize,
    pub open: usize,
    pub longest: usize,
}

impl fmt::Display for TrackSetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Track set summary")?;
            writeln!(f, "-----------------")?;
            writeln!(f, "tracks  : {}", self.tracks)?;
            writeln!(f, "centers : {}", self.centers)?;
            writeln!(f, "open    : {}", self.open)?;
            write!(f, "longest : {}", self.longest)
        } else {
            write!(
                f,
                "tracks={}, centers={}, open={}, longest={}",
                self.tracks, self.centers, self.open, self.longest
            )
        }
    }
}

#[cfg(test)]
mod tracks_test {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use smallvec::smallvec;

    #[test]
    fn test_track_set_init() {
        let t = TrackSet::new();
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        assert!(t.head().is_empty());
        assert!(t.tail().is_empty());
        assert_eq!(t.tstart(), None);
        assert_eq!(t.tend(), None);
        assert_eq!(t.dt(), None);
    }

    #[test]
    fn test_track_push_drops_out_of_order() {
        let mut track = Track::from_center(Center::new(1.0, 0.0, 0.0, 1.0));
        assert!(track.push(Center::new(2.0, 0.0, 0.0, 2.0)));
        assert!(!track.push(Center::new(2.0, 1.0, 1.0, 3.0)));
        assert!(!track.push(Center::new(0.5, 1.0, 1.0, 3.0)));
        assert_eq!(track.len(), 2);
        assert_eq!(track.last().unwrap().value(), 2.0);
    }

    #[test]
    fn test_append_track_counts_drops() {
        let mut a: Track = [0.0, 1.0, 2.0]
            .iter()
            .map(|&t| Center::new(t, 0.0, 0.0, 0.0))
            .collect();
        let b: Track = [2.0, 3.0, 4.0]
            .iter()
            .map(|&t| Center::new(t, 0.0, 0.0, 0.0))
            .collect();
        assert_eq!(a.append_track(b), 1);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_open_track_and_index() {
        let mut t = TrackSet::new();
        let c1 = Center::new(0.0, 0.0, 0.0, 0.0);
        let c2 = Center::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(t.open_track(Track::from_center(c1)), 0);
        assert_eq!(t.open_track(Track::from_center(c2)), 1);
        assert_eq!(t.len(), 2);
        assert_eq!(t[1][0], c2);
        let collected: Vec<&Track> = t.iter().collect();
        assert_eq!(collected.len(), 2);
    }

    #[test]
    fn test_stats_display() {
        let mut t = TrackSet::new();
        t.open_track((0..3).map(|i| Center::new(i as f64, 0.0, 0.0, 0.0)).collect());
        t.open_track(Track::from_center(Center::new(0.0, 5.0, 5.0, 0.0)));
        t.tail = vec![0];
        let stats = t.stats();
        assert_eq!(stats.tracks, 2);
        assert_eq!(stats.centers, 4);
        assert_eq!(stats.longest, 3);
        assert_eq!(stats.to_string(), "tracks=2, centers=4, open=1, longest=3");
        assert!(format!("{stats:#}").starts_with("Track set summary"));
    }

    #[test]
    fn test_from_json_rejects_dangling_index() {
        let mut t = TrackSet::new();
        t.open_track(Track::from_center(Center::new(0.0, 0.0, 0.0, 0.0)));
        t.tail = vec![3];
        let json = t.to_json().unwrap();
        assert!(matches!(
            TrackSet::from_json(&json),
            Err(StormError::InvalidState(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_unordered_track() {
        let mut t = TrackSet::new();
        t.open_track(Track {
            centers: smallvec![
                Center::new(6.0, 0.0, 0.0, 0.0),
                Center::new(6.0, 1.0, 1.0, 0.0),
            ],
        });
        let json = t.to_json().unwrap();
        assert_eq!(
            TrackSet::from_json(&json),
            Err(StormError::InvalidState(
                "track 0 is not strictly increasing in time".into()
            ))
        );
    }

    #[test]
    fn test_json_round_trip_random_values() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut t = TrackSet::new();
        for _ in 0..20 {
            let mut time = rng.random_range(0.0..1e6);
            let mut track = Track::new();
            for _ in 0..10 {
                time += rng.random_range(1e-3..12.0);
                track.push(Center::new(
                    time,
                    rng.random_range(-90.0..90.0),
                    rng.random_range(0.0..360.0),
                    rng.random_range(900.0..1100.0),
                ));
            }
            let index = t.open_track(track);
            t.tail.push(index);
        }
        t.tstart = Some(rng.random_range(0.0..1e6));
        t.tend = Some(rng.random_range(0.0..1e6));
        t.dt = Some(rng.random_range(0.0..24.0));

        let restored = TrackSet::from_json(&t.to_json().unwrap()).unwrap();
        assert_eq!(restored, t);
    }

    #[test]
    fn test_json_round_trip_missing_value() {
        let mut t = TrackSet::new();
        let index = t.open_track(Track {
            centers: smallvec![
                Center::new(0.0, 10.0, 20.0, 1000.0),
                Center::new(6.0, 11.0, 21.0, f64::NAN),
            ],
        });
        t.head.push(index);

        let restored = TrackSet::from_json(&t.to_json().unwrap()).unwrap();
        let centers = restored[0].as_slice();
        assert_eq!(centers[0], t[0].as_slice()[0]);
        assert_eq!((centers[1].time(), centers[1].lat()), (6.0, 11.0));
        assert!(centers[1].value().is_nan());
        assert_eq!(restored.head, vec![0]);
    }
}
