//! Mutual nearest neighbour assignment between open track ends and new centers.
//!
//! Only pairs closer than the linking threshold are candidates. A center is assigned to
//! an end when each is the other's nearest remaining candidate; both are then removed
//! and the scan is repeated until a full pass assigns nothing. Among equidistant
//! candidates the lowest index wins, so the result does not depend on hash order.
use std::collections::HashMap;

use ahash::RandomState;
use ordered_float::OrderedFloat;

use crate::{centers::Center, constants::Kilometer, storm_errors::StormError};

type Candidates = HashMap<usize, Kilometer, RandomState>;
type Adjacency = HashMap<usize, Candidates, RandomState>;

/// Nearest candidate, lowest index on ties.
fn nearest(candidates: &Candidates) -> Option<usize> {
    candidates
        .iter()
        .min_by_key(|(&index, &dist)| (OrderedFloat(dist), index))
        .map(|(&index, _)| index)
}

/// Remove `key` from `side` and every reference to it from the `other` side.
fn take_out(key: usize, side: &mut Adjacency, other: &mut Adjacency) {
    if let Some(candidates) = side.remove(&key) {
        for peer in candidates.keys() {
            if let Some(back) = other.get_mut(peer) {
                back.remove(&key);
            }
        }
    }
}

/// Assign `centers` to `ends`.
///
/// Arguments
/// ---------
/// * `ends`: last center of every open track
/// * `centers`: centers of the new frame
/// * `threshold`: strict upper bound on the great-circle distance of a match, in km
///
/// Return
/// ------
/// * for every center, the index in `ends` it was assigned to, or `None`.
///
/// Errors
/// ----------
/// * [`StormError::InvalidArgument`] if a compared center is invalid.
pub(crate) fn mutual_nearest(
    ends: &[Center],
    centers: &[Center],
    threshold: Kilometer,
) -> Result<Vec<Option<usize>>, StormError> {
    let mut forward = Adjacency::default();
    let mut backward = Adjacency::default();

    for (ie, end) in ends.iter().enumerate() {
        for (ic, center) in centers.iter().enumerate() {
            let dist = end.abs_dist(center)?;
            if dist < threshold {
                forward.entry(ie).or_default().insert(ic, dist);
                backward.entry(ic).or_default().insert(ie, dist);
            }
        }
    }

    let mut matches = vec![None; centers.len()];
    loop {
        let mut progressed = false;
        for ic in 0..centers.len() {
            let Some(ie) = backward.get(&ic).and_then(nearest) else {
                continue;
            };
            if forward.get(&ie).and_then(nearest) != Some(ic) {
                continue;
            }
            matches[ic] = Some(ie);
            progressed = true;
            take_out(ic, &mut backward, &mut forward);
            take_out(ie, &mut forward, &mut backward);
        }
        if !progressed {
            break;
        }
    }
    Ok(matches)
}
