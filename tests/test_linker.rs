mod common;

use stormtrack::{Center, DetectedFrame, Linker, TrackSet};

use common::frame_of;

fn c(time: f64, lat: f64, lon: f64, value: f64) -> Center {
    Center::new(time, lat, lon, value)
}

#[test]
fn test_append_center() {
    let linker = Linker::new(1000.0).unwrap();
    let mut tracks = TrackSet::new();

    let c1 = c(0.0, 0.0, 0.0, 1000.0);
    let c2 = c(0.0, 10.0, 10.0, 1000.0);
    linker
        .append_center(&mut tracks, &DetectedFrame::new(0.0, vec![c1, c2]))
        .unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks.head(), &[0, 1]);
    assert_eq!(tracks.tail(), &[0, 1]);
    assert_eq!(tracks.tstart(), Some(0.0));
    assert_eq!(tracks.tend(), Some(0.0));

    let c3 = c(1.0, 0.1, 0.1, 990.0);
    let c4 = c(1.0, 20.0, 20.0, 990.0);
    linker
        .append_center(&mut tracks, &DetectedFrame::new(1.0, vec![c3, c4]))
        .unwrap();
    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks[0].as_slice(), &[c1, c3]);
    assert_eq!(tracks[1].as_slice(), &[c2]);
    assert_eq!(tracks[2].as_slice(), &[c4]);
    assert_eq!(tracks.tail(), &[0, 2]);
    assert_eq!(tracks.tend(), Some(1.0));
    assert_eq!(tracks.dt(), Some(1.0));
}

#[test]
fn test_extend_track() {
    let linker = Linker::new(1000.0).unwrap();
    let c1 = c(0.0, 0.0, 0.0, 1000.0);
    let c2 = c(1.0, 0.1, 0.1, 990.0);

    let mut first = TrackSet::new();
    linker
        .append_center(&mut first, &DetectedFrame::new(0.0, vec![c1]))
        .unwrap();
    let mut second = TrackSet::new();
    linker
        .append_center(&mut second, &DetectedFrame::new(1.0, vec![c2]))
        .unwrap();

    linker.extend_track(&mut first, second).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].as_slice(), &[c1, c2]);
    assert_eq!(first.tail(), &[0]);
    assert_eq!(first.tend(), Some(1.0));
}

#[test]
fn test_nearest_neighbor() {
    let linker = Linker::new(1000.0).unwrap();
    let mut tracks = TrackSet::new();
    let c1 = c(0.0, 0.0, 0.0, 1000.0);
    let c2 = c(0.0, 10.0, 10.0, 1000.0);
    linker
        .append_center(&mut tracks, &DetectedFrame::new(0.0, vec![c1, c2]))
        .unwrap();

    let c3 = c(1.0, 0.01, 0.01, 990.0);
    let c4 = c(1.0, 10.01, 10.01, 990.0);
    linker
        .append_center(&mut tracks, &DetectedFrame::new(1.0, vec![c3, c4]))
        .unwrap();
    assert_eq!(tracks[0].as_slice(), &[c1, c3]);
    assert_eq!(tracks[1].as_slice(), &[c2, c4]);
}

#[test]
fn test_max_distance() {
    let linker = Linker::new(10.0).unwrap();
    let mut tracks = TrackSet::new();
    let c1 = c(0.0, 0.0, 0.0, 1000.0);
    let c2 = c(1.0, 1.0, 1.0, 990.0);
    linker
        .append_center(&mut tracks, &DetectedFrame::new(0.0, vec![c1]))
        .unwrap();
    linker
        .append_center(&mut tracks, &DetectedFrame::new(1.0, vec![c2]))
        .unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].as_slice(), &[c1]);
    assert_eq!(tracks[1].as_slice(), &[c2]);
}

#[test]
fn test_tracks_never_cross() {
    // two storms ~5000 km apart, each moving ~10 km per step
    let linker = Linker::new(1000.0).unwrap();
    let mut tracks = TrackSet::new();
    linker
        .append_center(&mut tracks, &frame_of(0.0, &[(0.0, 0.0), (0.0, 45.0)]))
        .unwrap();
    // centers listed in the opposite order of the open ends
    linker
        .append_center(&mut tracks, &frame_of(1.0, &[(0.0, 45.09), (0.0, 0.09)]))
        .unwrap();
    linker
        .append_center(&mut tracks, &frame_of(2.0, &[(0.0, 0.18), (0.0, 45.18)]))
        .unwrap();

    assert_eq!(tracks.len(), 2);
    assert!(tracks[0].iter().all(|c| c.lon() < 1.0));
    assert!(tracks[1].iter().all(|c| c.lon() > 44.0));
    assert_eq!(tracks.tail(), &[0, 1]);
}

#[test]
fn test_competing_centers_single_winner() {
    let linker = Linker::new(1000.0).unwrap();
    let mut tracks = TrackSet::new();
    linker
        .append_center(&mut tracks, &frame_of(0.0, &[(0.0, 0.0)]))
        .unwrap();
    linker
        .append_center(&mut tracks, &frame_of(1.0, &[(0.0, 2.0), (0.0, 1.0)]))
        .unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].last().unwrap().lon(), 1.0);
    assert_eq!(tracks[1].first().unwrap().lon(), 2.0);
    assert_eq!(tracks.tail(), &[1, 0]);
}

#[test]
fn test_zero_threshold_merge_keeps_every_track() {
    let linker = Linker::new(0.0).unwrap();
    let mut a = linker
        .link(&[frame_of(0.0, &[(0.0, 0.0), (20.0, 20.0)])])
        .unwrap();
    let b = linker
        .link(&[
            frame_of(1.0, &[(0.0, 0.0), (20.0, 20.0)]),
            frame_of(2.0, &[(0.0, 0.0)]),
        ])
        .unwrap();
    let (na, nb) = (a.len(), b.len());
    linker.extend_track(&mut a, b).unwrap();
    assert_eq!(a.len(), na + nb);
    assert_eq!(a.tend(), Some(2.0));
}

#[test]
fn test_merge_equals_sequential_linking() {
    let linker = Linker::default();
    let frames: Vec<DetectedFrame> = (0..6)
        .map(|t| {
            let t = t as f64;
            frame_of(t * 6.0, &[(40.0, 10.0 + 2.0 * t), (-35.0, 200.0 + 2.0 * t)])
        })
        .collect();

    let whole = linker.link(&frames).unwrap();
    let mut left = linker.link(&frames[..3]).unwrap();
    let right = linker.link(&frames[3..]).unwrap();
    linker.extend_track(&mut left, right).unwrap();

    assert_eq!(left.tracks(), whole.tracks());
    assert_eq!(left.head(), whole.head());
    assert_eq!(left.tail(), whole.tail());
    assert_eq!(left.tstart(), whole.tstart());
    assert_eq!(left.tend(), whole.tend());
    assert_eq!(left.dt(), whole.dt());
}
