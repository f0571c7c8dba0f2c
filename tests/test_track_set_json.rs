mod common;

use std::io::Write;

use approx::assert_relative_eq;
use camino::Utf8PathBuf;
use hifitime::Epoch;
use stormtrack::{
    constants::{LONG_TRACK_MIN_DISTANCE, LONG_TRACK_MIN_LEN},
    ExecutionStrategy, GridSource, JsonGrid, StormTracker, TimeRange, TrackSet, TrackerConfig,
};

use common::{drifting_dataset, drifting_grid, init_logger};

fn tracked(nframes: usize) -> TrackSet {
    StormTracker::new(TrackerConfig::default())
        .unwrap()
        .run(&drifting_grid(nframes))
        .unwrap()
}

#[test]
fn test_json_round_trip_is_lossless() {
    let tracks = tracked(10);
    let json = tracks.to_json().unwrap();
    let restored = TrackSet::from_json(&json).unwrap();
    assert_eq!(restored, tracks);
    assert_eq!(restored.stats(), tracks.stats());
}

#[test]
fn test_long_tracks_report() {
    let tracks = tracked(12);
    // eleven 5° steps at 40°N and 35°S are both well over 1000 km
    assert_eq!(
        tracks
            .long_tracks(LONG_TRACK_MIN_LEN, LONG_TRACK_MIN_DISTANCE)
            .unwrap(),
        2
    );
    assert_eq!(tracks.long_tracks(13, 0.0).unwrap(), 0);

    let first = &tracks[0];
    assert_relative_eq!(first.first().unwrap().lat(), 40.0);
    assert!(first.displacement().unwrap() > LONG_TRACK_MIN_DISTANCE);
}

/// Write the drifting dataset in the JSON grid layout.
fn write_grid_file(nframes: usize) -> tempfile::NamedTempFile {
    let data = drifting_dataset(nframes);
    let slp: Vec<Vec<Vec<Option<f64>>>> = data
        .frames
        .iter()
        .map(|f| {
            (0..f.nrows())
                .map(|i| (0..f.ncols()).map(|j| Some(f.values()[(i, j)])).collect())
                .collect()
        })
        .collect();
    let doc = serde_json::json!({
        "time": data.time,
        "time_units": "hours since 2012-01-01 00:00:00",
        "lat": data.lat,
        "lon": data.lon,
        "variables": { "slp": slp },
    });
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(doc.to_string().as_bytes()).unwrap();
    file
}

#[test]
fn test_json_grid_pipeline_equals_memory_grid() {
    init_logger();
    let file = write_grid_file(8);
    let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf()).unwrap();

    let config = TrackerConfig::from_json_str(
        r#"{ "strategy": { "kind": "threaded", "workers": 3 } }"#,
    )
    .unwrap();
    assert_eq!(config.strategy, ExecutionStrategy::Threaded { workers: 3 });

    let from_file = StormTracker::new(config)
        .unwrap()
        .run(&JsonGrid::new(path.clone(), "slp"))
        .unwrap();
    assert_eq!(from_file, tracked(8));

    let mut grid = JsonGrid::new(path, "slp").with_range(TimeRange::new(4, 8));
    grid.open().unwrap();
    let units = grid.time_units().unwrap();
    assert_eq!(
        units.to_epoch(grid.times().unwrap()[0]),
        Epoch::from_gregorian_utc(2012, 1, 2, 0, 0, 0, 0)
    );
}

#[test]
fn test_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(br#"{"detect": {"threshold": 2.5}, "link_threshold": 750.0}"#)
        .unwrap();
    let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf()).unwrap();
    let config = TrackerConfig::from_json_file(&path).unwrap();
    assert_eq!(config.detect.threshold, 2.5);
    assert_eq!(config.link_threshold, 750.0);
    assert_eq!(config.strategy, ExecutionStrategy::Serial);
}
