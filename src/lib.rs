pub mod centers;
pub mod constants;
pub mod detection;
pub mod grid;
pub mod linking;
pub mod parallel;
pub mod storm_errors;
pub mod storm_tracker;
pub mod time;
pub mod tracks;

pub use centers::{Center, DetectedFrame};
pub use detection::{detect, detect_frame, DetectParams, ExtremaMode};
pub use grid::{
    json_grid::JsonGrid,
    memory_grid::{GridData, MemoryGrid},
    Frame, GridSession, GridSource, TimeRange,
};
pub use linking::Linker;
pub use parallel::{merge_sequential, tree_reduce, ChannelExchange, Exchange, ExecutionStrategy};
pub use storm_errors::StormError;
pub use storm_tracker::{StormTracker, TrackerConfig};
pub use time::TimeUnits;
pub use tracks::{Track, TrackSet, TrackSetStats};
