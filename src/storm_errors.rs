use thiserror::Error;

#[derive(Error, Debug)]
pub enum StormError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Frame index {index} is out of bounds for a source of {len} frames")]
    FrameOutOfBounds { index: usize, len: usize },

    #[error("Invalid frame range {start}..{end}")]
    InvalidRange { start: usize, end: usize },

    #[error("Variable not found in grid file: {0}")]
    VariableNotFound(String),

    #[error("Grid dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Invalid time units: {0}")]
    InvalidTimeUnits(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON (de)serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Worker exchange failed: {0}")]
    Transport(String),
}

impl PartialEq for StormError {
    fn eq(&self, other: &Self) -> bool {
        use StormError::*;
        match (self, other) {
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (InvalidArgument(a), InvalidArgument(b)) => a == b,
            (InvalidState(a), InvalidState(b)) => a == b,
            (
                FrameOutOfBounds { index: i1, len: l1 },
                FrameOutOfBounds { index: i2, len: l2 },
            ) => i1 == i2 && l1 == l2,
            (InvalidRange { start: s1, end: e1 }, InvalidRange { start: s2, end: e2 }) => {
                s1 == s2 && e1 == e2
            }
            (VariableNotFound(a), VariableNotFound(b)) => a == b,
            (DimensionMismatch(a), DimensionMismatch(b)) => a == b,
            (InvalidTimeUnits(a), InvalidTimeUnits(b)) => a == b,
            (Transport(a), Transport(b)) => a == b,

            // wrapped library errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (JsonError(_), JsonError(_)) => true,

            _ => false,
        }
    }
}
