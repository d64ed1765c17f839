use gridfill_primitives::{CellAddress, CellRange};
use thiserror::Error;

use crate::pattern::PatternType;

/// Failure to produce one generated value. Scoped to a single target cell.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error("{sequence} overflows at index {index}")]
    Overflow { sequence: &'static str, index: u64 },

    #[error("generated value is not a finite number")]
    NonFinite,

    #[error("date leaves the supported calendar range")]
    DateOutOfRange,

    #[error("no source values to repeat")]
    EmptySource,
}

/// Errors that fail a whole fill operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FillError {
    #[error("Target range {target} overlaps source range {origin}")]
    Overlap { origin: CellRange, target: CellRange },

    #[error("Invalid fill target: {0}")]
    InvalidTarget(String),

    #[error("Source range {0} has no values")]
    EmptySource(CellRange),

    #[error("The {0} pattern does not match the source values")]
    PatternMismatch(PatternType),

    #[error("No fill pattern found for the source values")]
    NoPattern,

    #[error("Values placed from {start} run past the last {axis}")]
    OutOfGrid {
        start: CellAddress,
        axis: &'static str,
    },
}

/// Errors loading or validating a [`crate::FillConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, FillError>;
