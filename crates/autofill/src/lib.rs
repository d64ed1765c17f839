//! # Gridfill Autofill
//!
//! Detects how a run of source cells continues (arithmetic and geometric
//! series, Fibonacci, dates, well-known integer sequences, month and weekday
//! names, numbered text) and generates the values for a fill. Formulas that
//! land in target cells have their references rewritten through a
//! [`FormulaAdjuster`].
//!
//! ```
//! use gridfill_autofill::{fill, FillOperation, MemoryGrid};
//! use gridfill_primitives::{CellAddress, CellRange, FillDirection, Value};
//!
//! let mut grid = MemoryGrid::new();
//! grid.set_column(CellAddress::new(0, 0), [1.0, 4.0, 9.0, 16.0].map(Value::from))
//!     .unwrap();
//!
//! let source = CellRange::from_a1("A1:A4").unwrap();
//! let op = FillOperation::adjacent(source, FillDirection::Down, 3).unwrap();
//! let result = fill(&op, &mut grid);
//!
//! assert!(result.success);
//! assert_eq!(result.filled_cells["A7"], Value::Number(49.0));
//! ```

pub mod adjuster;
pub mod config;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod fill;
pub mod pattern;
pub mod store;

pub use adjuster::{FormulaAdjuster, NoopAdjuster, TransformerAdjuster};
pub use config::{
    FillConfig, FillOptions, AMBIGUITY_PENALTY, AMBIGUITY_WINDOW, CONFIDENCE_FLOOR,
    MIN_CONFIDENCE,
};
pub use detectors::Detector;
pub use engine::{
    adjusted_confidence, ambiguity_score, generate_values, ordered_cells, PatternEngine,
};
pub use error::{ConfigError, FillError, GenerateError};
pub use fill::{fill, preview, FillOperation, FillPreview, FillResult, Filler};
pub use pattern::{Generator, Pattern, PatternDetectionResult, PatternType};
pub use store::{CellSink, CellSource, MemoryGrid};
