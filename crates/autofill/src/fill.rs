//! Fill API: validate an operation, detect a pattern per lane and write the
//! generated values.
//!
//! A lane is one column of a vertical fill or one row of a horizontal fill.
//! Each lane is detected and generated on its own, so a two-column source of
//! `1, 2` next to `Mon, Tue` continues both series.

use gridfill_formulas::AdjustOptions;
use gridfill_primitives::{CellAddress, CellRange, FillDirection, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adjuster::{FormulaAdjuster, TransformerAdjuster};
use crate::config::{FillConfig, FillOptions};
use crate::engine::{generate_values, ordered_cells, PatternEngine};
use crate::error::{FillError, Result};
use crate::pattern::{Pattern, PatternDetectionResult};
use crate::store::{CellSink, CellSource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillOperation {
    pub source: CellRange,
    pub target: CellRange,
    pub direction: FillDirection,
    #[serde(default)]
    pub options: FillOptions,
}

impl FillOperation {
    pub fn new(source: CellRange, target: CellRange, direction: FillDirection) -> Self {
        Self {
            source,
            target,
            direction,
            options: FillOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FillOptions) -> Self {
        self.options = options;
        self
    }

    /// Target of `count` cells (per lane) directly next to `source` in
    /// `direction`. `None` if it would leave the sheet.
    pub fn adjacent(source: CellRange, direction: FillDirection, count: u32) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let span = i64::from(count);
        let (start, end) = match direction {
            FillDirection::Down => (
                source.start.offset(i64::from(source.rows()), 0)?,
                source.end.offset(span, 0)?,
            ),
            FillDirection::Up => (
                source.start.offset(-span, 0)?,
                source.end.offset(-i64::from(source.rows()), 0)?,
            ),
            FillDirection::Right => (
                source.start.offset(0, i64::from(source.cols()))?,
                source.end.offset(0, span)?,
            ),
            FillDirection::Left => (
                source.start.offset(0, -span)?,
                source.end.offset(0, -i64::from(source.cols()))?,
            ),
        };
        Some(Self::new(source, CellRange::new(start, end), direction))
    }

    fn validate(&self) -> Result<()> {
        let (source, target) = (&self.source, &self.target);
        if source.intersects(target) {
            return Err(FillError::Overlap {
                origin: *source,
                target: *target,
            });
        }
        let (aligned, outward) = match self.direction {
            FillDirection::Down | FillDirection::Up => (
                target.start.col == source.start.col && target.end.col == source.end.col,
                if self.direction == FillDirection::Down {
                    target.start.row > source.end.row
                } else {
                    target.end.row < source.start.row
                },
            ),
            FillDirection::Left | FillDirection::Right => (
                target.start.row == source.start.row && target.end.row == source.end.row,
                if self.direction == FillDirection::Right {
                    target.start.col > source.end.col
                } else {
                    target.end.col < source.start.col
                },
            ),
        };
        if !aligned {
            let axis = if self.direction.is_vertical() {
                "columns"
            } else {
                "rows"
            };
            return Err(FillError::InvalidTarget(format!(
                "{target} must span the same {axis} as {source}"
            )));
        }
        if !outward {
            return Err(FillError::InvalidTarget(format!(
                "{target} does not lie {} of {source}",
                match self.direction {
                    FillDirection::Down => "below",
                    FillDirection::Up => "above",
                    FillDirection::Left => "left",
                    FillDirection::Right => "right",
                }
            )));
        }
        Ok(())
    }

    /// `(source, target)` ranges of each lane, in sheet order.
    fn lanes(&self) -> Vec<(CellRange, CellRange)> {
        let (source, target) = (&self.source, &self.target);
        if self.direction.is_vertical() {
            (source.start.col..=source.end.col)
                .map(|col| {
                    (
                        CellRange::new(
                            CellAddress::new(source.start.row, col),
                            CellAddress::new(source.end.row, col),
                        ),
                        CellRange::new(
                            CellAddress::new(target.start.row, col),
                            CellAddress::new(target.end.row, col),
                        ),
                    )
                })
                .collect()
        } else {
            (source.start.row..=source.end.row)
                .map(|row| {
                    (
                        CellRange::new(
                            CellAddress::new(row, source.start.col),
                            CellAddress::new(row, source.end.col),
                        ),
                        CellRange::new(
                            CellAddress::new(row, target.start.col),
                            CellAddress::new(row, target.end.col),
                        ),
                    )
                })
                .collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResult {
    pub success: bool,
    /// A1 address to written value, in generation order.
    pub filled_cells: IndexMap<String, Value>,
    pub pattern: Option<Pattern>,
    pub error: Option<String>,
}

impl FillResult {
    fn failure(error: &FillError) -> Self {
        Self {
            success: false,
            filled_cells: IndexMap::new(),
            pattern: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillPreview {
    pub values: IndexMap<String, Value>,
    pub pattern: Option<Pattern>,
    pub alternative_patterns: Vec<Pattern>,
    pub ambiguity_score: f64,
    pub confidence: f64,
}

struct Plan {
    values: Vec<(CellAddress, Value)>,
    detection: PatternDetectionResult,
}

/// Runs fill operations with a fixed engine configuration and formula
/// adjuster.
#[derive(Debug, Clone)]
pub struct Filler<A = TransformerAdjuster> {
    engine: PatternEngine,
    adjuster: A,
}

impl Default for Filler {
    fn default() -> Self {
        Self::new(FillConfig::default())
    }
}

impl Filler {
    pub fn new(config: FillConfig) -> Self {
        Self::with_adjuster(config, TransformerAdjuster)
    }
}

impl<A: FormulaAdjuster> Filler<A> {
    pub fn with_adjuster(config: FillConfig, adjuster: A) -> Self {
        Self {
            engine: PatternEngine::new(config),
            adjuster,
        }
    }

    pub fn engine(&self) -> &PatternEngine {
        &self.engine
    }

    /// Generate and write the target cells. On failure nothing is written.
    pub fn fill<S>(&self, operation: &FillOperation, store: &mut S) -> FillResult
    where
        S: CellSource + CellSink + ?Sized,
    {
        let plan = match self.plan(operation, &*store) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!("Fill {} -> {} failed: {}", operation.source, operation.target, e);
                return FillResult::failure(&e);
            }
        };

        let mut filled_cells = IndexMap::with_capacity(plan.values.len());
        for (addr, value) in plan.values {
            filled_cells.insert(addr.to_a1(), value.clone());
            store.set(addr, value);
        }
        debug!(
            source = %operation.source,
            target = %operation.target,
            cells = filled_cells.len(),
            "fill applied"
        );
        FillResult {
            success: true,
            filled_cells,
            pattern: plan.detection.best_pattern,
            error: None,
        }
    }

    /// Values `fill` would write, without writing them.
    pub fn preview<S>(&self, operation: &FillOperation, source: &S) -> Result<FillPreview>
    where
        S: CellSource + ?Sized,
    {
        let plan = self.plan(operation, source)?;
        Ok(FillPreview {
            values: plan
                .values
                .into_iter()
                .map(|(addr, value)| (addr.to_a1(), value))
                .collect(),
            pattern: plan.detection.best_pattern,
            alternative_patterns: plan.detection.alternative_patterns,
            ambiguity_score: plan.detection.ambiguity_score,
            confidence: plan.detection.confidence,
        })
    }

    fn plan<S>(&self, operation: &FillOperation, source: &S) -> Result<Plan>
    where
        S: CellSource + ?Sized,
    {
        operation.validate()?;
        let adjust = AdjustOptions {
            clamp_to_bounds: operation.options.clamp_to_bounds,
            ..AdjustOptions::default()
        };

        let mut values = Vec::new();
        let mut reported: Option<PatternDetectionResult> = None;
        for (lane_source, lane_target) in operation.lanes() {
            let lane_values: Vec<Value> = ordered_cells(&lane_source, operation.direction)
                .iter()
                .map(|addr| source.get(addr))
                .collect();
            if lane_values.iter().all(Value::is_empty) {
                debug!(lane = %lane_source, "empty source lane left unfilled");
                continue;
            }

            let detection = self.detect_lane(operation, &lane_values)?;
            let Some(pattern) = &detection.best_pattern else {
                return Err(FillError::NoPattern);
            };
            values.extend(generate_values(
                &lane_values,
                pattern,
                &lane_source,
                &lane_target,
                operation.direction,
                &self.adjuster,
                &adjust,
            ));
            if reported.is_none() {
                reported = Some(detection);
            }
        }

        let detection = reported.ok_or(FillError::EmptySource(operation.source))?;
        Ok(Plan { values, detection })
    }

    fn detect_lane(
        &self,
        operation: &FillOperation,
        values: &[Value],
    ) -> Result<PatternDetectionResult> {
        let Some(forced) = operation.options.pattern else {
            return Ok(self.engine.select_pattern(values, operation.direction));
        };
        let pattern = self
            .engine
            .detect_with(forced, values, operation.direction)
            .ok_or(FillError::PatternMismatch(forced))?;
        Ok(PatternDetectionResult {
            confidence: pattern.confidence,
            raw_confidence: pattern.confidence,
            best_pattern: Some(pattern),
            ..PatternDetectionResult::default()
        })
    }
}

/// Fill with the default configuration and formula adjustment.
pub fn fill<S>(operation: &FillOperation, store: &mut S) -> FillResult
where
    S: CellSource + CellSink + ?Sized,
{
    Filler::default().fill(operation, store)
}

/// Preview with the default configuration and formula adjustment.
pub fn preview<S>(operation: &FillOperation, source: &S) -> Result<FillPreview>
where
    S: CellSource + ?Sized,
{
    Filler::default().preview(operation, source)
}
