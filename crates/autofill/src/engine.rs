//! Pattern selection and value generation.

use gridfill_formulas::AdjustOptions;
use gridfill_primitives::{CellAddress, CellRange, FillDirection, Value};
use tracing::debug;

use crate::adjuster::FormulaAdjuster;
use crate::config::FillConfig;
use crate::detectors::Detector;
use crate::pattern::{Pattern, PatternDetectionResult, PatternType};

/// Runs the enabled detectors in priority order and scores the results.
#[derive(Debug, Clone)]
pub struct PatternEngine {
    config: FillConfig,
    detectors: Vec<Detector>,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new(FillConfig::default())
    }
}

impl PatternEngine {
    pub fn new(config: FillConfig) -> Self {
        let detectors = Detector::ALL
            .into_iter()
            .filter(|d| config.is_enabled(d.pattern_type()))
            .collect();
        Self { config, detectors }
    }

    pub fn config(&self) -> &FillConfig {
        &self.config
    }

    /// Enabled detectors, highest priority first.
    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }

    /// Every qualifying pattern, best first. Ties keep detector priority
    /// order. `best_pattern` is `None` when nothing scores above
    /// `min_confidence`.
    pub fn detect_all_patterns(
        &self,
        values: &[Value],
        direction: FillDirection,
    ) -> PatternDetectionResult {
        let mut candidates: Vec<Pattern> = self
            .detectors
            .iter()
            .filter_map(|detector| detector.detect(values, direction))
            .filter(|pattern| pattern.confidence > self.config.min_confidence)
            .collect();
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        if candidates.is_empty() {
            debug!("no qualifying fill pattern");
            return PatternDetectionResult::default();
        }
        let best = candidates.remove(0);
        let ambiguity = candidates.first().map_or(0.0, |second| {
            ambiguity_score(
                best.confidence,
                second.confidence,
                self.config.ambiguity_window,
            )
        });
        let confidence = adjusted_confidence(
            best.confidence,
            ambiguity,
            self.config.ambiguity_penalty,
            self.config.confidence_floor,
        );
        debug!(
            pattern = %best.pattern_type,
            raw_confidence = best.confidence,
            confidence,
            ambiguity,
            alternatives = candidates.len(),
            "selected fill pattern"
        );

        PatternDetectionResult {
            raw_confidence: best.confidence,
            best_pattern: Some(best),
            alternative_patterns: candidates,
            ambiguity_score: ambiguity,
            confidence,
        }
    }

    /// Like [`Self::detect_all_patterns`], but falls back to repeating the
    /// source values when nothing qualifies and copy is enabled.
    pub fn select_pattern(
        &self,
        values: &[Value],
        direction: FillDirection,
    ) -> PatternDetectionResult {
        let detection = self.detect_all_patterns(values, direction);
        if detection.best_pattern.is_some() || !self.config.is_enabled(PatternType::Copy) {
            return detection;
        }
        match Detector::Copy.detect(values, direction) {
            Some(copy) => PatternDetectionResult {
                confidence: copy.confidence,
                raw_confidence: copy.confidence,
                best_pattern: Some(copy),
                ..PatternDetectionResult::default()
            },
            None => detection,
        }
    }

    /// Run one detector regardless of thresholds or the enabled set.
    pub fn detect_with(
        &self,
        pattern_type: PatternType,
        values: &[Value],
        direction: FillDirection,
    ) -> Option<Pattern> {
        Detector::for_type(pattern_type).detect(values, direction)
    }
}

/// 1 when the runner-up ties the winner, falling to 0 at a gap of `window`.
pub fn ambiguity_score(best: f64, second: f64, window: f64) -> f64 {
    (1.0 - (best - second) / window).clamp(0.0, 1.0)
}

pub fn adjusted_confidence(best: f64, ambiguity: f64, penalty: f64, floor: f64) -> f64 {
    (best - ambiguity * penalty).max(floor)
}

/// Cells of `range` ordered toward the fill: row-major, reversed for up and
/// left fills.
pub fn ordered_cells(range: &CellRange, direction: FillDirection) -> Vec<CellAddress> {
    let mut cells: Vec<CellAddress> = range.iter().collect();
    if direction.is_backward() {
        cells.reverse();
    }
    cells
}

/// Generate a value for every target cell, outward from the source.
///
/// `source_values` must follow [`ordered_cells`] order for `source_range`. A
/// cell whose value cannot be generated, or whose formula cannot be adjusted,
/// is logged and left out of the result; the remaining cells are unaffected.
pub fn generate_values(
    source_values: &[Value],
    pattern: &Pattern,
    source_range: &CellRange,
    target_range: &CellRange,
    direction: FillDirection,
    adjuster: &dyn FormulaAdjuster,
    options: &AdjustOptions,
) -> Vec<(CellAddress, Value)> {
    let sources = ordered_cells(source_range, direction);
    let targets = ordered_cells(target_range, direction);
    let mut out = Vec::with_capacity(targets.len());

    for (index, target) in targets.into_iter().enumerate() {
        let value = match pattern.generate(source_values, index) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Skipping {}: value generation failed: {}", target, e);
                continue;
            }
        };

        let value = match value {
            Value::Text(text) if text.starts_with('=') => {
                // Repeated formulas move relative to the cell they repeat.
                let origin = if pattern.pattern_type == PatternType::Copy && !sources.is_empty() {
                    sources[index % sources.len()]
                } else {
                    source_range.start
                };
                match adjuster.adjust_references(&text, origin, target, options) {
                    Ok(adjusted) => Value::Text(adjusted),
                    Err(e) => {
                        tracing::warn!("Skipping {}: formula adjustment failed: {}", target, e);
                        continue;
                    }
                }
            }
            other => other,
        };
        out.push((target, value));
    }
    out
}
