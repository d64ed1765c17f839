use gridfill_formulas::{transform_for_copy, AdjustOptions, RefError};
use gridfill_primitives::CellAddress;

/// Rewrites the references of a generated formula for the cell it lands in.
pub trait FormulaAdjuster {
    fn adjust_references(
        &self,
        formula: &str,
        source: CellAddress,
        target: CellAddress,
        options: &AdjustOptions,
    ) -> Result<String, RefError>;
}

/// Adjusts formulas with the copy semantics of the formula transformer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformerAdjuster;

impl FormulaAdjuster for TransformerAdjuster {
    fn adjust_references(
        &self,
        formula: &str,
        source: CellAddress,
        target: CellAddress,
        options: &AdjustOptions,
    ) -> Result<String, RefError> {
        transform_for_copy(formula, source, target, options).map(|result| result.formula)
    }
}

/// Leaves formulas untouched. Every call logs a warning, since the filled
/// formulas will still point at the source cell's neighbours.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAdjuster;

impl FormulaAdjuster for NoopAdjuster {
    fn adjust_references(
        &self,
        formula: &str,
        source: CellAddress,
        target: CellAddress,
        _options: &AdjustOptions,
    ) -> Result<String, RefError> {
        tracing::warn!(
            "Formula copied from {} to {} without reference adjustment: {}",
            source,
            target,
            formula
        );
        Ok(formula.to_string())
    }
}
