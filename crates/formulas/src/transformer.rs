//! Whole-formula rewriting for copy and fill.
//!
//! The output is built in one ascending pass over the detected references:
//! text between references is copied verbatim and each reference is replaced
//! inline, so earlier offsets never need fixing up.

use gridfill_primitives::{CellAddress, FillDirection};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::adjuster::{adjust_for_copy, adjust_for_fill, AdjustOptions, AdjustmentResult};
use crate::detector::analyze_formula;
use crate::error::RefError;
use crate::reference::{stringify_cell_reference, CellReference};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformResult {
    pub formula: String,
    pub changed: bool,
    /// References whose text actually changed.
    pub adjusted_count: usize,
    /// Original text of every reference that was pinned to the sheet edge.
    pub clamped_references: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceChange {
    pub from: String,
    pub to: String,
    /// Byte offset of `from` in the original formula.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformPreview {
    pub original: String,
    pub transformed: String,
    pub changes: Vec<ReferenceChange>,
}

/// Rewrite `formula` as if the cell holding it were copied from `source` to
/// `target`. Any failing reference fails the whole rewrite.
pub fn transform_for_copy(
    formula: &str,
    source: CellAddress,
    target: CellAddress,
    options: &AdjustOptions,
) -> Result<TransformResult, RefError> {
    rewrite(formula, target, options, |reference| {
        adjust_for_copy(reference, source, target, options)
    })
    .map(|(result, _)| result)
}

/// Rewrite `formula` for a fill from `fill_start` into `fill_target`, moving
/// references along the fill axis only.
pub fn transform_for_fill(
    formula: &str,
    fill_start: CellAddress,
    fill_target: CellAddress,
    direction: FillDirection,
    options: &AdjustOptions,
) -> Result<TransformResult, RefError> {
    rewrite(formula, fill_target, options, |reference| {
        adjust_for_fill(reference, fill_start, fill_target, direction, options)
    })
    .map(|(result, _)| result)
}

/// Copy rewrite plus the list of references whose text changed.
pub fn preview_transformation(
    formula: &str,
    source: CellAddress,
    target: CellAddress,
    options: &AdjustOptions,
) -> Result<TransformPreview, RefError> {
    let (result, changes) = rewrite(formula, target, options, |reference| {
        adjust_for_copy(reference, source, target, options)
    })?;
    Ok(TransformPreview {
        original: formula.to_string(),
        transformed: result.formula,
        changes,
    })
}

fn rewrite<F>(
    formula: &str,
    written_to: CellAddress,
    options: &AdjustOptions,
    adjust: F,
) -> Result<(TransformResult, Vec<ReferenceChange>), RefError>
where
    F: Fn(&CellReference) -> Result<AdjustmentResult, RefError>,
{
    let analysis = analyze_formula(formula);
    let mut out = String::with_capacity(formula.len());
    let mut copied_to = 0;
    let mut clamped_references = Vec::new();
    let mut changes = Vec::new();

    for info in &analysis.references {
        let adjusted = adjust(&info.reference)?;
        if options.check_circular
            && adjusted.reference.sheet.is_none()
            && adjusted.reference.address() == written_to
        {
            return Err(RefError::circular(&info.text));
        }
        if adjusted.clamped {
            clamped_references.push(info.text.clone());
        }

        out.push_str(&formula[copied_to..info.position]);
        if adjusted.changed {
            // Keep the sheet prefix exactly as written.
            let prefix = info.text.rfind('!').map_or("", |bang| &info.text[..=bang]);
            let body = stringify_cell_reference(&CellReference {
                sheet: None,
                ..adjusted.reference
            });
            let replacement = format!("{prefix}{body}");
            trace!(
                from = %info.text,
                to = %replacement,
                position = info.position,
                "rewrote reference"
            );
            out.push_str(&replacement);
            changes.push(ReferenceChange {
                from: info.text.clone(),
                to: replacement,
                position: info.position,
            });
        } else {
            out.push_str(&info.text);
        }
        copied_to = info.end();
    }
    out.push_str(&formula[copied_to..]);

    let result = TransformResult {
        changed: !changes.is_empty(),
        adjusted_count: changes.len(),
        formula: out,
        clamped_references,
    };
    Ok((result, changes))
}
