//! Reference translation for copy and fill, plus `$`-toggling helpers used by
//! editing commands.

use gridfill_primitives::{CellAddress, FillDirection, MAX_COLUMN_INDEX, MAX_ROW_INDEX};
use serde::{Deserialize, Serialize};

use crate::detector::{find_reference_at_position, replace_reference_at_position, ReplaceResult};
use crate::error::RefError;
use crate::reference::{stringify_cell_reference, CellReference, RangeReference, ReferenceType};

/// Bounds and safety policy for reference adjustment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustOptions {
    /// Pin out-of-bounds coordinates to the sheet edge instead of failing.
    pub clamp_to_bounds: bool,
    /// Reject rewrites that leave a same-sheet reference pointing at the
    /// cell being written.
    pub check_circular: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentResult {
    pub reference: CellReference,
    pub changed: bool,
    pub clamped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeAdjustmentResult {
    pub range: RangeReference,
    pub changed: bool,
    pub clamped: bool,
}

/// Translate `reference` by `target - source` on every unlocked axis.
pub fn adjust_for_copy(
    reference: &CellReference,
    source: CellAddress,
    target: CellAddress,
    options: &AdjustOptions,
) -> Result<AdjustmentResult, RefError> {
    let col_delta = i64::from(target.col) - i64::from(source.col);
    let row_delta = i64::from(target.row) - i64::from(source.row);
    shift(reference, col_delta, row_delta, options)
}

/// Translate `reference` along the fill axis only: rows for up/down fills,
/// columns for left/right fills.
pub fn adjust_for_fill(
    reference: &CellReference,
    fill_start: CellAddress,
    fill_target: CellAddress,
    direction: FillDirection,
    options: &AdjustOptions,
) -> Result<AdjustmentResult, RefError> {
    let (col_delta, row_delta) = if direction.is_vertical() {
        (0, i64::from(fill_target.row) - i64::from(fill_start.row))
    } else {
        (i64::from(fill_target.col) - i64::from(fill_start.col), 0)
    };
    shift(reference, col_delta, row_delta, options)
}

/// Copy-adjust both corners, then re-normalize.
pub fn adjust_range_for_copy(
    range: &RangeReference,
    source: CellAddress,
    target: CellAddress,
    options: &AdjustOptions,
) -> Result<RangeAdjustmentResult, RefError> {
    let start = adjust_for_copy(&range.start, source, target, options)?;
    let end = adjust_for_copy(&range.end, source, target, options)?;
    Ok(RangeAdjustmentResult {
        range: RangeReference::new(start.reference, end.reference),
        changed: start.changed || end.changed,
        clamped: start.clamped || end.clamped,
    })
}

/// True when shifting by the deltas would leave the sheet on an unlocked axis.
pub fn would_be_out_of_bounds(reference: &CellReference, col_delta: i64, row_delta: i64) -> bool {
    shift(reference, col_delta, row_delta, &AdjustOptions::default()).is_err()
}

/// relative -> absolute -> mixed-row -> mixed-column -> relative
pub fn cycle_reference_type(reference: &CellReference) -> CellReference {
    let next = match reference.reference_type() {
        ReferenceType::Relative => ReferenceType::Absolute,
        ReferenceType::Absolute => ReferenceType::MixedRow,
        ReferenceType::MixedRow => ReferenceType::MixedColumn,
        ReferenceType::MixedColumn => ReferenceType::Relative,
    };
    reference.clone().with_type(next)
}

pub fn make_relative(reference: &CellReference) -> CellReference {
    reference.clone().with_type(ReferenceType::Relative)
}

pub fn make_absolute(reference: &CellReference) -> CellReference {
    reference.clone().with_type(ReferenceType::Absolute)
}

pub fn make_mixed_column(reference: &CellReference) -> CellReference {
    reference.clone().with_type(ReferenceType::MixedColumn)
}

pub fn make_mixed_row(reference: &CellReference) -> CellReference {
    reference.clone().with_type(ReferenceType::MixedRow)
}

/// Cycle the `$` markers of the reference under the cursor (the F4 toggle).
pub fn cycle_reference_type_at_cursor(formula: &str, cursor: usize) -> Option<ReplaceResult> {
    let info = find_reference_at_position(formula, cursor)?;
    let cycled = cycle_reference_type(&info.reference);
    // The sheet prefix stays as written; a range's end corner has none.
    let prefix = info.text.rfind('!').map_or("", |bang| &info.text[..=bang]);
    let body = stringify_cell_reference(&CellReference {
        sheet: None,
        ..cycled
    });
    replace_reference_at_position(formula, info.position, &format!("{prefix}{body}"), cursor)
}

fn shift(
    reference: &CellReference,
    col_delta: i64,
    row_delta: i64,
    options: &AdjustOptions,
) -> Result<AdjustmentResult, RefError> {
    let (column, col_clamped) = shift_axis(
        reference.column,
        reference.column_absolute,
        col_delta,
        MAX_COLUMN_INDEX,
        options.clamp_to_bounds,
    )
    .ok_or_else(|| {
        RefError::out_of_bounds(format!(
            "'{reference}' shifted by {col_delta} columns leaves the sheet"
        ))
    })?;
    let (row, row_clamped) = shift_axis(
        reference.row,
        reference.row_absolute,
        row_delta,
        MAX_ROW_INDEX,
        options.clamp_to_bounds,
    )
    .ok_or_else(|| {
        RefError::out_of_bounds(format!(
            "'{reference}' shifted by {row_delta} rows leaves the sheet"
        ))
    })?;

    Ok(AdjustmentResult {
        changed: column != reference.column || row != reference.row,
        clamped: col_clamped || row_clamped,
        reference: CellReference {
            column,
            row,
            ..reference.clone()
        },
    })
}

/// `None` when the shifted coordinate leaves `0..=max` and clamping is off.
fn shift_axis(value: u32, locked: bool, delta: i64, max: u32, clamp: bool) -> Option<(u32, bool)> {
    if locked || delta == 0 {
        return Some((value, false));
    }
    let raw = i64::from(value) + delta;
    if (0..=i64::from(max)).contains(&raw) {
        Some((raw as u32, false))
    } else if clamp {
        Some((raw.clamp(0, i64::from(max)) as u32, true))
    } else {
        None
    }
}
