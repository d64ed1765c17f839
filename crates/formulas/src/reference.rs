//! Structured cell and range references and their A1 text form.
//!
//! Parsing and stringification are exact inverses for every reference the
//! parser produces: `parse(stringify(parse(text))) == parse(text)`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use gridfill_primitives::{
    column_index_to_letter, column_letter_to_index, sanitize_sheet_name, CellAddress, CellRange,
    MAX_ROW_COUNT,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RefError;

/// How a cell reference reacts to copy and fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceType {
    /// `A1`
    Relative,
    /// `$A$1`
    Absolute,
    /// `$A1`: column locked
    MixedColumn,
    /// `A$1`: row locked
    MixedRow,
}

impl ReferenceType {
    pub fn from_flags(column_absolute: bool, row_absolute: bool) -> Self {
        match (column_absolute, row_absolute) {
            (false, false) => Self::Relative,
            (true, true) => Self::Absolute,
            (true, false) => Self::MixedColumn,
            (false, true) => Self::MixedRow,
        }
    }

    /// `(column_absolute, row_absolute)`
    pub fn flags(self) -> (bool, bool) {
        match self {
            Self::Relative => (false, false),
            Self::Absolute => (true, true),
            Self::MixedColumn => (true, false),
            Self::MixedRow => (false, true),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relative => "relative",
            Self::Absolute => "absolute",
            Self::MixedColumn => "mixed-column",
            Self::MixedRow => "mixed-row",
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-cell reference such as `B3`, `$B$3` or `'Q1 Data'!B$3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellReference {
    pub column: u32,
    pub row: u32,
    pub column_absolute: bool,
    pub row_absolute: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl CellReference {
    /// Relative, unqualified reference to `address`.
    pub fn new(address: CellAddress) -> Self {
        Self {
            column: address.col,
            row: address.row,
            column_absolute: false,
            row_absolute: false,
            sheet: None,
        }
    }

    pub fn with_absolute(mut self, column_absolute: bool, row_absolute: bool) -> Self {
        self.column_absolute = column_absolute;
        self.row_absolute = row_absolute;
        self
    }

    pub fn with_type(self, reference_type: ReferenceType) -> Self {
        let (column_absolute, row_absolute) = reference_type.flags();
        self.with_absolute(column_absolute, row_absolute)
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.row, self.column)
    }

    pub fn reference_type(&self) -> ReferenceType {
        ReferenceType::from_flags(self.column_absolute, self.row_absolute)
    }

    /// Sheet qualifiers never move during copy or fill.
    pub fn sheet_absolute(&self) -> bool {
        self.sheet.is_some()
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stringify_cell_reference(self))
    }
}

impl FromStr for CellReference {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_cell_reference(s)
    }
}

/// A rectangular reference. `start` is always the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeReference {
    pub start: CellReference,
    pub end: CellReference,
}

impl RangeReference {
    /// Build a range from two corners in any order.
    ///
    /// Each axis is normalized independently and keeps the `$` flag of the
    /// coordinate it came from, so `$B2:A$1` becomes `A$1:$B2` column-wise
    /// and row-wise. Both ends share the first qualified sheet.
    pub fn new(a: CellReference, b: CellReference) -> Self {
        let (start_col, end_col) = ordered(
            (a.column, a.column_absolute),
            (b.column, b.column_absolute),
        );
        let (start_row, end_row) = ordered((a.row, a.row_absolute), (b.row, b.row_absolute));
        let sheet = a.sheet.or(b.sheet);

        Self {
            start: CellReference {
                column: start_col.0,
                row: start_row.0,
                column_absolute: start_col.1,
                row_absolute: start_row.1,
                sheet: sheet.clone(),
            },
            end: CellReference {
                column: end_col.0,
                row: end_row.0,
                column_absolute: end_col.1,
                row_absolute: end_row.1,
                sheet,
            },
        }
    }

    pub fn sheet(&self) -> Option<&str> {
        self.start.sheet.as_deref()
    }

    pub fn to_cell_range(&self) -> CellRange {
        CellRange::new(self.start.address(), self.end.address())
    }
}

impl fmt::Display for RangeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stringify_range_reference(self))
    }
}

impl FromStr for RangeReference {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_range_reference(s)
    }
}

fn ordered(a: (u32, bool), b: (u32, bool)) -> ((u32, bool), (u32, bool)) {
    if a.0 <= b.0 {
        (a, b)
    } else {
        (b, a)
    }
}

/// Parse `[sheet!]$?letters$?digits`, case-insensitively.
pub fn parse_cell_reference(text: &str) -> Result<CellReference, RefError> {
    let (sheet, body) = split_sheet(text)?;
    let caps = cell_body_regex()
        .captures(body)
        .ok_or_else(|| RefError::invalid_format(text))?;

    let letters = &caps[2];
    let column = column_letter_to_index(letters)
        .map_err(|_| RefError::out_of_bounds(format!("column {letters} in '{text}'")))?;

    // The row is all digits, so a failed parse can only mean overflow.
    let row_number: u64 = caps[4]
        .parse()
        .map_err(|_| RefError::out_of_bounds(format!("row in '{text}'")))?;
    if row_number == 0 {
        return Err(RefError::invalid_format(text));
    }
    if row_number > u64::from(MAX_ROW_COUNT) {
        return Err(RefError::out_of_bounds(format!(
            "row {row_number} in '{text}'"
        )));
    }

    Ok(CellReference {
        column,
        row: (row_number - 1) as u32,
        column_absolute: !caps[1].is_empty(),
        row_absolute: !caps[3].is_empty(),
        sheet,
    })
}

/// Parse `[sheet!]A1:B2`, splitting on the first `:`.
pub fn parse_range_reference(text: &str) -> Result<RangeReference, RefError> {
    let (left, right) = text
        .split_once(':')
        .ok_or_else(|| RefError::invalid_format(text))?;
    let start = parse_cell_reference(left)?;
    let end = parse_cell_reference(right)?;
    if let (Some(a), Some(b)) = (&start.sheet, &end.sheet) {
        if a != b {
            return Err(RefError::invalid_sheet(b));
        }
    }
    Ok(RangeReference::new(start, end))
}

pub fn stringify_cell_reference(reference: &CellReference) -> String {
    let mut out = String::new();
    if let Some(sheet) = &reference.sheet {
        out.push_str(&sanitize_sheet_name(sheet));
        out.push('!');
    }
    out.push_str(&cell_body(reference));
    out
}

/// The sheet prefix is written once, in front of the start corner.
pub fn stringify_range_reference(range: &RangeReference) -> String {
    format!(
        "{}:{}",
        stringify_cell_reference(&range.start),
        cell_body(&range.end)
    )
}

fn cell_body(reference: &CellReference) -> String {
    format!(
        "{}{}{}{}",
        if reference.column_absolute { "$" } else { "" },
        column_index_to_letter(reference.column),
        if reference.row_absolute { "$" } else { "" },
        reference.row + 1
    )
}

fn split_sheet(text: &str) -> Result<(Option<String>, &str), RefError> {
    match text.rfind('!') {
        Some(bang) => Ok((Some(parse_sheet_name(&text[..bang])?), &text[bang + 1..])),
        None => Ok((None, text)),
    }
}

/// Parse a sheet qualifier as written before `!`, quoted or bare.
pub fn parse_sheet_name(prefix: &str) -> Result<String, RefError> {
    let prefix = prefix.trim_end();
    if let Some(rest) = prefix.strip_prefix('\'') {
        let inner = rest
            .strip_suffix('\'')
            .ok_or_else(|| RefError::invalid_sheet(prefix))?;
        // Embedded quotes must be doubled.
        if inner.is_empty() || inner.replace("''", "").contains('\'') {
            return Err(RefError::invalid_sheet(prefix));
        }
        let name = inner.replace("''", "'");
        if name
            .chars()
            .any(|c| matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        {
            return Err(RefError::invalid_sheet(prefix));
        }
        return Ok(name);
    }

    if bare_sheet_regex().is_match(prefix) {
        Ok(prefix.to_string())
    } else {
        Err(RefError::invalid_sheet(prefix))
    }
}

fn cell_body_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\$?)([A-Za-z]+)(\$?)(\d+)$").expect("valid regex"))
}

fn bare_sheet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("valid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RefErrorKind;

    #[test]
    fn test_parse_cell_reference_flags() {
        let r = parse_cell_reference("$b3").unwrap();
        assert_eq!((r.column, r.row), (1, 2));
        assert!(r.column_absolute);
        assert!(!r.row_absolute);
        assert_eq!(r.reference_type(), ReferenceType::MixedColumn);
        assert_eq!(r.to_string(), "$B3");

        let r = parse_cell_reference("C$10").unwrap();
        assert_eq!(r.reference_type(), ReferenceType::MixedRow);
    }

    #[test]
    fn test_parse_cell_reference_bounds() {
        let err = parse_cell_reference("A1048577").unwrap_err();
        assert_eq!(err.kind, RefErrorKind::OutOfBounds);

        let r = parse_cell_reference("XFD1").unwrap();
        assert_eq!(r.column, 16_383);

        let err = parse_cell_reference("XFE1").unwrap_err();
        assert_eq!(err.kind, RefErrorKind::OutOfBounds);

        let err = parse_cell_reference("A99999999999999999999").unwrap_err();
        assert_eq!(err.kind, RefErrorKind::OutOfBounds);
    }

    #[test]
    fn test_parse_cell_reference_invalid_format() {
        for text in ["", "A0", "1A", "A", "A1B", "$$A1", "A1 "] {
            let err = parse_cell_reference(text).unwrap_err();
            assert_eq!(err.kind, RefErrorKind::InvalidFormat, "{text}");
        }
    }

    #[test]
    fn test_parse_sheet_qualified() {
        let r = parse_cell_reference("'Sheet Name'!$A$1").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Sheet Name"));
        assert!(r.sheet_absolute());
        assert_eq!(r.to_string(), "'Sheet Name'!$A$1");

        let r = parse_cell_reference("'O''Brien'!A1").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("O'Brien"));
        assert_eq!(r.to_string(), "'O''Brien'!A1");

        let r = parse_cell_reference("'Sheet1'!A1").unwrap();
        assert_eq!(r.to_string(), "Sheet1!A1");
    }

    #[test]
    fn test_parse_invalid_sheet() {
        for text in ["'Unclosed!A1", "'a'b'!A1", "''!A1", "2024!A1", "My Sheet!A1", "'a:b'!A1"] {
            let err = parse_cell_reference(text).unwrap_err();
            assert_eq!(err.kind, RefErrorKind::InvalidSheet, "{text}");
        }
    }

    #[test]
    fn test_parse_range_normalizes() {
        let range = parse_range_reference("$B2:A$1").unwrap();
        assert_eq!((range.start.column, range.start.row), (0, 0));
        assert_eq!((range.end.column, range.end.row), (1, 1));
        assert!(!range.start.column_absolute);
        assert!(range.start.row_absolute);
        assert!(range.end.column_absolute);
        assert!(!range.end.row_absolute);
        assert_eq!(range.to_string(), "A$1:$B2");
    }

    #[test]
    fn test_parse_range_with_sheet() {
        let range = parse_range_reference("Data!A1:C3").unwrap();
        assert_eq!(range.sheet(), Some("Data"));
        assert_eq!(range.end.sheet.as_deref(), Some("Data"));
        assert_eq!(range.to_string(), "Data!A1:C3");
        assert_eq!(range.to_cell_range().size(), 9);

        let err = parse_range_reference("Data!A1:Other!C3").unwrap_err();
        assert_eq!(err.kind, RefErrorKind::InvalidSheet);

        let err = parse_range_reference("A1").unwrap_err();
        assert_eq!(err.kind, RefErrorKind::InvalidFormat);
    }

    #[test]
    fn test_round_trip_known_forms() {
        for text in ["A1", "$A$1", "$A1", "A$1", "Sheet1!A1", "'Sheet Name'!$A$1"] {
            let parsed = parse_cell_reference(text).unwrap();
            let again = parse_cell_reference(&stringify_cell_reference(&parsed)).unwrap();
            assert_eq!(parsed, again, "{text}");
        }
    }

    #[test]
    fn test_with_type_sets_flags() {
        let r = CellReference::new(CellAddress::new(4, 2)).with_type(ReferenceType::MixedRow);
        assert_eq!(r.to_string(), "C$5");
        assert_eq!(r.with_sheet("Totals").to_string(), "Totals!C$5");
    }
}
