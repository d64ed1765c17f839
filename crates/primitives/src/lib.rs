//! # Gridfill Primitives
//!
//! Core primitives shared by the formula and autofill crates: cell addresses,
//! rectangular ranges, and the closed scalar type stored in a cell.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod address;

pub use address::{
    column_index_to_letter, column_letter_to_index, desanitize_sheet_name, needs_quoting,
    sanitize_sheet_name, MAX_COLUMN_COUNT, MAX_COLUMN_INDEX, MAX_ROW_COUNT, MAX_ROW_INDEX,
};

/// A zero-based cell address in the sheet (e.g., A1 is row 0, col 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse from A1 notation (e.g., "A1", "$B$2"). `$` markers are accepted and dropped.
    pub fn from_a1(s: &str) -> Result<Self, AddressError> {
        let text = s.trim();
        if text.is_empty() {
            return Err(AddressError::InvalidRange("Empty A1 reference".to_string()));
        }

        let body = text.strip_prefix('$').unwrap_or(text);
        let split = body
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(body.len());
        let (letters, rest) = body.split_at(split);
        if letters.is_empty() {
            return Err(AddressError::InvalidColumn(text.to_string()));
        }

        let digits = rest.strip_prefix('$').unwrap_or(rest);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AddressError::InvalidRow(text.to_string()));
        }
        let row = match digits.parse::<u32>() {
            Ok(0) => return Err(AddressError::InvalidRow(digits.to_string())),
            Ok(n) if n <= MAX_ROW_COUNT => n - 1,
            _ => return Err(AddressError::OutOfBounds(text.to_string())),
        };

        Ok(Self::new(row, column_letter_to_index(letters)?))
    }

    /// Convert to A1 notation
    pub fn to_a1(&self) -> String {
        format!("{}{}", column_index_to_letter(self.col), self.row + 1)
    }

    /// Shift by a signed delta, returning `None` when the result leaves the sheet.
    pub fn offset(&self, d_row: i64, d_col: i64) -> Option<Self> {
        let row = i64::from(self.row) + d_row;
        let col = i64::from(self.col) + d_col;
        if !(0..=i64::from(MAX_ROW_INDEX)).contains(&row)
            || !(0..=i64::from(MAX_COLUMN_INDEX)).contains(&col)
        {
            return None;
        }
        Some(Self::new(row as u32, col as u32))
    }
}

/// A rectangular range of cells (e.g., A1:B10). Always stored with start <= end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range, normalizing corner order
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellAddress::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Single-cell range.
    pub fn single(cell: CellAddress) -> Self {
        Self::new(cell, cell)
    }

    /// Parse "A1:B2" or a lone "A1".
    pub fn from_a1(s: &str) -> Result<Self, AddressError> {
        match s.split_once(':') {
            Some((start, end)) => Ok(Self::new(
                CellAddress::from_a1(start)?,
                CellAddress::from_a1(end)?,
            )),
            None => CellAddress::from_a1(s).map(Self::single),
        }
    }

    /// Number of rows in the range
    pub fn rows(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Number of columns in the range
    pub fn cols(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// True when the two ranges share at least one cell.
    pub fn intersects(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    /// Get total number of cells in range
    pub fn size(&self) -> usize {
        self.rows() as usize * self.cols() as usize
    }

    /// Iterate over all addresses in row-major order
    pub fn iter(&self) -> CellRangeIter {
        CellRangeIter {
            range: *self,
            next: Some(self.start),
        }
    }
}

/// Direction a fill extends away from its source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillDirection {
    Up,
    Down,
    Left,
    Right,
}

impl FillDirection {
    /// Up and down fills move along rows.
    pub fn is_vertical(&self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// Up and left fills walk toward lower indices.
    pub fn is_backward(&self) -> bool {
        matches!(self, Self::Up | Self::Left)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for FillDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FillDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(format!("unknown fill direction: {other}")),
        }
    }
}

/// Scalar value held by a cell. Formulas are text beginning with `=`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    Error(ErrorValue),
}

impl Value {
    /// Check if value is empty
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the value: numbers, and text that reads as a finite number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed.starts_with('=') {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }

    /// Text view of the value, for text cells only
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Check if the value is a formula (`=` prefixed text)
    pub fn is_formula(&self) -> bool {
        matches!(self, Value::Text(s) if s.starts_with('='))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Error(e) => write!(f, "{}", e.label()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Render a number the way a sheet shows it: integers without a trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Error types for cell values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorValue {
    Div0,  // #DIV/0!
    Name,  // #NAME?
    Value, // #VALUE!
    Ref,   // #REF!
    Null,  // #NULL!
    Num,   // #NUM!
    NA,    // #N/A
}

impl ErrorValue {
    /// Excel-style error label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Div0 => "#DIV/0!",
            Self::Name => "#NAME?",
            Self::Value => "#VALUE!",
            Self::Ref => "#REF!",
            Self::Null => "#NULL!",
            Self::Num => "#NUM!",
            Self::NA => "#N/A",
        }
    }
}

/// Errors that can occur when parsing addresses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid column: {0}")]
    InvalidColumn(String),
    #[error("Invalid row: {0}")]
    InvalidRow(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Address out of bounds: {0}")]
    OutOfBounds(String),
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Row-major walk over a [`CellRange`].
pub struct CellRangeIter {
    range: CellRange,
    next: Option<CellAddress>,
}

impl Iterator for CellRangeIter {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.next?;
        let CellRange { start, end } = self.range;
        self.next = if cell.col < end.col {
            Some(CellAddress::new(cell.row, cell.col + 1))
        } else if cell.row < end.row {
            Some(CellAddress::new(cell.row + 1, start.col))
        } else {
            None
        };
        Some(cell)
    }
}
