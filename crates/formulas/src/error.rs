//! Error types for formula lexing, parsing and reference rewriting.

use gridfill_primitives::AddressError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Scanner failure: an unexpected character or an unterminated quoted run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct LexError {
    pub message: String,
    pub position: usize,
}

impl LexError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Grammar failure. Formula text is single-line, so `line` is always 1.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
            line: 1,
            column: position + 1,
        }
    }
}

/// Any failure from the formula entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FormulaError {
    /// Byte offset of the failure in the `=`-stripped formula text.
    pub fn position(&self) -> usize {
        match self {
            Self::Lex(err) => err.position,
            Self::Parse(err) => err.position,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lex(err) => &err.message,
            Self::Parse(err) => &err.message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefErrorKind {
    InvalidFormat,
    OutOfBounds,
    InvalidSheet,
    CircularReference,
}

impl fmt::Display for RefErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidFormat => "invalid reference format",
            Self::OutOfBounds => "reference out of bounds",
            Self::InvalidSheet => "invalid sheet name",
            Self::CircularReference => "circular reference",
        };
        f.write_str(label)
    }
}

/// Failure of a reference parse or adjustment, returned as a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RefError {
    pub kind: RefErrorKind,
    pub message: String,
}

impl RefError {
    pub fn new(kind: RefErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_format(text: &str) -> Self {
        Self::new(RefErrorKind::InvalidFormat, format!("'{text}'"))
    }

    pub fn out_of_bounds(message: impl Into<String>) -> Self {
        Self::new(RefErrorKind::OutOfBounds, message)
    }

    pub fn invalid_sheet(sheet: &str) -> Self {
        Self::new(RefErrorKind::InvalidSheet, format!("'{sheet}'"))
    }

    pub fn circular(reference: &str) -> Self {
        Self::new(
            RefErrorKind::CircularReference,
            format!("'{reference}' refers to the cell being written"),
        )
    }
}

impl From<AddressError> for RefError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::OutOfBounds(text) => Self::out_of_bounds(format!("'{text}'")),
            AddressError::InvalidColumn(text)
            | AddressError::InvalidRow(text)
            | AddressError::InvalidRange(text) => Self::invalid_format(&text),
        }
    }
}
