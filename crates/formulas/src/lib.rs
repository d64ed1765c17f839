//! # Gridfill Formulas
//!
//! Formula tokenizing and parsing, plus the reference machinery used when a
//! formula is copied or filled: detection of every reference in the text,
//! per-reference adjustment, and whole-formula rewriting.

use gridfill_primitives::format_number;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod adjuster;
pub mod detector;
pub mod error;
pub mod parser;
pub mod reference;
pub mod tokenizer;
pub mod transformer;
pub mod utils;

pub use adjuster::{
    adjust_for_copy, adjust_for_fill, adjust_range_for_copy, cycle_reference_type,
    cycle_reference_type_at_cursor, make_absolute, make_mixed_column, make_mixed_row,
    make_relative, would_be_out_of_bounds, AdjustOptions, AdjustmentResult,
    RangeAdjustmentResult,
};
pub use detector::{
    analyze_formula, count_references, find_next_reference, find_previous_reference,
    find_reference_at_position, get_reference_stats, get_referenced_sheets,
    has_absolute_references, has_only_relative_references, replace_reference_at_position,
    FormulaAnalysis, ReferenceInfo, ReferenceStats, ReplaceResult,
};
pub use error::{FormulaError, LexError, ParseError, RefError, RefErrorKind};
pub use parser::parse_formula;
pub use reference::{
    parse_cell_reference, parse_range_reference, stringify_cell_reference,
    stringify_range_reference, CellReference, RangeReference, ReferenceType,
};
pub use tokenizer::{tokenize, Token, TokenKind};
pub use transformer::{
    preview_transformation, transform_for_copy, transform_for_fill, ReferenceChange,
    TransformPreview, TransformResult,
};
pub use utils::{balance_parentheses, is_a_formula, is_balanced_parenthesis, is_valid_formula};

/// Formula expression AST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FormulaExpr {
    Number(f64),
    #[serde(rename = "string")]
    Text(String),
    Boolean(bool),
    /// Unqualified cell reference (e.g., $A1)
    #[serde(rename = "cell")]
    CellRef(CellReference),
    /// Unqualified range reference (e.g., A1:B2)
    #[serde(rename = "range")]
    RangeRef(RangeReference),
    /// Sheet-qualified cell reference (e.g., Sheet1!A1). The reference
    /// carries the same sheet.
    #[serde(rename = "sheet_cell")]
    SheetCellRef {
        sheet_name: String,
        reference: CellReference,
    },
    /// Sheet-qualified range reference (e.g., 'My Sheet'!A1:B2)
    #[serde(rename = "sheet_range")]
    SheetRangeRef {
        sheet_name: String,
        range: RangeReference,
    },
    /// Function call; the name is stored uppercase
    #[serde(rename = "function")]
    FunctionCall {
        name: String,
        args: Vec<FormulaExpr>,
    },
    #[serde(rename = "binary")]
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    #[serde(rename = "unary")]
    UnaryOp {
        op: UnaryOperator,
        expr: Box<FormulaExpr>,
    },
    /// Array literal, one inner vector per row; rows have equal length
    Array(Vec<Vec<FormulaExpr>>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Concat,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Self::Add,
            "-" => Self::Subtract,
            "*" => Self::Multiply,
            "/" => Self::Divide,
            "^" => Self::Power,
            "=" => Self::Equal,
            "<>" => Self::NotEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessThanOrEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterThanOrEqual,
            "&" => Self::Concat,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Power => "^",
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::Concat => "&",
        }
    }

    /// Binding strength, higher binds tighter. All levels are left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Equal
            | Self::NotEqual
            | Self::LessThan
            | Self::LessThanOrEqual
            | Self::GreaterThan
            | Self::GreaterThanOrEqual => 1,
            Self::Concat => 2,
            Self::Add | Self::Subtract => 3,
            Self::Multiply | Self::Divide => 4,
            Self::Power => 5,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Negate,
    Plus,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Negate => "-",
            Self::Plus => "+",
        }
    }
}

/// A reference node found while walking an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExprReference<'a> {
    Cell(&'a CellReference),
    Range(&'a RangeReference),
}

impl FormulaExpr {
    /// Every reference in the tree, in left-to-right source order.
    pub fn references(&self) -> Vec<ExprReference<'_>> {
        let mut out = Vec::new();
        collect_references(self, &mut out);
        out
    }

    fn binary_precedence(&self) -> Option<u8> {
        match self {
            FormulaExpr::BinaryOp { op, .. } => Some(op.precedence()),
            _ => None,
        }
    }
}

fn collect_references<'a>(expr: &'a FormulaExpr, out: &mut Vec<ExprReference<'a>>) {
    match expr {
        FormulaExpr::Number(_) | FormulaExpr::Text(_) | FormulaExpr::Boolean(_) => {}
        FormulaExpr::CellRef(reference) | FormulaExpr::SheetCellRef { reference, .. } => {
            out.push(ExprReference::Cell(reference));
        }
        FormulaExpr::RangeRef(range) | FormulaExpr::SheetRangeRef { range, .. } => {
            out.push(ExprReference::Range(range));
        }
        FormulaExpr::FunctionCall { args, .. } => {
            for arg in args {
                collect_references(arg, out);
            }
        }
        FormulaExpr::BinaryOp { left, right, .. } => {
            collect_references(left, out);
            collect_references(right, out);
        }
        FormulaExpr::UnaryOp { expr, .. } => collect_references(expr, out),
        FormulaExpr::Array(rows) => {
            for item in rows.iter().flatten() {
                collect_references(item, out);
            }
        }
    }
}

/// Canonical formula text without the leading `=`. Parsing the output
/// yields the same tree.
impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Number(n) => f.write_str(&format_number(*n)),
            FormulaExpr::Text(s) => {
                let escaped = s.replace('\\', "\\\\").replace('"', "\"\"");
                write!(f, "\"{escaped}\"")
            }
            FormulaExpr::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            FormulaExpr::CellRef(reference) => f.write_str(&stringify_cell_reference(reference)),
            FormulaExpr::RangeRef(range) => f.write_str(&stringify_range_reference(range)),
            FormulaExpr::SheetCellRef {
                sheet_name,
                reference,
            } => {
                let qualified = CellReference {
                    sheet: Some(sheet_name.clone()),
                    ..reference.clone()
                };
                f.write_str(&stringify_cell_reference(&qualified))
            }
            FormulaExpr::SheetRangeRef { sheet_name, range } => {
                let qualified = RangeReference {
                    start: CellReference {
                        sheet: Some(sheet_name.clone()),
                        ..range.start.clone()
                    },
                    end: range.end.clone(),
                };
                f.write_str(&stringify_range_reference(&qualified))
            }
            FormulaExpr::FunctionCall { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            FormulaExpr::BinaryOp { op, left, right } => {
                let prec = op.precedence();
                if left.binary_precedence().is_some_and(|p| p < prec) {
                    write!(f, "({left})")?;
                } else {
                    write!(f, "{left}")?;
                }
                f.write_str(op.symbol())?;
                if right.binary_precedence().is_some_and(|p| p <= prec) {
                    write!(f, "({right})")
                } else {
                    write!(f, "{right}")
                }
            }
            FormulaExpr::UnaryOp { op, expr } => {
                if expr.binary_precedence().is_some() {
                    write!(f, "{}({expr})", op.symbol())
                } else {
                    write!(f, "{}{expr}", op.symbol())
                }
            }
            FormulaExpr::Array(rows) => {
                f.write_str("{")?;
                for (r, row) in rows.iter().enumerate() {
                    if r > 0 {
                        f.write_str(";")?;
                    }
                    for (c, item) in row.iter().enumerate() {
                        if c > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{item}")?;
                    }
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(formula: &str) -> String {
        let ast = parse_formula(formula).expect("parse");
        let text = ast.to_string();
        assert_eq!(parse_formula(&text).expect("reparse"), ast, "{text}");
        text
    }

    #[test]
    fn test_display_minimal_parentheses() {
        assert_eq!(round_trip("=(1+2)*3"), "(1+2)*3");
        assert_eq!(round_trip("=1+(2*3)"), "1+2*3");
        assert_eq!(round_trip("=1-(2-3)"), "1-(2-3)");
        assert_eq!(round_trip("=(1-2)-3"), "1-2-3");
        assert_eq!(round_trip("=-(A1+1)"), "-(A1+1)");
        assert_eq!(round_trip("=-2^2"), "-2^2");
        assert_eq!(round_trip("=2^(3^2)"), "2^(3^2)");
    }

    #[test]
    fn test_display_literals_and_refs() {
        assert_eq!(
            round_trip("=sum(a1:b2, 'My Sheet'!$C$3, 0.5)"),
            "SUM(A1:B2,'My Sheet'!$C$3,0.5)"
        );
        assert_eq!(round_trip(r#"="say ""hi"""&TRUE"#), r#""say ""hi"""&TRUE"#);
        assert_eq!(round_trip(r#"="a\\b""#), r#""a\\b""#);
        assert_eq!(round_trip("={1,2;3,4}"), "{1,2;3,4}");
        assert_eq!(round_trip("=Data!A1:B2&PI"), "Data!A1:B2&PI()");
    }

    #[test]
    fn test_references_walker() {
        let ast = parse_formula("=SUM(A1:B2)+Sheet2!C3*{1,D4}").unwrap();
        let refs = ast.references();
        assert_eq!(refs.len(), 3);
        assert!(matches!(refs[0], ExprReference::Range(r) if r.to_string() == "A1:B2"));
        assert!(matches!(refs[1], ExprReference::Cell(r) if r.to_string() == "Sheet2!C3"));
        assert!(matches!(refs[2], ExprReference::Cell(r) if r.to_string() == "D4"));
    }

    #[test]
    fn test_ast_serializes_with_type_tags() {
        let ast = parse_formula("=Sheet1!A1+1").unwrap();
        let json = serde_json::to_value(&ast).unwrap();
        assert_eq!(json["type"], "binary");
        assert_eq!(json["value"]["left"]["type"], "sheet_cell");
        assert_eq!(json["value"]["left"]["value"]["sheet_name"], "Sheet1");
        assert_eq!(json["value"]["right"]["value"], 1.0);
    }

    #[test]
    fn test_operator_symbols() {
        for symbol in ["+", "-", "*", "/", "^", "=", "<>", "<", "<=", ">", ">=", "&"] {
            let op = BinaryOperator::from_symbol(symbol).unwrap();
            assert_eq!(op.symbol(), symbol);
        }
        assert!(BinaryOperator::from_symbol("%").is_none());
    }
}
