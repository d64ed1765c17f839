//! Formula parser module
//!
//! Recursive descent over the token stream, lowest precedence first:
//!
//! ```text
//! expression := comparison
//! comparison := concat (("=" | "<>" | "<" | ">" | "<=" | ">=") concat)*
//! concat     := additive ("&" additive)*
//! additive   := term (("+" | "-") term)*
//! term       := power (("*" | "/") power)*
//! power      := unary ("^" unary)*
//! unary      := ("+" | "-") unary | primary
//! primary    := NUMBER | STRING | TRUE | FALSE | reference
//!             | FUNCTION ["(" [expression ("," expression)*] ")"]
//!             | "(" expression ")" | "{" row (";" row)* "}"
//! ```

use crate::error::{FormulaError, ParseError};
use crate::reference::{parse_cell_reference, parse_range_reference};
use crate::tokenizer::{tokenize, Token, TokenKind};
use crate::{BinaryOperator, FormulaExpr, UnaryOperator};

const COMPARISON_OPS: &[&str] = &["=", "<>", "<", ">", "<=", ">="];

/// Deepest nesting of parentheses, arguments, arrays and unary signs.
const MAX_DEPTH: usize = 128;

/// Parse formula text, with or without its leading `=`.
///
/// Error positions are byte offsets into the text after the `=`.
pub fn parse_formula(formula: &str) -> Result<FormulaExpr, FormulaError> {
    let source = formula.strip_prefix('=').unwrap_or(formula);
    let tokens = tokenize(source)?;
    if tokens.len() == 1 {
        return Err(ParseError::new("Empty formula", 0).into());
    }

    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expression()?;
    let trailing = parser.peek();
    if trailing.kind != TokenKind::Eof {
        return Err(ParseError::new(
            format!("Unexpected token '{}'", trailing.text),
            trailing.position,
        )
        .into());
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    idx: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            idx: 0,
            depth: 0,
        }
    }

    fn parse_expression(&mut self) -> Result<FormulaExpr, ParseError> {
        self.nested(Self::parse_comparison)
    }

    /// Run `parse` one level deeper, failing at the token that would exceed
    /// the nesting limit.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::new(
                format!("Formula nested too deeply (limit {MAX_DEPTH})"),
                self.peek().position,
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_comparison(&mut self) -> Result<FormulaExpr, ParseError> {
        let mut left = self.parse_concat()?;
        while let Some(op) = self.match_operator(COMPARISON_OPS) {
            let right = self.parse_concat()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_concat(&mut self) -> Result<FormulaExpr, ParseError> {
        let mut left = self.parse_add_sub()?;
        while let Some(op) = self.match_operator(&["&"]) {
            let right = self.parse_add_sub()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_add_sub(&mut self) -> Result<FormulaExpr, ParseError> {
        let mut left = self.parse_mul_div()?;
        while let Some(op) = self.match_operator(&["+", "-"]) {
            let right = self.parse_mul_div()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_mul_div(&mut self) -> Result<FormulaExpr, ParseError> {
        let mut left = self.parse_power()?;
        while let Some(op) = self.match_operator(&["*", "/"]) {
            let right = self.parse_power()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<FormulaExpr, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.match_operator(&["^"]) {
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<FormulaExpr, ParseError> {
        let token = self.peek();
        let op = match (token.kind, token.text.as_str()) {
            (TokenKind::Operator, "-") => Some(UnaryOperator::Negate),
            (TokenKind::Operator, "+") => Some(UnaryOperator::Plus),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_primary();
        };
        self.advance();
        let expr = self.nested(Self::parse_unary)?;
        Ok(FormulaExpr::UnaryOp {
            op,
            expr: Box::new(expr),
        })
    }

    fn parse_primary(&mut self) -> Result<FormulaExpr, ParseError> {
        let token = self.advance();
        let Token {
            kind,
            text,
            position,
        } = token;

        match kind {
            TokenKind::Number => text
                .parse::<f64>()
                .map(FormulaExpr::Number)
                .map_err(|_| ParseError::new(format!("Invalid number '{text}'"), position)),
            TokenKind::String => Ok(FormulaExpr::Text(unescape_string(&text))),
            TokenKind::True => Ok(FormulaExpr::Boolean(true)),
            TokenKind::False => Ok(FormulaExpr::Boolean(false)),
            TokenKind::Cell => parse_cell_reference(&text)
                .map(FormulaExpr::CellRef)
                .map_err(|err| invalid_reference(&text, &err, position)),
            TokenKind::Range => parse_range_reference(&text)
                .map(FormulaExpr::RangeRef)
                .map_err(|err| invalid_reference(&text, &err, position)),
            TokenKind::SheetCell => {
                let reference = parse_cell_reference(&text)
                    .map_err(|err| invalid_reference(&text, &err, position))?;
                let Some(sheet_name) = reference.sheet.clone() else {
                    return Err(ParseError::new(
                        format!("Missing sheet name in '{text}'"),
                        position,
                    ));
                };
                Ok(FormulaExpr::SheetCellRef {
                    sheet_name,
                    reference,
                })
            }
            TokenKind::SheetRange => {
                let range = parse_range_reference(&text)
                    .map_err(|err| invalid_reference(&text, &err, position))?;
                let Some(sheet_name) = range.start.sheet.clone() else {
                    return Err(ParseError::new(
                        format!("Missing sheet name in '{text}'"),
                        position,
                    ));
                };
                Ok(FormulaExpr::SheetRangeRef { sheet_name, range })
            }
            TokenKind::Function => {
                let name = text.to_ascii_uppercase();
                // A bare name is a zero-argument call (PI, a named value).
                let args = if self.peek().kind == TokenKind::LParen {
                    self.parse_arguments()?
                } else {
                    Vec::new()
                };
                Ok(FormulaExpr::FunctionCall { name, args })
            }
            TokenKind::LParen => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LBrace => self.parse_array(position),
            TokenKind::Eof => Err(ParseError::new("Unexpected end of formula", position)),
            _ => Err(ParseError::new(
                format!("Unexpected token '{text}'"),
                position,
            )),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<FormulaExpr>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if self.peek().kind == TokenKind::RParen {
            self.advance();
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            let next = self.advance();
            match next.kind {
                TokenKind::Comma => continue,
                TokenKind::RParen => break,
                _ => {
                    return Err(ParseError::new(
                        format!("Expected ',' or ')' but found '{}'", next.text),
                        next.position,
                    ))
                }
            }
        }
        Ok(args)
    }

    /// Called just past `{`.
    fn parse_array(&mut self, open: usize) -> Result<FormulaExpr, ParseError> {
        if self.peek().kind == TokenKind::RBrace {
            return Err(ParseError::new("Empty array literal", open));
        }

        let mut rows: Vec<Vec<FormulaExpr>> = vec![Vec::new()];
        loop {
            let item = self.parse_expression()?;
            if let Some(row) = rows.last_mut() {
                row.push(item);
            }
            let next = self.advance();
            match next.kind {
                TokenKind::Comma => {}
                TokenKind::Semicolon => rows.push(Vec::new()),
                TokenKind::RBrace => break,
                _ => {
                    return Err(ParseError::new(
                        format!("Expected ',', ';' or '}}' but found '{}'", next.text),
                        next.position,
                    ))
                }
            }
        }

        let width = rows[0].len();
        if rows.iter().any(|row| row.len() != width) {
            return Err(ParseError::new(
                "Array rows must have the same number of items",
                open,
            ));
        }
        Ok(FormulaExpr::Array(rows))
    }

    fn match_operator(&mut self, symbols: &[&str]) -> Option<BinaryOperator> {
        let token = self.peek();
        if token.kind != TokenKind::Operator || !symbols.contains(&token.text.as_str()) {
            return None;
        }
        let op = BinaryOperator::from_symbol(&token.text)?;
        self.advance();
        Some(op)
    }

    fn expect(&mut self, kind: TokenKind, label: &str) -> Result<(), ParseError> {
        let token = self.peek();
        if token.kind == kind {
            self.advance();
            Ok(())
        } else {
            let found = if token.kind == TokenKind::Eof {
                "end of formula".to_string()
            } else {
                format!("'{}'", token.text)
            };
            Err(ParseError::new(
                format!("Expected {label} but found {found}"),
                token.position,
            ))
        }
    }

    fn peek(&self) -> &Token {
        // The stream always ends with EOF, and the parser never moves past it.
        &self.tokens[self.idx.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.idx += 1;
        }
        token
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn invalid_reference(text: &str, err: &crate::error::RefError, position: usize) -> ParseError {
    ParseError::new(format!("Invalid reference '{text}': {err}"), position)
}

/// Strip the surrounding quotes. Doubled quotes collapse to one and `\x`
/// becomes `x`, whichever quote opened the string.
fn unescape_string(text: &str) -> String {
    let mut chars = text.chars();
    let Some(quote) = chars.next() else {
        return String::new();
    };
    let inner = chars.as_str().strip_suffix(quote).unwrap_or(chars.as_str());

    let mut out = String::with_capacity(inner.len());
    let mut iter = inner.chars().peekable();
    while let Some(ch) = iter.next() {
        if ch == '\\' {
            if let Some(next) = iter.next() {
                out.push(next);
            }
        } else if ch == quote && iter.peek() == Some(&quote) {
            iter.next();
            out.push(quote);
        } else {
            out.push(ch);
        }
    }
    out
}
