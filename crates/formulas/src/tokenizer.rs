//! Formula tokenizer.
//!
//! A single left-to-right scan with fixed lookahead. Every token keeps the
//! exact source slice it came from and its byte offset, so callers can point
//! at or rewrite the original text.

use serde::{Deserialize, Serialize};

use crate::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Number,
    String,
    Cell,
    Range,
    SheetCell,
    SheetRange,
    Function,
    Operator,
    LParen,
    RParen,
    Comma,
    Colon,
    Semicolon,
    LBrace,
    RBrace,
    True,
    False,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Source slice, quotes and `$` markers included.
    pub text: String,
    /// Byte offset of the first character.
    pub position: usize,
}

/// Tokenize formula text (without its leading `=`). The result always ends
/// with an EOF token positioned at `input.len()`.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            pos: 0,
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                position: self.input.len(),
            });
        };

        let kind = match ch {
            '(' => self.simple(TokenKind::LParen),
            ')' => self.simple(TokenKind::RParen),
            ',' => self.simple(TokenKind::Comma),
            ':' => self.simple(TokenKind::Colon),
            ';' => self.simple(TokenKind::Semicolon),
            '{' => self.simple(TokenKind::LBrace),
            '}' => self.simple(TokenKind::RBrace),
            '+' | '-' | '*' | '/' | '^' | '&' | '=' => self.simple(TokenKind::Operator),
            '<' => {
                self.advance();
                let _ = self.consume('=') || self.consume('>');
                TokenKind::Operator
            }
            '>' => {
                self.advance();
                let _ = self.consume('=');
                TokenKind::Operator
            }
            '"' => self.string_token()?,
            '\'' => self.quoted_token()?,
            '.' | '0'..='9' => self.number_token()?,
            '$' | '_' => self.identifier_token()?,
            ch if ch.is_ascii_alphabetic() => self.identifier_token()?,
            _ => {
                return Err(LexError::new(
                    format!("Unexpected character '{ch}'"),
                    self.byte_pos(start),
                ))
            }
        };

        Ok(Token {
            kind,
            text: self.slice(start, self.pos).to_string(),
            position: self.byte_pos(start),
        })
    }

    fn simple(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// `"..."` with `""` and backslash escapes left in the token text.
    fn string_token(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        self.advance();
        while let Some(ch) = self.peek() {
            self.advance();
            match ch {
                '\\' => self.advance(),
                '"' => {
                    if !self.consume('"') {
                        return Ok(TokenKind::String);
                    }
                }
                _ => {}
            }
        }
        Err(LexError::new(
            "Unterminated string literal",
            self.byte_pos(start),
        ))
    }

    /// `'...'` is a sheet qualifier when `!` follows, a string otherwise.
    /// Escapes follow the double-quoted rules.
    fn quoted_token(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        self.advance();
        loop {
            match self.peek() {
                None => {
                    return Err(LexError::new(
                        "Unterminated quoted sheet name or string",
                        self.byte_pos(start),
                    ))
                }
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('\'') => {
                    self.advance();
                    if !self.consume('\'') {
                        break;
                    }
                }
                Some(_) => self.advance(),
            }
        }

        let after_quote = self.pos;
        self.skip_whitespace();
        if self.consume('!') {
            return self.sheet_reference_tail();
        }
        self.pos = after_quote;
        Ok(TokenKind::String)
    }

    fn number_token(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        let mut seen_dot = false;
        let mut seen_exp = false;

        while let Some(ch) = self.peek() {
            match ch {
                '0'..='9' => self.advance(),
                '.' if !seen_dot && !seen_exp => {
                    seen_dot = true;
                    self.advance();
                }
                'e' | 'E' if !seen_exp => {
                    seen_exp = true;
                    self.advance();
                    let _ = self.consume('+') || self.consume('-');
                }
                _ => break,
            }
        }

        let text = self.slice(start, self.pos);
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(TokenKind::Number),
            _ => Err(LexError::new(
                format!("Invalid number literal '{text}'"),
                self.byte_pos(start),
            )),
        }
    }

    /// Letters, digits, `_`, `.` and `$`, classified by what follows.
    fn identifier_token(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if is_identifier_char(ch)) {
            self.advance();
        }
        let word = self.slice(start, self.pos);
        let has_dollar = word.contains('$');
        let is_cell = is_cell_text(word);
        let is_true = word.eq_ignore_ascii_case("TRUE");
        let is_false = word.eq_ignore_ascii_case("FALSE");

        if self.peek() == Some('!') {
            if has_dollar {
                return Err(LexError::new(
                    format!("Invalid sheet name '{word}'"),
                    self.byte_pos(start),
                ));
            }
            self.advance();
            return self.sheet_reference_tail();
        }

        let called = self.next_non_whitespace() == Some('(');
        if is_cell && !called {
            if self.peek() == Some(':') {
                let colon = self.pos;
                self.advance();
                if self.scan_cell_body() {
                    return Ok(TokenKind::Range);
                }
                self.pos = colon;
            }
            return Ok(TokenKind::Cell);
        }

        if has_dollar {
            return Err(LexError::new(
                format!("Invalid reference '{}'", self.slice(start, self.pos)),
                self.byte_pos(start),
            ));
        }
        Ok(match (called, is_true, is_false) {
            (false, true, _) => TokenKind::True,
            (false, _, true) => TokenKind::False,
            _ => TokenKind::Function,
        })
    }

    /// Called just past `!`: a cell body, optionally `:` and a second one.
    fn sheet_reference_tail(&mut self) -> Result<TokenKind, LexError> {
        if !self.scan_cell_body() {
            return Err(LexError::new(
                "Expected cell reference after '!'",
                self.byte_pos(self.pos),
            ));
        }
        if self.peek() == Some(':') {
            let colon = self.pos;
            self.advance();
            if self.scan_cell_body() {
                return Ok(TokenKind::SheetRange);
            }
            self.pos = colon;
        }
        Ok(TokenKind::SheetCell)
    }

    /// Consume `$?letters$?digits` when it stands alone; otherwise rewind.
    fn scan_cell_body(&mut self) -> bool {
        let start = self.pos;
        let _ = self.consume('$');
        let letters = self.skip_while(|ch| ch.is_ascii_alphabetic());
        let _ = self.consume('$');
        let digits = self.skip_while(|ch| ch.is_ascii_digit());
        let bounded = !matches!(self.peek(), Some(ch) if is_identifier_char(ch));
        if letters > 0 && digits > 0 && bounded {
            true
        } else {
            self.pos = start;
            false
        }
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if pred(ch)) {
            self.advance();
        }
        self.pos - start
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.advance();
        }
    }

    fn next_non_whitespace(&self) -> Option<char> {
        self.chars[self.pos.min(self.chars.len())..]
            .iter()
            .map(|(_, ch)| *ch)
            .find(|ch| !ch.is_whitespace())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, ch)| *ch)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn consume(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn byte_pos(&self, idx: usize) -> usize {
        self.chars
            .get(idx)
            .map(|(i, _)| *i)
            .unwrap_or(self.input.len())
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[self.byte_pos(start)..self.byte_pos(end)]
    }
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '$')
}

/// `$?letters$?digits` with nothing else.
fn is_cell_text(word: &str) -> bool {
    let body = word.strip_prefix('$').unwrap_or(word);
    let letters = body.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    if letters == 0 {
        return false;
    }
    let rest = &body[letters..];
    let digits = rest.strip_prefix('$').unwrap_or(rest);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
