use crate::parser::parse_formula;

/// Bracket and quote state left over after scanning a formula.
struct Scan {
    open: Vec<char>,
    unclosed_quote: Option<char>,
    stray_close: bool,
}

/// Track `(`/`{` nesting outside string literals and quoted sheet names.
fn scan(input: &str) -> Scan {
    let mut open = Vec::new();
    let mut stray_close = false;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' | '\'' => {
                let quote = ch;
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    if quote == '"' && inner == '\\' {
                        chars.next();
                    } else if inner == quote {
                        if chars.peek() == Some(&quote) {
                            chars.next();
                        } else {
                            closed = true;
                            break;
                        }
                    }
                }
                if !closed {
                    return Scan {
                        open,
                        unclosed_quote: Some(quote),
                        stray_close,
                    };
                }
            }
            '(' | '{' => open.push(ch),
            ')' | '}' => {
                let expected = if ch == ')' { '(' } else { '{' };
                if open.last() == Some(&expected) {
                    open.pop();
                } else {
                    stray_close = true;
                }
            }
            _ => {}
        }
    }

    Scan {
        open,
        unclosed_quote: None,
        stray_close,
    }
}

/// Close an unterminated string and any open `(` or `{`, innermost first.
/// Brackets inside strings are ignored.
pub fn balance_parentheses(input: &str) -> String {
    let state = scan(input);
    let mut out = input.to_string();
    if let Some(quote) = state.unclosed_quote {
        out.push(quote);
    }
    for open in state.open.iter().rev() {
        out.push(if *open == '(' { ')' } else { '}' });
    }
    out
}

/// Check that brackets nest correctly outside string literals.
pub fn is_balanced_parenthesis(input: &str) -> bool {
    let state = scan(input);
    state.open.is_empty() && state.unclosed_quote.is_none() && !state.stray_close
}

/// Check if text is a formula.
pub fn is_a_formula(text: &str) -> bool {
    text.len() > 1 && text.starts_with('=')
}

/// Validate formula syntax (requires leading '=').
pub fn is_valid_formula(text: &str) -> bool {
    let trimmed = text.trim();
    is_a_formula(trimmed) && parse_formula(trimmed).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_parentheses() {
        assert_eq!(balance_parentheses("=SUM(1"), "=SUM(1)");
        assert_eq!(balance_parentheses("=IF(A1,{1,2"), "=IF(A1,{1,2})");
        assert_eq!(balance_parentheses("=LEN(\"(x"), "=LEN(\"(x\")");
        assert_eq!(balance_parentheses("=A1"), "=A1");
    }

    #[test]
    fn test_is_balanced_parenthesis() {
        assert!(is_balanced_parenthesis("=SUM((1+2)*3)"));
        assert!(is_balanced_parenthesis("=\"(\"&'(sheet'!A1"));
        assert!(!is_balanced_parenthesis("=SUM(1"));
        assert!(!is_balanced_parenthesis("=1)"));
        assert!(!is_balanced_parenthesis("=(1}"));
    }

    #[test]
    fn test_is_a_formula() {
        assert!(is_a_formula("=A1"));
        assert!(!is_a_formula("="));
        assert!(!is_a_formula("A1"));
    }

    #[test]
    fn test_is_valid_formula() {
        assert!(is_valid_formula("=A1+1"));
        assert!(is_valid_formula("  =SUM(A1:B2)  "));
        assert!(!is_valid_formula("A1+1"));
        assert!(!is_valid_formula("=SUM(1"));
    }
}
