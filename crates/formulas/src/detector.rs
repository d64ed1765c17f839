//! Reference detection over raw formula text.
//!
//! Positions are byte offsets into the formula exactly as given (a leading
//! `=` counts), so results can be spliced straight back into that text.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::reference::{parse_cell_reference, CellReference, ReferenceType};

/// One reference occurrence in a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceInfo {
    pub text: String,
    pub position: usize,
    pub length: usize,
    #[serde(rename = "type")]
    pub reference_type: ReferenceType,
    pub reference: CellReference,
}

impl ReferenceInfo {
    /// Byte offset one past the reference text.
    pub fn end(&self) -> usize {
        self.position + self.length
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaAnalysis {
    /// Sorted ascending by position.
    pub references: Vec<ReferenceInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceStats {
    pub total: usize,
    pub relative: usize,
    pub absolute: usize,
    pub mixed_column: usize,
    pub mixed_row: usize,
    pub cross_sheet: usize,
    pub unique_sheets: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceResult {
    pub formula: String,
    pub cursor: usize,
}

/// Find every cell reference in `formula`.
///
/// Candidates inside string literals, and candidates glued to a longer
/// identifier (`LOG10(`, `ABC_A1`), are ignored, as are matches the
/// reference parser rejects (e.g. `XFE1`).
pub fn analyze_formula(formula: &str) -> FormulaAnalysis {
    let literals = string_spans(formula);
    let mut references = Vec::new();

    for m in reference_regex().find_iter(formula) {
        let (start, end) = (m.start(), m.end());
        if literals.iter().any(|&(s, e)| start >= s && start < e) {
            continue;
        }
        if formula[..start].chars().next_back().is_some_and(is_word_char)
            || formula[end..]
                .chars()
                .next()
                .is_some_and(|c| is_word_char(c) || c == '(')
        {
            continue;
        }

        match parse_cell_reference(m.as_str()) {
            Ok(mut reference) => {
                if reference.sheet.is_none() {
                    reference.sheet = range_sheet(formula, start, &references);
                }
                references.push(ReferenceInfo {
                    text: m.as_str().to_string(),
                    position: start,
                    length: end - start,
                    reference_type: reference.reference_type(),
                    reference,
                });
            }
            Err(err) => trace!(candidate = m.as_str(), %err, "skipping reference candidate"),
        }
    }

    // Scan order is already ascending; sorting keeps the contract explicit.
    references.sort_by_key(|info| info.position);
    FormulaAnalysis { references }
}

/// The reference under `position`, treating the offset just past a
/// reference as still on it.
pub fn find_reference_at_position(formula: &str, position: usize) -> Option<ReferenceInfo> {
    analyze_formula(formula)
        .references
        .into_iter()
        .find(|info| info.position <= position && position <= info.end())
}

/// First reference starting after `position`.
pub fn find_next_reference(formula: &str, position: usize) -> Option<ReferenceInfo> {
    analyze_formula(formula)
        .references
        .into_iter()
        .find(|info| info.position > position)
}

/// Last reference starting before `position`.
pub fn find_previous_reference(formula: &str, position: usize) -> Option<ReferenceInfo> {
    analyze_formula(formula)
        .references
        .into_iter()
        .rev()
        .find(|info| info.position < position)
}

pub fn count_references(formula: &str) -> usize {
    analyze_formula(formula).references.len()
}

/// True when any reference locks a column or a row.
pub fn has_absolute_references(formula: &str) -> bool {
    analyze_formula(formula)
        .references
        .iter()
        .any(|info| info.reference_type != ReferenceType::Relative)
}

/// True when no reference locks anything (vacuously true without references).
pub fn has_only_relative_references(formula: &str) -> bool {
    analyze_formula(formula)
        .references
        .iter()
        .all(|info| info.reference_type == ReferenceType::Relative)
}

/// Sheet names in order of first appearance.
pub fn get_referenced_sheets(formula: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    analyze_formula(formula)
        .references
        .into_iter()
        .filter_map(|info| info.reference.sheet)
        .filter(|sheet| seen.insert(sheet.clone()))
        .collect()
}

pub fn get_reference_stats(formula: &str) -> ReferenceStats {
    let analysis = analyze_formula(formula);
    let mut stats = ReferenceStats {
        total: analysis.references.len(),
        ..ReferenceStats::default()
    };
    let mut sheets = HashSet::new();
    for info in &analysis.references {
        match info.reference_type {
            ReferenceType::Relative => stats.relative += 1,
            ReferenceType::Absolute => stats.absolute += 1,
            ReferenceType::MixedColumn => stats.mixed_column += 1,
            ReferenceType::MixedRow => stats.mixed_row += 1,
        }
        if let Some(sheet) = &info.reference.sheet {
            stats.cross_sheet += 1;
            sheets.insert(sheet.as_str());
        }
    }
    stats.unique_sheets = sheets.len();
    stats
}

/// Replace the reference under `position` with `replacement` and carry the
/// cursor along.
///
/// A cursor before the reference stays put. A cursor inside it keeps its
/// offset, capped at the new length. A cursor at or past its end shifts by
/// the length difference.
pub fn replace_reference_at_position(
    formula: &str,
    position: usize,
    replacement: &str,
    cursor: usize,
) -> Option<ReplaceResult> {
    let info = find_reference_at_position(formula, position)?;
    let mut out = String::with_capacity(formula.len() + replacement.len());
    out.push_str(&formula[..info.position]);
    out.push_str(replacement);
    out.push_str(&formula[info.end()..]);

    let new_len = replacement.len();
    let cursor = if cursor < info.position {
        cursor
    } else {
        let offset = cursor - info.position;
        if offset >= info.length {
            info.position + new_len + (offset - info.length)
        } else {
            info.position + offset.min(new_len)
        }
    };

    Some(ReplaceResult {
        formula: out,
        cursor,
    })
}

/// Sheet of the start corner when the reference at `start` closes a
/// `Sheet!A1:B2` range. The end corner carries no prefix of its own.
fn range_sheet(formula: &str, start: usize, found: &[ReferenceInfo]) -> Option<String> {
    let previous = found.last()?;
    if previous.end() + 1 != start || !formula[..start].ends_with(':') {
        return None;
    }
    previous.reference.sheet.clone()
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$')
}

/// Byte spans of string literals: double-quoted runs, and single-quoted runs
/// that are not followed by `!`. An unterminated literal runs to the end.
fn string_spans(formula: &str) -> Vec<(usize, usize)> {
    let bytes = formula.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let start = i;
                i += 1;
                while i < bytes.len() {
                    match bytes[i] {
                        b'\\' => i += 2,
                        b'"' if bytes.get(i + 1) == Some(&b'"') => i += 2,
                        b'"' => {
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
                spans.push((start, i.min(bytes.len())));
            }
            b'\'' => {
                let start = i;
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == b'\'' {
                        if bytes.get(i + 1) == Some(&b'\'') {
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
                let end = i.min(bytes.len());
                let qualifies_sheet = formula[end..].trim_start().starts_with('!');
                if !qualifies_sheet {
                    spans.push((start, end));
                }
            }
            _ => i += 1,
        }
    }
    spans
}

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:(?:'(?:[^']|'')+'|[A-Za-z_][A-Za-z0-9_.]*)\s*!)?\$?[A-Za-z]+\$?\d+")
            .expect("valid regex")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(formula: &str) -> Vec<String> {
        analyze_formula(formula)
            .references
            .into_iter()
            .map(|info| info.text)
            .collect()
    }

    #[test]
    fn test_analyze_orders_by_position() {
        let analysis = analyze_formula("=Z99+A1");
        let positions: Vec<_> = analysis.references.iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![1, 5]);
        assert_eq!(analysis.references[0].length, 3);
        assert_eq!(analysis.references[1].text, "A1");
    }

    #[test]
    fn test_analyze_classifies_types() {
        let analysis = analyze_formula("=A1+$B$2+$C3+D$4");
        let types: Vec<_> = analysis
            .references
            .iter()
            .map(|i| i.reference_type)
            .collect();
        assert_eq!(
            types,
            vec![
                ReferenceType::Relative,
                ReferenceType::Absolute,
                ReferenceType::MixedColumn,
                ReferenceType::MixedRow,
            ]
        );
    }

    #[test]
    fn test_analyze_skips_function_names_and_strings() {
        assert_eq!(texts("=LOG10(A1)"), vec!["A1"]);
        assert_eq!(texts(r#"="A1"&B2"#), vec!["B2"]);
        assert_eq!(texts(r#"="say ""C3"""&D4"#), vec!["D4"]);
        assert_eq!(texts("='A1'&B2"), vec!["B2"]);
        assert_eq!(texts("=ABC_A1+A1B"), Vec::<String>::new());
        assert_eq!(texts("=XFE1+A1"), vec!["A1"]);
    }

    #[test]
    fn test_analyze_sheet_qualified() {
        let analysis = analyze_formula("=SUM('My Sheet'!A1:B2, Data!$C$3)");
        let refs = &analysis.references;
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].text, "'My Sheet'!A1");
        assert_eq!(refs[0].position, 5);
        assert_eq!(refs[0].reference.sheet.as_deref(), Some("My Sheet"));
        // The end corner belongs to the same sheet but keeps its bare text.
        assert_eq!(refs[1].text, "B2");
        assert_eq!(refs[1].reference.sheet.as_deref(), Some("My Sheet"));
        assert_eq!(refs[2].reference.sheet.as_deref(), Some("Data"));
        assert_eq!(refs[2].reference_type, ReferenceType::Absolute);
    }

    #[test]
    fn test_navigation() {
        let formula = "=A1+B22*C3";
        assert_eq!(find_reference_at_position(formula, 5).unwrap().text, "B22");
        assert_eq!(find_reference_at_position(formula, 7).unwrap().text, "B22");
        assert!(find_reference_at_position(formula, 0).is_none());
        assert_eq!(find_next_reference(formula, 1).unwrap().text, "B22");
        assert!(find_next_reference(formula, 8).is_none());
        assert_eq!(find_previous_reference(formula, 8).unwrap().text, "B22");
        assert!(find_previous_reference(formula, 1).is_none());
    }

    #[test]
    fn test_queries() {
        assert_eq!(count_references("=A1+B2+C3"), 3);
        assert!(has_absolute_references("=A1+$B2"));
        assert!(!has_absolute_references("=A1+B2"));
        assert!(has_only_relative_references("=A1+B2"));
        assert!(has_only_relative_references("=1+2"));
        assert!(!has_only_relative_references("=A$1"));
        assert_eq!(
            get_referenced_sheets("=Data!A1+Other!B1+Data!C1+D1"),
            vec!["Data".to_string(), "Other".to_string()]
        );
    }

    #[test]
    fn test_stats() {
        let stats = get_reference_stats("=A1+$A$1+$A1+A$1+S1!A1+'S 2'!B2");
        assert_eq!(
            stats,
            ReferenceStats {
                total: 6,
                relative: 3,
                absolute: 1,
                mixed_column: 1,
                mixed_row: 1,
                cross_sheet: 2,
                unique_sheets: 2,
            }
        );
    }

    #[test]
    fn test_range_end_corner_takes_range_sheet() {
        let stats = get_reference_stats("=Data!A1:B2");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.cross_sheet, 2);
        assert_eq!(stats.unique_sheets, 1);

        // A separate operand after ':' only inherits when it directly follows.
        let refs = analyze_formula("=Data!A1+B2:C3").references;
        assert_eq!(refs[1].reference.sheet, None);
        assert_eq!(refs[2].reference.sheet, None);
    }

    #[test]
    fn test_replace_reference_moves_cursor() {
        // Cursor after the reference shifts by the length change.
        let result = replace_reference_at_position("=A1+B2", 1, "$A$1", 6).unwrap();
        assert_eq!(result.formula, "=$A$1+B2");
        assert_eq!(result.cursor, 8);

        // Cursor inside keeps its offset, capped at the new length.
        let result = replace_reference_at_position("=$A$1+B2", 2, "A1", 4).unwrap();
        assert_eq!(result.formula, "=A1+B2");
        assert_eq!(result.cursor, 3);

        // Cursor before the reference stays put.
        let result = replace_reference_at_position("=A1+B2", 4, "$B$2", 1).unwrap();
        assert_eq!(result.formula, "=A1+$B$2");
        assert_eq!(result.cursor, 1);

        assert!(replace_reference_at_position("=1+2", 1, "A1", 1).is_none());
    }
}
