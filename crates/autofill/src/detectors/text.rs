//! Text series: built-in name lists (months, weekdays, quarters), quarters
//! with a year, and text ending in a number.

use gridfill_primitives::Value;
use serde::{Deserialize, Serialize};

use super::date::parse_date;
use crate::pattern::{Generator, Pattern, PatternType};

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTHS_LONG: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS_SHORT: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const WEEKDAYS_LONG: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinList {
    MonthsShort,
    MonthsLong,
    WeekdaysShort,
    WeekdaysLong,
    Quarters,
}

impl BuiltinList {
    pub const ALL: [BuiltinList; 5] = [
        BuiltinList::MonthsShort,
        BuiltinList::MonthsLong,
        BuiltinList::WeekdaysShort,
        BuiltinList::WeekdaysLong,
        BuiltinList::Quarters,
    ];

    pub fn items(&self) -> &'static [&'static str] {
        match self {
            BuiltinList::MonthsShort => &MONTHS_SHORT,
            BuiltinList::MonthsLong => &MONTHS_LONG,
            BuiltinList::WeekdaysShort => &WEEKDAYS_SHORT,
            BuiltinList::WeekdaysLong => &WEEKDAYS_LONG,
            BuiltinList::Quarters => &QUARTERS,
        }
    }

    fn label(self) -> &'static str {
        match self {
            BuiltinList::MonthsShort | BuiltinList::MonthsLong => "Month names",
            BuiltinList::WeekdaysShort | BuiltinList::WeekdaysLong => "Weekday names",
            BuiltinList::Quarters => "Quarters",
        }
    }

    /// Case-insensitive position of `text` in the list.
    fn position(self, text: &str) -> Option<i64> {
        let text = text.trim();
        self.items()
            .iter()
            .position(|item| item.eq_ignore_ascii_case(text))
            .map(|i| i as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseMode {
    Upper,
    Lower,
    Title,
}

impl CaseMode {
    fn of(text: &str) -> Self {
        let letters = || text.chars().filter(|c| c.is_alphabetic());
        if letters().all(char::is_uppercase) {
            CaseMode::Upper
        } else if letters().all(char::is_lowercase) {
            CaseMode::Lower
        } else {
            CaseMode::Title
        }
    }
}

pub fn apply_case(text: &str, case: CaseMode) -> String {
    match case {
        CaseMode::Upper => text.to_uppercase(),
        CaseMode::Lower => text.to_lowercase(),
        CaseMode::Title => {
            let mut chars = text.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        }
    }
}

/// Zero-pad `n` to `width` digits, keeping the sign in front.
pub fn format_with_width(n: i64, width: Option<usize>) -> String {
    match width {
        Some(width) if n < 0 => format!("-{:0>width$}", n.unsigned_abs()),
        Some(width) => format!("{n:0>width$}"),
        None => n.to_string(),
    }
}

pub fn detect(values: &[Value]) -> Option<Pattern> {
    let texts: Vec<&str> = values
        .iter()
        .filter(|v| !v.is_empty())
        .map(Value::as_text)
        .collect::<Option<_>>()?;
    if texts.is_empty()
        || texts
            .iter()
            .any(|t| t.starts_with('=') || t.trim().parse::<f64>().is_ok())
        || texts.iter().all(|t| parse_date(t).is_some())
    {
        return None;
    }

    detect_quarter_year(&texts)
        .or_else(|| detect_list(&texts))
        .or_else(|| detect_numbered(&texts))
}

fn list_confidence(samples: usize) -> f64 {
    if samples == 1 {
        0.7
    } else {
        0.8 + (0.05 * (samples - 2) as f64).min(0.1)
    }
}

fn numbered_confidence(samples: usize) -> f64 {
    if samples == 1 {
        0.6
    } else {
        0.75 + (0.05 * (samples - 2) as f64).min(0.15)
    }
}

/// Constant difference between consecutive positions; 1 for a single value.
fn constant_step(positions: &[i64], modulus: Option<i64>) -> Option<i64> {
    let diff = |a: i64, b: i64| {
        let delta = b.checked_sub(a)?;
        Some(modulus.map_or(delta, |m| delta.rem_euclid(m)))
    };
    if positions.len() == 1 {
        return Some(1);
    }
    let step = diff(positions[0], positions[1])?;
    let constant = positions
        .windows(2)
        .all(|pair| diff(pair[0], pair[1]) == Some(step));
    (constant && step != 0).then_some(step)
}

fn detect_list(texts: &[&str]) -> Option<Pattern> {
    BuiltinList::ALL.into_iter().find_map(|list| {
        let positions: Vec<i64> = texts
            .iter()
            .map(|t| list.position(t))
            .collect::<Option<_>>()?;
        let step = constant_step(&positions, Some(list.items().len() as i64))?;
        let last = texts.last()?;
        let case = CaseMode::of(last);
        Some(
            Pattern::new(
                PatternType::Text,
                list_confidence(texts.len()),
                list.label(),
                Generator::TextList {
                    list,
                    last_index: *positions.last()?,
                    step,
                    case,
                },
            )
            .with_meta("list", serde_json::to_value(list).ok()?)
            .with_meta("step", step),
        )
    })
}

/// `"Q3 2024"` as `(3, Some(2024))`.
fn parse_quarter(text: &str) -> Option<(i64, Option<i64>)> {
    let rest = text.trim().strip_prefix(['Q', 'q'])?;
    let mut parts = rest.split_whitespace();
    let quarter: i64 = parts.next()?.parse().ok()?;
    let year = parts.next().map(str::parse::<i64>).transpose().ok()?;
    if parts.next().is_some() || !(1..=4).contains(&quarter) {
        return None;
    }
    Some((quarter, year))
}

fn detect_quarter_year(texts: &[&str]) -> Option<Pattern> {
    let parsed: Vec<(i64, i64)> = texts
        .iter()
        .map(|t| match parse_quarter(t)? {
            (quarter, Some(year)) => Some((quarter, year)),
            (_, None) => None,
        })
        .collect::<Option<_>>()?;
    let ordinals: Vec<i64> = parsed
        .iter()
        .map(|(q, y)| y.checked_mul(4)?.checked_add(q - 1))
        .collect::<Option<_>>()?;
    let step = constant_step(&ordinals, None)?;
    let (quarter, year) = *parsed.last()?;
    Some(
        Pattern::new(
            PatternType::Text,
            list_confidence(texts.len()),
            "Quarters with year",
            Generator::QuarterYear {
                quarter,
                year: Some(year),
                step,
            },
        )
        .with_meta("list", "quarter_year")
        .with_meta("step", step),
    )
}

/// `"Row-007"` as `("Row-", 7, Some(3))`. Width is only kept for zero-padded
/// numbers.
fn extract_trailing_number(text: &str) -> Option<(&str, i64, Option<usize>)> {
    let digits_at = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    let (prefix, digits) = text.split_at(digits_at);
    let number = digits.parse().ok()?;
    let width = (digits.len() > 1 && digits.starts_with('0')).then_some(digits.len());
    Some((prefix, number, width))
}

fn detect_numbered(texts: &[&str]) -> Option<Pattern> {
    let parts: Vec<(&str, i64, Option<usize>)> = texts
        .iter()
        .map(|t| extract_trailing_number(t))
        .collect::<Option<_>>()?;
    let prefix = parts[0].0;
    if parts.iter().any(|(p, _, _)| *p != prefix) {
        return None;
    }
    let numbers: Vec<i64> = parts.iter().map(|(_, n, _)| *n).collect();
    let step = constant_step(&numbers, None)?;
    let width = parts.iter().filter_map(|(_, _, w)| *w).max();
    let last = *numbers.last()?;

    let mut pattern = Pattern::new(
        PatternType::Text,
        numbered_confidence(texts.len()),
        format!("Numbered text \"{prefix}\""),
        Generator::TextNumber {
            prefix: prefix.to_string(),
            last,
            step,
            width,
        },
    )
    .with_meta("prefix", prefix)
    .with_meta("step", step);
    if let Some(width) = width {
        pattern = pattern.with_meta("width", width);
    }
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<Value> {
        values.iter().map(|s| Value::from(*s)).collect()
    }

    fn generated(pattern: &Pattern, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| pattern.generate(&[], i).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_months_wrap_and_keep_case() {
        let pattern = detect(&texts(&["Nov", "Dec"])).unwrap();
        assert_eq!(generated(&pattern, 2), vec!["Jan", "Feb"]);

        let pattern = detect(&texts(&["JANUARY", "MARCH"])).unwrap();
        assert_eq!(generated(&pattern, 2), vec!["MAY", "JULY"]);

        let pattern = detect(&texts(&["may", "june"])).unwrap();
        assert_eq!(generated(&pattern, 1), vec!["july"]);
    }

    #[test]
    fn test_single_list_item_steps_by_one() {
        let pattern = detect(&texts(&["Friday"])).unwrap();
        assert_eq!(generated(&pattern, 3), vec!["Saturday", "Sunday", "Monday"]);
        assert!(pattern.confidence >= 0.6);

        let pattern = detect(&texts(&["Q4"])).unwrap();
        assert_eq!(generated(&pattern, 2), vec!["Q1", "Q2"]);
    }

    #[test]
    fn test_quarter_with_year() {
        let pattern = detect(&texts(&["Q3 2024", "Q4 2024"])).unwrap();
        assert_eq!(generated(&pattern, 2), vec!["Q1 2025", "Q2 2025"]);
    }

    #[test]
    fn test_quarter_years_near_the_integer_limit() {
        let max = i64::MAX;
        assert!(detect(&texts(&[&format!("Q1 {max}"), &format!("Q2 {max}")])).is_none());

        let min = i64::MIN;
        assert!(detect(&texts(&[&format!("Q1 {min}"), &format!("Q1 {max}")])).is_none());
    }

    #[test]
    fn test_numbered_text() {
        let pattern = detect(&texts(&["Item 1", "Item 2"])).unwrap();
        assert_eq!(generated(&pattern, 2), vec!["Item 3", "Item 4"]);

        let pattern = detect(&texts(&["Row-08", "Row-10"])).unwrap();
        assert_eq!(pattern.metadata["width"], 2);
        assert_eq!(generated(&pattern, 2), vec!["Row-12", "Row-14"]);

        let pattern = detect(&texts(&["v007"])).unwrap();
        assert_eq!(generated(&pattern, 1), vec!["v008"]);
    }

    #[test]
    fn test_list_scores_above_numbered() {
        let list = detect(&texts(&["Mon", "Tue", "Wed"])).unwrap();
        let numbered = detect(&texts(&["a1", "a2", "a3"])).unwrap();
        assert!(list.confidence > numbered.confidence);
        assert!(list.confidence <= 0.9 && numbered.confidence >= 0.6);
    }

    #[test]
    fn test_declines() {
        assert!(detect(&texts(&["apple", "pear"])).is_none());
        assert!(detect(&texts(&["Item 1", "Thing 2"])).is_none());
        assert!(detect(&texts(&["Item 1", "Item 1"])).is_none());
        assert!(detect(&texts(&["=A1", "=A2"])).is_none());
        assert!(detect(&texts(&["1", "2"])).is_none());
        assert!(detect(&texts(&["2024-01-01", "2024-01-02"])).is_none());
        assert!(detect(&[Value::from(1.0)]).is_none());
    }

    #[test]
    fn test_format_with_width() {
        assert_eq!(format_with_width(7, Some(3)), "007");
        assert_eq!(format_with_width(-7, Some(3)), "-007");
        assert_eq!(format_with_width(1234, Some(3)), "1234");
        assert_eq!(format_with_width(5, None), "5");
    }
}
