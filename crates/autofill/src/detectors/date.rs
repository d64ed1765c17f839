//! Date strings advancing by a constant number of days or calendar months.

use chrono::{Datelike, Days, Months, NaiveDate};
use gridfill_primitives::Value;
use serde::{Deserialize, Serialize};

use crate::pattern::{Generator, Pattern, PatternType};

/// Recognised layouts, tried in order.
pub const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateUnit {
    Days,
    Months,
}

impl DateUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateUnit::Days => "days",
            DateUnit::Months => "months",
        }
    }
}

/// Parse `text` with the first matching layout.
pub fn parse_date(text: &str) -> Option<(NaiveDate, &'static str)> {
    let text = text.trim();
    DATE_FORMATS.into_iter().find_map(|format| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .map(|date| (date, format))
    })
}

/// Move `date` by `steps` units; `None` outside chrono's calendar range.
pub fn shift(date: NaiveDate, steps: i64, unit: DateUnit) -> Option<NaiveDate> {
    let magnitude = steps.unsigned_abs();
    match unit {
        DateUnit::Days => {
            let days = Days::new(magnitude);
            if steps >= 0 {
                date.checked_add_days(days)
            } else {
                date.checked_sub_days(days)
            }
        }
        DateUnit::Months => {
            let months = Months::new(u32::try_from(magnitude).ok()?);
            if steps >= 0 {
                date.checked_add_months(months)
            } else {
                date.checked_sub_months(months)
            }
        }
    }
}

pub fn detect(values: &[Value]) -> Option<Pattern> {
    let parsed: Vec<(NaiveDate, &'static str)> = values
        .iter()
        .filter(|v| !v.is_empty())
        .map(|v| v.as_text().and_then(parse_date))
        .collect::<Option<_>>()?;
    if parsed.len() < 2 {
        return None;
    }
    let dates: Vec<NaiveDate> = parsed.iter().map(|(date, _)| *date).collect();
    let (last, format) = *parsed.last()?;

    let (step, unit) = month_step(&dates).or_else(|| day_step(&dates))?;

    let mut confidence = 0.7 + (0.05 * (dates.len() - 2) as f64).min(0.15);
    if unit == DateUnit::Months || step == 1 || step == 7 {
        confidence += 0.1;
    }

    Some(
        Pattern::new(
            PatternType::Date,
            confidence,
            format!("Dates every {step} {}", unit.as_str()),
            Generator::Date {
                last,
                step,
                unit,
                format: format.to_string(),
            },
        )
        .with_meta("step", step)
        .with_meta("unit", unit.as_str())
        .with_meta("format", format),
    )
}

fn day_step(dates: &[NaiveDate]) -> Option<(i64, DateUnit)> {
    let step = (dates[1] - dates[0]).num_days();
    let constant = dates
        .windows(2)
        .all(|pair| (pair[1] - pair[0]).num_days() == step);
    (constant && step != 0).then_some((step, DateUnit::Days))
}

/// Same day of month in every value, a constant non-zero number of months apart.
fn month_step(dates: &[NaiveDate]) -> Option<(i64, DateUnit)> {
    let day = dates[0].day();
    if dates.iter().any(|d| d.day() != day) {
        return None;
    }
    let month_index = |d: &NaiveDate| i64::from(d.year()) * 12 + i64::from(d.month0());
    let step = month_index(&dates[1]) - month_index(&dates[0]);
    let constant = dates
        .windows(2)
        .all(|pair| month_index(&pair[1]) - month_index(&pair[0]) == step);
    (constant && step != 0).then_some((step, DateUnit::Months))
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
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        for text in [
            "2024-03-05",
            "03/05/2024",
            "2024/03/05",
            "05.03.2024",
            "Mar 05, 2024",
            "March 5, 2024",
            "05 Mar 2024",
        ] {
            assert_eq!(parse_date(text).map(|(d, _)| d), Some(expected), "{text}");
        }
        assert!(parse_date("2024-13-01").is_none());
        assert!(parse_date("hello").is_none());
    }

    #[test]
    fn test_daily() {
        let pattern = detect(&texts(&["2024-01-30", "2024-01-31"])).unwrap();
        assert_eq!(pattern.metadata["unit"], "days");
        assert_eq!(generated(&pattern, 2), vec!["2024-02-01", "2024-02-02"]);
    }

    #[test]
    fn test_weekly_scores_bonus() {
        let weekly = detect(&texts(&["2024-01-01", "2024-01-08", "2024-01-15"])).unwrap();
        let odd = detect(&texts(&["2024-01-01", "2024-01-04", "2024-01-07"])).unwrap();
        assert!(weekly.confidence > odd.confidence);
        assert_eq!(generated(&weekly, 1), vec!["2024-01-22"]);
    }

    #[test]
    fn test_monthly_same_day() {
        let pattern = detect(&texts(&["01/15/2024", "02/15/2024", "03/15/2024"])).unwrap();
        assert_eq!(pattern.metadata["unit"], "months");
        assert_eq!(pattern.metadata["step"], 1);
        assert_eq!(generated(&pattern, 2), vec!["04/15/2024", "05/15/2024"]);
    }

    #[test]
    fn test_output_uses_last_format() {
        let pattern = detect(&texts(&["2024-01-01", "Jan 02, 2024"])).unwrap();
        assert_eq!(generated(&pattern, 1), vec!["Jan 03, 2024"]);
    }

    #[test]
    fn test_backwards_step() {
        let pattern = detect(&texts(&["2024-03-01", "2024-02-01"])).unwrap();
        assert_eq!(pattern.metadata["step"], -1);
        assert_eq!(generated(&pattern, 1), vec!["2024-01-01"]);
    }

    #[test]
    fn test_rejects_irregular_and_non_dates() {
        assert!(detect(&texts(&["2024-01-01", "2024-01-02", "2024-01-05"])).is_none());
        assert!(detect(&texts(&["2024-01-01", "2024-01-01"])).is_none());
        assert!(detect(&texts(&["2024-01-01"])).is_none());
        assert!(detect(&texts(&["2024-01-01", "soon"])).is_none());
        assert!(detect(&[Value::from(1.0), Value::from(2.0)]).is_none());
    }
}
