use std::fmt;

use chrono::NaiveDate;
use gridfill_primitives::Value;
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::detectors::date::{self, DateUnit};
use crate::detectors::fibonacci;
use crate::detectors::sequence::SequenceKind;
use crate::detectors::text::{self, BuiltinList, CaseMode};
use crate::error::GenerateError;

/// Family of a detected pattern, one per detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Linear,
    Fibonacci,
    Exponential,
    Date,
    #[serde(rename = "custom", alias = "custom_sequence")]
    CustomSequence,
    Text,
    Copy,
}

impl PatternType {
    pub const ALL: [PatternType; 7] = [
        PatternType::Linear,
        PatternType::Fibonacci,
        PatternType::Exponential,
        PatternType::Date,
        PatternType::CustomSequence,
        PatternType::Text,
        PatternType::Copy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Linear => "linear",
            PatternType::Fibonacci => "fibonacci",
            PatternType::Exponential => "exponential",
            PatternType::Date => "date",
            PatternType::CustomSequence => "custom",
            PatternType::Text => "text",
            PatternType::Copy => "copy",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if normalized == "sequence" || normalized == "custom_sequence" {
            return Ok(PatternType::CustomSequence);
        }
        PatternType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown pattern type: {s}"))
    }
}

/// Parameters needed to continue a series. `index` passed to
/// [`Generator::generate`] is the 0-based offset of the target cell into the
/// fill, so index 0 is the first value after the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Generator {
    Linear {
        last: f64,
        step: f64,
    },
    Exponential {
        last: f64,
        ratio: f64,
    },
    Fibonacci {
        multiplier: f64,
        next_index: u64,
    },
    Date {
        last: NaiveDate,
        step: i64,
        unit: DateUnit,
        format: String,
    },
    Sequence {
        sequence: SequenceKind,
        next_index: u64,
    },
    TextList {
        list: BuiltinList,
        last_index: i64,
        step: i64,
        case: CaseMode,
    },
    TextNumber {
        prefix: String,
        last: i64,
        step: i64,
        width: Option<usize>,
    },
    QuarterYear {
        quarter: i64,
        year: Option<i64>,
        step: i64,
    },
    Copy,
}

impl Generator {
    /// Produce the value at `index`. `source` is the lane's source values,
    /// ordered toward the fill; only the copy generator reads it.
    pub fn generate(&self, source: &[Value], index: usize) -> Result<Value, GenerateError> {
        let k = index as u64 + 1;
        match self {
            Generator::Linear { last, step } => finite(last + step * k as f64),
            Generator::Exponential { last, ratio } => {
                let exponent = i32::try_from(k).map_err(|_| GenerateError::Overflow {
                    sequence: "exponential",
                    index: k,
                })?;
                let value = last * ratio.powi(exponent);
                if value.is_finite() {
                    Ok(Value::Number(value))
                } else {
                    Err(GenerateError::Overflow {
                        sequence: "exponential",
                        index: k,
                    })
                }
            }
            Generator::Fibonacci {
                multiplier,
                next_index,
            } => {
                let n = next_index + index as u64;
                let term = fibonacci::fib(n).ok_or(GenerateError::Overflow {
                    sequence: "fibonacci",
                    index: n,
                })?;
                finite(multiplier * term as f64)
            }
            Generator::Date {
                last,
                step,
                unit,
                format,
            } => {
                let steps = step
                    .checked_mul(k as i64)
                    .ok_or(GenerateError::DateOutOfRange)?;
                let next = date::shift(*last, steps, *unit).ok_or(GenerateError::DateOutOfRange)?;
                Ok(Value::Text(next.format(format).to_string()))
            }
            Generator::Sequence {
                sequence,
                next_index,
            } => {
                let term = sequence.term(next_index + index as u64)?;
                Ok(Value::Number(term as f64))
            }
            Generator::TextList {
                list,
                last_index,
                step,
                case,
            } => {
                let items = list.items();
                let idx = (last_index + step * k as i64).rem_euclid(items.len() as i64);
                Ok(Value::Text(text::apply_case(items[idx as usize], *case)))
            }
            Generator::TextNumber {
                prefix,
                last,
                step,
                width,
            } => {
                let n = step
                    .checked_mul(k as i64)
                    .and_then(|delta| last.checked_add(delta))
                    .ok_or(GenerateError::Overflow {
                        sequence: "numbered text",
                        index: k,
                    })?;
                Ok(Value::Text(format!(
                    "{prefix}{}",
                    text::format_with_width(n, *width)
                )))
            }
            Generator::QuarterYear {
                quarter,
                year,
                step,
            } => {
                let overflow = GenerateError::Overflow {
                    sequence: "quarter",
                    index: k,
                };
                let total = step
                    .checked_mul(k as i64)
                    .and_then(|delta| delta.checked_add(quarter - 1))
                    .ok_or(overflow.clone())?;
                let q = total.rem_euclid(4) + 1;
                Ok(Value::Text(match year {
                    Some(y) => {
                        let year = y.checked_add(total.div_euclid(4)).ok_or(overflow)?;
                        format!("Q{q} {year}")
                    }
                    None => format!("Q{q}"),
                }))
            }
            Generator::Copy => {
                if source.is_empty() {
                    return Err(GenerateError::EmptySource);
                }
                Ok(source[index % source.len()].clone())
            }
        }
    }
}

fn finite(n: f64) -> Result<Value, GenerateError> {
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(GenerateError::NonFinite)
    }
}

/// A detector's proposal for continuing the source values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub confidence: f64,
    pub description: String,
    pub generator: Generator,
    pub metadata: Map<String, serde_json::Value>,
}

impl Pattern {
    pub fn new(
        pattern_type: PatternType,
        confidence: f64,
        description: impl Into<String>,
        generator: Generator,
    ) -> Self {
        Self {
            pattern_type,
            confidence: confidence.clamp(0.0, 1.0),
            description: description.into(),
            generator,
            metadata: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn generate(&self, source: &[Value], index: usize) -> Result<Value, GenerateError> {
        self.generator.generate(source, index)
    }
}

/// Outcome of running every enabled detector over one set of values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternDetectionResult {
    pub best_pattern: Option<Pattern>,
    pub alternative_patterns: Vec<Pattern>,
    pub ambiguity_score: f64,
    /// Best confidence after the ambiguity penalty.
    pub confidence: f64,
    /// Best confidence as the detector reported it.
    pub raw_confidence: f64,
}
