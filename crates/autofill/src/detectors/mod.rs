//! Pattern detectors.
//!
//! The set of detectors is closed, so it is modelled as an enum rather than
//! trait objects. Every detector sees the source values of one fill lane,
//! already ordered toward the fill, and either proposes a [`Pattern`] or
//! declines.

pub mod copy;
pub mod date;
pub mod exponential;
pub mod fibonacci;
pub mod linear;
pub mod sequence;
pub mod text;

use gridfill_primitives::{FillDirection, Value};
use tracing::debug;

use crate::pattern::{Pattern, PatternType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Detector {
    Linear,
    Fibonacci,
    Exponential,
    Date,
    CustomSequence,
    Text,
    Copy,
}

impl Detector {
    /// Every detector, highest priority first.
    pub const ALL: [Detector; 7] = [
        Detector::Linear,
        Detector::Fibonacci,
        Detector::Exponential,
        Detector::Date,
        Detector::CustomSequence,
        Detector::Text,
        Detector::Copy,
    ];

    pub fn for_type(pattern_type: PatternType) -> Self {
        match pattern_type {
            PatternType::Linear => Detector::Linear,
            PatternType::Fibonacci => Detector::Fibonacci,
            PatternType::Exponential => Detector::Exponential,
            PatternType::Date => Detector::Date,
            PatternType::CustomSequence => Detector::CustomSequence,
            PatternType::Text => Detector::Text,
            PatternType::Copy => Detector::Copy,
        }
    }

    pub fn priority(&self) -> u32 {
        match self {
            Detector::Linear => 80,
            Detector::Fibonacci => 75,
            Detector::Exponential | Detector::Date => 70,
            Detector::CustomSequence => 60,
            Detector::Text => 50,
            Detector::Copy => 1,
        }
    }

    pub fn pattern_type(&self) -> PatternType {
        match self {
            Detector::Linear => PatternType::Linear,
            Detector::Fibonacci => PatternType::Fibonacci,
            Detector::Exponential => PatternType::Exponential,
            Detector::Date => PatternType::Date,
            Detector::CustomSequence => PatternType::CustomSequence,
            Detector::Text => PatternType::Text,
            Detector::Copy => PatternType::Copy,
        }
    }

    pub fn detect(&self, values: &[Value], direction: FillDirection) -> Option<Pattern> {
        let pattern = match self {
            Detector::Linear => linear::detect(values),
            Detector::Fibonacci => fibonacci::detect(values),
            Detector::Exponential => exponential::detect(values),
            Detector::Date => date::detect(values),
            Detector::CustomSequence => sequence::detect(values),
            Detector::Text => text::detect(values),
            Detector::Copy => copy::detect(values),
        };
        match &pattern {
            Some(p) => debug!(
                detector = %self.pattern_type(),
                %direction,
                confidence = p.confidence,
                "detector matched"
            ),
            None => debug!(detector = %self.pattern_type(), %direction, "detector declined"),
        }
        pattern
    }
}

/// Numbers of every non-empty value, or `None` if any non-empty value is
/// not numeric.
pub(crate) fn numeric_values(values: &[Value]) -> Option<Vec<f64>> {
    values
        .iter()
        .filter(|v| !v.is_empty())
        .map(Value::as_number)
        .collect()
}

/// Loose equality for detector checks: relative to the magnitude involved.
pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= b.abs().max(a.abs()) * 1e-9 + 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priorities_descend() {
        let priorities: Vec<u32> = Detector::ALL.iter().map(Detector::priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn test_for_type_round_trip() {
        for detector in Detector::ALL {
            assert_eq!(Detector::for_type(detector.pattern_type()), detector);
        }
    }

    #[test]
    fn test_numeric_values_skips_empty() {
        let values = vec![Value::from(1.0), Value::Empty, Value::from("2")];
        assert_eq!(numeric_values(&values), Some(vec![1.0, 2.0]));
        let values = vec![Value::from(1.0), Value::from("x")];
        assert_eq!(numeric_values(&values), None);
    }
}
