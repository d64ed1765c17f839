//! Constant-step numeric series.

use gridfill_primitives::{format_number, Value};

use super::numeric_values;
use crate::pattern::{Generator, Pattern, PatternType};

const BASE_CONFIDENCE: f64 = 0.6;
const MIN_CONFIDENCE: f64 = 0.5;

pub fn detect(values: &[Value]) -> Option<Pattern> {
    let numbers = numeric_values(values)?;
    if numbers.len() < 2 {
        return None;
    }

    let step = numbers[1] - numbers[0];
    let tolerance = step.abs() * 0.001 + 0.001;
    if numbers
        .windows(2)
        .any(|pair| ((pair[1] - pair[0]) - step).abs() > tolerance)
    {
        return None;
    }

    let mut confidence = BASE_CONFIDENCE + (0.1 * (numbers.len() - 2) as f64).min(0.3);
    if is_nice_step(step) {
        confidence += 0.1;
    }
    if step.abs() < 1e-10 {
        confidence -= 0.3;
    }
    if confidence < MIN_CONFIDENCE {
        return None;
    }

    let last = *numbers.last()?;
    Some(
        Pattern::new(
            PatternType::Linear,
            confidence,
            format!("Linear sequence with step {}", format_number(step)),
            Generator::Linear { last, step },
        )
        .with_meta("step", step),
    )
}

/// Whole numbers and fractions with at most two decimals.
fn is_nice_step(step: f64) -> bool {
    let hundredths = step * 100.0;
    (hundredths - hundredths.round()).abs() < 1e-9
}
