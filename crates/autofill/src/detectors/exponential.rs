//! Geometric series (constant ratio).

use gridfill_primitives::{format_number, Value};

use super::{approx_eq, numeric_values};
use crate::pattern::{Generator, Pattern, PatternType};

const COMMON_BASES: [f64; 5] = [2.0, 3.0, 4.0, 5.0, 10.0];
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
const MIN_CONFIDENCE: f64 = 0.5;

pub fn detect(values: &[Value]) -> Option<Pattern> {
    let numbers = numeric_values(values)?;
    if numbers.len() < 3 || numbers.iter().any(|n| *n == 0.0) {
        return None;
    }

    let ratio = numbers[1] / numbers[0];
    if !ratio.is_finite() || approx_eq(ratio, 1.0) {
        return None;
    }
    let tolerance = ratio.abs() * 0.001 + 0.001;
    if numbers
        .windows(2)
        .any(|pair| (pair[1] / pair[0] - ratio).abs() > tolerance)
    {
        return None;
    }

    let last = *numbers.last()?;
    let mut confidence = 0.7 + (0.05 * (numbers.len() - 3) as f64).min(0.15);
    if ratio.fract() == 0.0 {
        confidence += 0.05;
    }
    let power = power_of_base(numbers[0], ratio);
    if power.is_some() {
        confidence += 0.05;
    }
    if ratio < 0.0 {
        confidence -= 0.2;
    }
    if ratio.abs() > 100.0 || ratio.abs() < 0.01 {
        confidence -= 0.2;
    }
    if (last * ratio).abs() > MAX_SAFE_INTEGER {
        confidence -= 0.3;
    }
    if confidence < MIN_CONFIDENCE {
        return None;
    }

    let mut pattern = Pattern::new(
        PatternType::Exponential,
        confidence,
        format!("Exponential sequence with ratio {}", format_number(ratio)),
        Generator::Exponential { last, ratio },
    )
    .with_meta("ratio", ratio);
    if let Some((base, exponent)) = power {
        pattern = pattern
            .with_meta("base", base)
            .with_meta("startExponent", exponent);
    }
    Some(pattern)
}

/// `(base, e)` when `ratio` is a common base and `first == base^e`.
fn power_of_base(first: f64, ratio: f64) -> Option<(f64, i32)> {
    let base = COMMON_BASES.into_iter().find(|b| approx_eq(ratio, *b))?;
    (0..=60)
        .find(|&e| approx_eq(first, base.powi(e)))
        .map(|e| (base, e))
}
