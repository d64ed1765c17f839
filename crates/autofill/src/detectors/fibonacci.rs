//! Fibonacci series: classic, started at a later index, or scaled.

use gridfill_primitives::{format_number, Value};

use super::numeric_values;
use crate::pattern::{Generator, Pattern, PatternType};

const CLASSIC_STARTS: std::ops::RangeInclusive<u64> = 1..=5;
const MAX_START: u64 = 20;
const COMMON_MULTIPLIERS: [f64; 6] = [2.0, 3.0, 5.0, 10.0, 0.5, 0.1];
const MIN_CONFIDENCE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Classic,
    Shifted,
    Scaled,
}

impl Variant {
    fn as_str(self) -> &'static str {
        match self {
            Variant::Classic => "classic",
            Variant::Shifted => "shifted",
            Variant::Scaled => "scaled",
        }
    }

    fn base_confidence(self) -> f64 {
        match self {
            Variant::Classic => 0.75,
            Variant::Shifted => 0.7,
            Variant::Scaled => 0.65,
        }
    }
}

/// F(n) with F(0) = 0, F(1) = 1; `None` once it no longer fits in a u128.
pub fn fib(n: u64) -> Option<u128> {
    let (mut a, mut b) = (0u128, 1u128);
    for _ in 0..n {
        let next = a.checked_add(b)?;
        a = b;
        b = next;
    }
    Some(a)
}

pub fn detect(values: &[Value]) -> Option<Pattern> {
    let numbers = numeric_values(values)?;
    if numbers.len() < 3 {
        return None;
    }

    let (variant, multiplier, start) = find_match(&numbers)?;
    let mut confidence =
        variant.base_confidence() + (0.05 * (numbers.len() - 3) as f64).min(0.15);
    if multiplier.abs() > 100.0 {
        confidence -= 0.2;
    }
    if confidence < MIN_CONFIDENCE {
        return None;
    }

    let description = if variant == Variant::Scaled {
        format!("Fibonacci sequence scaled by {}", format_number(multiplier))
    } else {
        "Fibonacci sequence".to_string()
    };
    Some(
        Pattern::new(
            PatternType::Fibonacci,
            confidence,
            description,
            Generator::Fibonacci {
                multiplier,
                next_index: start + numbers.len() as u64,
            },
        )
        .with_meta("variant", variant.as_str())
        .with_meta("multiplier", multiplier)
        .with_meta("startIndex", start),
    )
}

/// Unscaled matches win over scaled ones, and small start indices over
/// large ones.
fn find_match(numbers: &[f64]) -> Option<(Variant, f64, u64)> {
    if let Some(start) = CLASSIC_STARTS.find(|&start| matches(numbers, 1.0, start)) {
        return Some((Variant::Classic, 1.0, start));
    }
    if let Some(start) = (0..=MAX_START)
        .filter(|start| !CLASSIC_STARTS.contains(start))
        .find(|&start| matches(numbers, 1.0, start))
    {
        return Some((Variant::Shifted, 1.0, start));
    }
    for multiplier in COMMON_MULTIPLIERS {
        if let Some(start) = (0..=MAX_START).find(|&start| matches(numbers, multiplier, start)) {
            return Some((Variant::Scaled, multiplier, start));
        }
    }
    for start in 1..=MAX_START {
        let term = fib(start)? as f64;
        let multiplier = numbers[0] / term;
        if multiplier.abs() < 1e-12 || multiplier == 1.0 {
            continue;
        }
        if matches(numbers, multiplier, start) {
            return Some((Variant::Scaled, multiplier, start));
        }
    }
    None
}

fn matches(numbers: &[f64], multiplier: f64, start: u64) -> bool {
    numbers.iter().enumerate().all(|(i, &n)| {
        fib(start + i as u64).is_some_and(|term| {
            let expected = multiplier * term as f64;
            (expected - n).abs() <= (n.abs() * 1e-6).max(1e-9)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Vec<Value> {
        values.iter().map(|n| Value::Number(*n)).collect()
    }

    fn generated(pattern: &Pattern, count: usize) -> Vec<Value> {
        (0..count).map(|i| pattern.generate(&[], i).unwrap()).collect()
    }

    #[test]
    fn test_fib() {
        let first: Vec<u128> = (0..10).filter_map(fib).collect();
        assert_eq!(first, vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
        assert!(fib(186).is_some());
        assert!(fib(190).is_none());
    }

    #[test]
    fn test_classic() {
        let pattern = detect(&nums(&[1.0, 1.0, 2.0, 3.0, 5.0])).unwrap();
        assert_eq!(pattern.metadata["variant"], "classic");
        assert_eq!(pattern.metadata["startIndex"], 1);
        assert_eq!(generated(&pattern, 3), nums(&[8.0, 13.0, 21.0]));
    }

    #[test]
    fn test_shifted_start() {
        let pattern = detect(&nums(&[89.0, 144.0, 233.0])).unwrap();
        assert_eq!(pattern.metadata["variant"], "shifted");
        assert_eq!(generated(&pattern, 1), nums(&[377.0]));
    }

    #[test]
    fn test_scaled() {
        let pattern = detect(&nums(&[2.0, 2.0, 4.0, 6.0])).unwrap();
        assert_eq!(pattern.metadata["variant"], "scaled");
        assert_eq!(pattern.metadata["multiplier"], 2.0);
        assert_eq!(generated(&pattern, 2), nums(&[10.0, 16.0]));

        let pattern = detect(&nums(&[7.0, 14.0, 21.0, 35.0])).unwrap();
        assert_eq!(pattern.metadata["multiplier"], 7.0);
        assert_eq!(generated(&pattern, 1), nums(&[56.0]));
    }

    #[test]
    fn test_rejects_powers_of_two() {
        assert!(detect(&nums(&[2.0, 4.0, 8.0, 16.0])).is_none());
    }

    #[test]
    fn test_rejects_short_and_flat_input() {
        assert!(detect(&nums(&[1.0, 1.0])).is_none());
        assert!(detect(&nums(&[0.0, 0.0, 0.0])).is_none());
        assert!(detect(&nums(&[1.0, 1.0, 1.0])).is_none());
    }

    #[test]
    fn test_large_multiplier_penalized() {
        let plain = detect(&nums(&[1.0, 2.0, 3.0, 5.0, 8.0, 13.0])).unwrap();
        let big = detect(&nums(&[1000.0, 2000.0, 3000.0, 5000.0, 8000.0, 13000.0])).unwrap();
        assert_eq!(big.metadata["multiplier"], 1000.0);
        assert!(big.confidence < plain.confidence);
    }
}
