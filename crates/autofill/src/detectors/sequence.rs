//! Well-known integer sequences (squares, primes, factorials, ...).

use std::sync::OnceLock;

use gridfill_primitives::Value;
use serde::{Deserialize, Serialize};

use super::numeric_values;
use crate::error::GenerateError;
use crate::pattern::{Generator, Pattern, PatternType};

const MAX_START: u64 = 20;
const MIN_MATCHES: usize = 3;
const MIN_CONFIDENCE: f64 = 0.6;
const LARGE_VALUE: u64 = 1_000_000;
const MAX_FACTORIAL_INDEX: u64 = 20;
const MAX_CATALAN_INDEX: u64 = 30;
const MAX_PRIME_INDEX: u64 = 100_000;
/// Covers the prime at `MAX_PRIME_INDEX` (1 299 721).
const PRIME_SIEVE_LIMIT: usize = 1_300_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    Squares,
    Cubes,
    Triangular,
    Primes,
    Factorials,
    PowersOfTwo,
    PowersOfThree,
    Pentagonal,
    Hexagonal,
    Catalan,
    Lucas,
}

impl SequenceKind {
    pub const ALL: [SequenceKind; 11] = [
        SequenceKind::Squares,
        SequenceKind::Cubes,
        SequenceKind::Triangular,
        SequenceKind::Primes,
        SequenceKind::Factorials,
        SequenceKind::PowersOfTwo,
        SequenceKind::PowersOfThree,
        SequenceKind::Pentagonal,
        SequenceKind::Hexagonal,
        SequenceKind::Catalan,
        SequenceKind::Lucas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceKind::Squares => "squares",
            SequenceKind::Cubes => "cubes",
            SequenceKind::Triangular => "triangular",
            SequenceKind::Primes => "primes",
            SequenceKind::Factorials => "factorials",
            SequenceKind::PowersOfTwo => "powers_of_two",
            SequenceKind::PowersOfThree => "powers_of_three",
            SequenceKind::Pentagonal => "pentagonal",
            SequenceKind::Hexagonal => "hexagonal",
            SequenceKind::Catalan => "catalan",
            SequenceKind::Lucas => "lucas",
        }
    }

    fn well_known(self) -> bool {
        matches!(
            self,
            SequenceKind::Squares
                | SequenceKind::Cubes
                | SequenceKind::Primes
                | SequenceKind::Factorials
        )
    }

    /// The `n`-th term, 0-based (squares start 0, 1, 4; primes start 2, 3, 5).
    pub fn term(&self, n: u64) -> Result<u64, GenerateError> {
        let overflow = || GenerateError::Overflow {
            sequence: self.as_str(),
            index: n,
        };
        match self {
            SequenceKind::Squares => n.checked_mul(n).ok_or_else(overflow),
            SequenceKind::Cubes => n
                .checked_mul(n)
                .and_then(|sq| sq.checked_mul(n))
                .ok_or_else(overflow),
            SequenceKind::Triangular => n
                .checked_mul(n + 1)
                .map(|v| v / 2)
                .ok_or_else(overflow),
            SequenceKind::Pentagonal => {
                if n == 0 {
                    return Ok(0);
                }
                n.checked_mul(3)
                    .and_then(|v| v.checked_mul(n).map(|v| v - n))
                    .map(|v| v / 2)
                    .ok_or_else(overflow)
            }
            SequenceKind::Hexagonal => {
                if n == 0 {
                    return Ok(0);
                }
                n.checked_mul(2)
                    .and_then(|v| v.checked_mul(n).map(|v| v - n))
                    .ok_or_else(overflow)
            }
            SequenceKind::PowersOfTwo => u32::try_from(n)
                .ok()
                .and_then(|e| 2u64.checked_pow(e))
                .ok_or_else(overflow),
            SequenceKind::PowersOfThree => u32::try_from(n)
                .ok()
                .and_then(|e| 3u64.checked_pow(e))
                .ok_or_else(overflow),
            SequenceKind::Factorials => {
                if n > MAX_FACTORIAL_INDEX {
                    return Err(overflow());
                }
                Ok((1..=n).product())
            }
            SequenceKind::Catalan => {
                if n > MAX_CATALAN_INDEX {
                    return Err(overflow());
                }
                let mut c = 1u64;
                for i in 0..n {
                    c = c * 2 * (2 * i + 1) / (i + 2);
                }
                Ok(c)
            }
            SequenceKind::Lucas => {
                let (mut a, mut b) = (2u64, 1u64);
                for _ in 0..n {
                    let next = a.checked_add(b).ok_or_else(overflow)?;
                    a = b;
                    b = next;
                }
                Ok(a)
            }
            SequenceKind::Primes => {
                if n > MAX_PRIME_INDEX {
                    return Err(overflow());
                }
                let index = usize::try_from(n).map_err(|_| overflow())?;
                primes().get(index).copied().ok_or_else(overflow)
            }
        }
    }
}

/// Every prime below `PRIME_SIEVE_LIMIT`, sieved once per process.
fn primes() -> &'static [u64] {
    static PRIMES: OnceLock<Vec<u64>> = OnceLock::new();
    PRIMES.get_or_init(|| {
        let mut composite = vec![false; PRIME_SIEVE_LIMIT];
        let mut primes = Vec::new();
        for candidate in 2..PRIME_SIEVE_LIMIT {
            if composite[candidate] {
                continue;
            }
            primes.push(candidate as u64);
            if candidate <= PRIME_SIEVE_LIMIT / candidate {
                for multiple in (candidate * candidate..PRIME_SIEVE_LIMIT).step_by(candidate) {
                    composite[multiple] = true;
                }
            }
        }
        primes
    })
}

pub fn detect(values: &[Value]) -> Option<Pattern> {
    let numbers = numeric_values(values)?;
    if numbers.len() < MIN_MATCHES {
        return None;
    }
    let integers: Vec<u64> = numbers
        .iter()
        .map(|&n| (n >= 0.0 && n.fract() == 0.0 && n < 9.0e18).then_some(n as u64))
        .collect::<Option<_>>()?;
    let largest = integers.iter().copied().max().unwrap_or(0);

    let mut best: Option<(SequenceKind, u64, f64)> = None;
    for kind in SequenceKind::ALL {
        let Some(start) = (0..=MAX_START).find(|&start| matches(kind, &integers, start)) else {
            continue;
        };
        let confidence = score(kind, start, integers.len(), largest);
        if best.map_or(true, |(_, _, current)| confidence > current) {
            best = Some((kind, start, confidence));
        }
    }

    let (kind, start, confidence) = best?;
    if confidence < MIN_CONFIDENCE {
        return None;
    }
    Some(
        Pattern::new(
            PatternType::CustomSequence,
            confidence,
            format!("Sequence of {}", kind.as_str().replace('_', " ")),
            Generator::Sequence {
                sequence: kind,
                next_index: start + integers.len() as u64,
            },
        )
        .with_meta("sequenceType", kind.as_str())
        .with_meta("startIndex", start),
    )
}

fn matches(kind: SequenceKind, integers: &[u64], start: u64) -> bool {
    integers
        .iter()
        .enumerate()
        .all(|(i, &value)| kind.term(start + i as u64) == Ok(value))
}

fn score(kind: SequenceKind, start: u64, samples: usize, largest: u64) -> f64 {
    let mut confidence = 0.65 + if kind.well_known() { 0.15 } else { 0.05 };
    confidence += (0.05 * (samples - MIN_MATCHES) as f64).min(0.1);
    if start <= 2 {
        confidence += 0.05;
    }
    if largest > LARGE_VALUE {
        confidence -= 0.15;
    }
    confidence
}
