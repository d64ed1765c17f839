//! Fallback: repeat the source values.

use gridfill_primitives::Value;

use crate::pattern::{Generator, Pattern, PatternType};

pub const COPY_CONFIDENCE: f64 = 0.3;

pub fn detect(values: &[Value]) -> Option<Pattern> {
    if values.iter().all(Value::is_empty) {
        return None;
    }
    Some(
        Pattern::new(
            PatternType::Copy,
            COPY_CONFIDENCE,
            "Repeat source values",
            Generator::Copy,
        )
        .with_meta("cycleLength", values.len()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_matches_anything_non_empty() {
        let values = vec![Value::from("=A1*2"), Value::Empty, Value::from(true)];
        let pattern = detect(&values).unwrap();
        assert_eq!(pattern.confidence, COPY_CONFIDENCE);
        assert_eq!(pattern.generate(&values, 2), Ok(Value::from(true)));
        assert_eq!(pattern.generate(&values, 3), Ok(Value::from("=A1*2")));
        assert!(detect(&[Value::Empty, Value::from("")]).is_none());
    }
}
