//! Engine thresholds and per-operation options.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pattern::PatternType;

/// A detector must score strictly above this to qualify.
pub const MIN_CONFIDENCE: f64 = 0.5;
/// Confidence gap at which a runner-up stops counting as ambiguous.
pub const AMBIGUITY_WINDOW: f64 = 0.5;
/// Largest reduction an ambiguous runner-up applies to the winner.
pub const AMBIGUITY_PENALTY: f64 = 0.2;
/// Reported confidence never drops below this.
pub const CONFIDENCE_FLOOR: f64 = 0.1;

/// Heuristic thresholds for pattern selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    pub min_confidence: f64,
    pub ambiguity_window: f64,
    pub ambiguity_penalty: f64,
    pub confidence_floor: f64,
    /// Enabled detectors. Order is irrelevant; detectors always run by priority.
    pub detectors: Vec<PatternType>,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            min_confidence: MIN_CONFIDENCE,
            ambiguity_window: AMBIGUITY_WINDOW,
            ambiguity_penalty: AMBIGUITY_PENALTY,
            confidence_floor: CONFIDENCE_FLOOR,
            detectors: PatternType::ALL.to_vec(),
        }
    }
}

impl FillConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("min_confidence", self.min_confidence),
            ("ambiguity_penalty", self.ambiguity_penalty),
            ("confidence_floor", self.confidence_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }
        if !self.ambiguity_window.is_finite() || self.ambiguity_window <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "ambiguity_window must be positive, got {}",
                self.ambiguity_window
            )));
        }
        if self.detectors.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one detector must be enabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_enabled(&self, pattern_type: PatternType) -> bool {
        self.detectors.contains(&pattern_type)
    }
}

/// Options carried by a single fill operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillOptions {
    /// Force this detector instead of picking the best match.
    pub pattern: Option<PatternType>,
    /// Pin formula references that would leave the sheet to its edge.
    pub clamp_to_bounds: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_matches_constants() {
        let config = FillConfig::default();
        assert_eq!(config.min_confidence, 0.5);
        assert_eq!(config.ambiguity_penalty, 0.2);
        assert_eq!(config.detectors.len(), PatternType::ALL.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_str_partial() {
        let config = FillConfig::from_json_str(r#"{"min_confidence": 0.7}"#).unwrap();
        assert_eq!(config.min_confidence, 0.7);
        assert_eq!(config.ambiguity_window, AMBIGUITY_WINDOW);

        let config =
            FillConfig::from_json_str(r#"{"detectors": ["linear", "copy"]}"#).unwrap();
        assert!(config.is_enabled(PatternType::Linear));
        assert!(!config.is_enabled(PatternType::Date));
    }

    #[test]
    fn test_from_json_str_rejects_bad_values() {
        assert!(matches!(
            FillConfig::from_json_str(r#"{"min_confidence": 1.5}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FillConfig::from_json_str(r#"{"ambiguity_window": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FillConfig::from_json_str(r#"{"detectors": []}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FillConfig::from_json_str("{not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ambiguity_penalty": 0.1}}"#).unwrap();
        let config = FillConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.ambiguity_penalty, 0.1);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            FillConfig::from_json_file(missing),
            Err(ConfigError::Io(_))
        ));
    }
}
