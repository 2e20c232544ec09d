use std::{fs, path::Path, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Tunables shared by every agent of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// Routed messages allowed before a run is declared inconclusive.
    pub max_iterations: usize,
    pub replan_confidence_threshold: f64,
    /// Confidence of the "could not verify" heuristic verdict.
    pub heuristic_confidence: f64,
    pub heuristic_pass_confidence: f64,
    pub max_recovery_steps: usize,
    pub settle_time_ms: u64,
    pub default_step_timeout_secs: u64,
    pub log_level: String,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            replan_confidence_threshold: 0.7,
            heuristic_confidence: 0.3,
            heuristic_pass_confidence: 0.8,
            max_recovery_steps: 3,
            settle_time_ms: 500,
            default_step_timeout_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

impl QaConfig {
    /// Parse a (possibly partial) JSON document over the defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig("max_iterations must be at least 1".to_string()));
        }
        for (name, value) in [
            ("replan_confidence_threshold", self.replan_confidence_threshold),
            ("heuristic_confidence", self.heuristic_confidence),
            ("heuristic_pass_confidence", self.heuristic_pass_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        Ok(())
    }

    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.settle_time_ms)
    }

    pub fn default_step_timeout(&self) -> Duration {
        Duration::from_secs(self.default_step_timeout_secs)
    }
}

/// Per-run information handed to every agent on initialize.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub goal: String,
    pub config: Arc<QaConfig>,
    pub started_at: DateTime<Utc>,
    pub version: String,
}

impl RunContext {
    pub fn new(goal: impl Into<String>, config: Arc<QaConfig>) -> Self {
        Self {
            run_id: Uuid::new_v4().simple().to_string(),
            goal: goal.into(),
            config,
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = QaConfig::from_json_str(r#"{"max_iterations": 4, "settle_time_ms": 0}"#).unwrap();
        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.settle_time(), Duration::ZERO);
        assert_eq!(config.replan_confidence_threshold, 0.7);
        assert_eq!(config.heuristic_confidence, 0.3);
        assert_eq!(config.default_step_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(QaConfig::from_json_str("{max_iterations: 4").is_err());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let err = QaConfig::from_json_str(r#"{"replan_confidence_threshold": 1.5}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref msg) if msg.contains("replan_confidence_threshold")));
        assert!(matches!(
            QaConfig::from_json_str(r#"{"max_iterations": 0}"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = QaConfig::from_file("/nonexistent/rusqa.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
