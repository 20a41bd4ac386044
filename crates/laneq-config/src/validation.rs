//! Configuration validation module.
//!
//! Collects every problem in a loaded configuration so startup fails once
//! with the full list instead of one error per restart.

use crate::AppConfig;
use laneq_jobs::{JobsConfig, RetryStrategy};
use std::fmt;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Worker pool needs at least one worker.
    ZeroConcurrency,
    /// Interval must be positive.
    NonPositiveInterval {
        /// Config key of the interval.
        name: String,
        /// Configured value.
        value: u64,
    },
    /// Exponential backoff multiplier below 1 would shrink delays.
    InvalidMultiplier {
        /// Configured multiplier.
        value: f64,
    },
    /// Maximum retry delay is shorter than the backoff unit.
    MaxDelayBelowUnit {
        /// Configured cap.
        max_delay_ms: u64,
        /// Configured backoff unit.
        unit_ms: u64,
    },
    /// Log level is invalid.
    InvalidLogLevel {
        /// Configured level.
        value: String,
    },
    /// Seed job priority is not high, medium or low.
    InvalidSeedPriority {
        /// Position in the seed list.
        index: usize,
        /// Configured priority.
        value: String,
    },
    /// Seed job has an empty type.
    EmptySeedType {
        /// Position in the seed list.
        index: usize,
    },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroConcurrency => write!(f, "Worker concurrency must be at least 1"),
            Self::NonPositiveInterval { name, value } => {
                write!(f, "Interval '{}' must be positive, got {}", name, value)
            }
            Self::InvalidMultiplier { value } => {
                write!(f, "Invalid backoff multiplier: {} (must be >= 1.0)", value)
            }
            Self::MaxDelayBelowUnit { max_delay_ms, unit_ms } => {
                write!(
                    f,
                    "Maximum retry delay ({} ms) is shorter than the backoff unit ({} ms)",
                    max_delay_ms, unit_ms
                )
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
            Self::InvalidSeedPriority { index, value } => {
                write!(
                    f,
                    "Seed job {} has invalid priority '{}' (valid: high, medium, low)",
                    index, value
                )
            }
            Self::EmptySeedType { index } => write!(f, "Seed job {} has an empty type", index),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of configuration validation containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    /// Returns true if validation passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the validation errors.
    pub fn errors(&self) -> &[ConfigValidationError] {
        &self.errors
    }

    /// Converts to Result, returning Err with all errors if any exist.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::default();

        Self::validate_jobs(&config.jobs, &mut result);
        Self::validate_logging(&config.logging, &mut result);
        Self::validate_seed(config, &mut result);

        result.into_result()
    }

    fn validate_jobs(config: &JobsConfig, result: &mut ValidationResult) {
        if config.worker.concurrency == 0 {
            result.add_error(ConfigValidationError::ZeroConcurrency);
        }

        for (name, value) in [
            ("jobs.worker.idle_interval_ms", config.worker.idle_interval_ms),
            ("jobs.worker.shutdown_timeout_secs", config.worker.shutdown_timeout_secs),
            ("jobs.scheduler.poll_interval_ms", config.scheduler.poll_interval_ms),
        ] {
            if value == 0 {
                result.add_error(ConfigValidationError::NonPositiveInterval {
                    name: name.to_string(),
                    value,
                });
            }
        }

        let retry = &config.retry;
        if retry.strategy == RetryStrategy::Exponential && !(retry.multiplier >= 1.0) {
            result.add_error(ConfigValidationError::InvalidMultiplier {
                value: retry.multiplier,
            });
        }
        if retry.max_delay_ms < retry.unit_ms {
            result.add_error(ConfigValidationError::MaxDelayBelowUnit {
                max_delay_ms: retry.max_delay_ms,
                unit_ms: retry.unit_ms,
            });
        }
    }

    fn validate_logging(config: &laneq_core::LoggingConfig, result: &mut ValidationResult) {
        let level = config.level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.level.clone(),
            });
        }
    }

    fn validate_seed(config: &AppConfig, result: &mut ValidationResult) {
        for (index, seed) in config.seed.iter().enumerate() {
            if seed.priority().is_err() {
                result.add_error(ConfigValidationError::InvalidSeedPriority {
                    index,
                    value: seed.priority.clone(),
                });
            }
            if seed.job_type.trim().is_empty() {
                result.add_error(ConfigValidationError::EmptySeedType { index });
            }
        }
    }
}

/// Formats validation errors for display.
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SeedJob;
    use std::collections::HashMap;

    fn seed(priority: &str, job_type: &str) -> SeedJob {
        SeedJob {
            id: None,
            job_type: job_type.to_string(),
            priority: priority.to_string(),
            payload: HashMap::new(),
            max_retries: None,
            delay_ms: 0,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let mut config = AppConfig::default();
        config.seed.push(seed("High", "email"));
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_zero_concurrency() {
        let mut config = AppConfig::default();
        config.jobs.worker.concurrency = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors, vec![ConfigValidationError::ZeroConcurrency]);
    }

    #[test]
    fn test_zero_poll_interval() {
        let mut config = AppConfig::default();
        config.jobs.scheduler.poll_interval_ms = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigValidationError::NonPositiveInterval { name, .. }
                if name == "jobs.scheduler.poll_interval_ms"
        )));
    }

    #[test]
    fn test_invalid_multiplier() {
        let mut config = AppConfig::default();
        config.jobs.retry.multiplier = 0.5;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigValidationError::InvalidMultiplier { .. })));
    }

    #[test]
    fn test_multiplier_ignored_for_fixed_strategy() {
        let mut config = AppConfig::default();
        config.jobs.retry.strategy = RetryStrategy::Fixed;
        config.jobs.retry.multiplier = 0.0;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigValidationError::InvalidLogLevel { .. })));
    }

    #[test]
    fn test_invalid_seed_priority() {
        let mut config = AppConfig::default();
        config.seed.push(seed("low", "email"));
        config.seed.push(seed("urgent", ""));

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ConfigValidationError::InvalidSeedPriority {
                    index: 1,
                    value: "urgent".to_string()
                },
                ConfigValidationError::EmptySeedType { index: 1 },
            ]
        );
    }

    #[test]
    fn test_multiple_errors() {
        let mut config = AppConfig::default();
        config.jobs.worker.concurrency = 0;
        config.jobs.worker.idle_interval_ms = 0;
        config.logging.level = "loud".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_format_validation_errors() {
        let errors = vec![
            ConfigValidationError::ZeroConcurrency,
            ConfigValidationError::InvalidLogLevel {
                value: "loud".to_string(),
            },
        ];

        let formatted = format_validation_errors(&errors);
        assert!(formatted.contains("Configuration validation failed"));
        assert!(formatted.contains("1. Worker concurrency must be at least 1"));
        assert!(formatted.contains("2. Invalid log level: 'loud'"));
    }
}
