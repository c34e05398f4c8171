//! Configuration management for the reasoning library.
//!
//! Runtime-tunable knobs (logging, input limits) load from `REASONING_*`
//! environment variables via [`Config::from_env`]. The empirically chosen
//! confidence and tolerance constants are carried as named constants so
//! tests pin them in one place.

use std::env;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::ReasoningError;

// ============================================================================
// Confidence and tolerance constants
// ============================================================================

/// Lower bound for every confidence score.
pub const CONFIDENCE_MIN: f64 = 0.0;
/// Upper bound for every confidence score.
pub const CONFIDENCE_MAX: f64 = 1.0;

/// Base confidence for a detected arithmetic progression.
pub const BASE_CONFIDENCE_ARITHMETIC: f64 = 0.95;
/// Base confidence for a detected geometric progression.
pub const BASE_CONFIDENCE_GEOMETRIC: f64 = 0.9;
/// Base confidence when describing (rather than predicting) a pattern.
pub const BASE_CONFIDENCE_PATTERN_DESCRIPTION: f64 = 0.97;
/// Base confidence for additive recursive patterns (Fibonacci family).
pub const BASE_CONFIDENCE_RECURSIVE: f64 = 0.85;
/// Base confidence for a classic Lucas sequence (seeds 2, 1).
pub const BASE_CONFIDENCE_LUCAS_CLASSIC: f64 = 0.95;
/// Base confidence for a Tribonacci pattern.
pub const BASE_CONFIDENCE_TRIBONACCI: f64 = 0.8;
/// Base confidence for a polynomial pattern.
pub const BASE_CONFIDENCE_POLYNOMIAL: f64 = 0.8;
/// Hard cap on exponential-fit confidence.
pub const EXPONENTIAL_CONFIDENCE_CAP: f64 = 0.9;
/// Base confidence for abductive hypotheses.
pub const BASE_CONFIDENCE_ABDUCTIVE: f64 = 0.7;
/// Confidence assigned to a chain-of-thought step when none is supplied.
pub const DEFAULT_STEP_CONFIDENCE: f64 = 0.8;

/// Relative tolerance for arithmetic/geometric closeness checks.
pub const RELATIVE_TOLERANCE_DEFAULT: f64 = 0.2;
/// Absolute tolerance for arithmetic/geometric closeness checks.
pub const ABSOLUTE_TOLERANCE_DEFAULT: f64 = 1e-8;
/// Relative tolerance for the exponential fit check.
pub const EXPONENTIAL_RELATIVE_TOLERANCE: f64 = 0.1;
/// Absolute tolerance for recursive pattern matching.
pub const RECURSIVE_MATCH_TOLERANCE: f64 = 1e-10;
/// Absolute tolerance for constant finite-difference levels.
pub const POLYNOMIAL_LEVEL_TOLERANCE: f64 = 1e-6;
/// Bound applied to consecutive ratios before further use.
pub const RATIO_CLAMP_LIMIT: f64 = 1e6;
/// Threshold below which a mean is treated as numerically zero.
pub const NUMERICAL_STABILITY_THRESHOLD: f64 = 1e-10;
/// Decay applied to the coefficient of variation in quality scoring.
pub const COEFFICIENT_OF_VARIATION_DECAY: f64 = 2.0;

/// Complexity score for arithmetic progressions (the simplest family).
pub const COMPLEXITY_SCORE_ARITHMETIC: f64 = 0.0;
/// Complexity score for geometric progressions.
pub const COMPLEXITY_SCORE_GEOMETRIC: f64 = 0.1;
/// Complexity score for recursive patterns.
pub const COMPLEXITY_SCORE_RECURSIVE: f64 = 0.3;
/// Per-degree complexity factor for polynomial patterns.
pub const COMPLEXITY_POLYNOMIAL_DEGREE_FACTOR: f64 = 0.15;

/// Points needed for full arithmetic data sufficiency.
pub const DATA_SUFFICIENCY_MINIMUM_ARITHMETIC: f64 = 3.0;
/// Points needed for full geometric data sufficiency.
pub const DATA_SUFFICIENCY_MINIMUM_GEOMETRIC: f64 = 4.0;
/// Points needed for full recursive data sufficiency.
pub const DATA_SUFFICIENCY_MINIMUM_RECURSIVE: f64 = 5.0;
/// Extra points beyond the degree needed for polynomial sufficiency.
pub const DATA_SUFFICIENCY_POLYNOMIAL_EXTRA: usize = 3;

/// Quality factor used when too few residuals exist to assess variance.
pub const PATTERN_QUALITY_MINIMAL_DATA: f64 = 0.5;
/// Floor for the pattern-quality factor of a detected pattern.
pub const PATTERN_QUALITY_FLOOR: f64 = 0.1;

/// Occam's-razor penalty per assumption in hypothesis scoring.
pub const SIMPLICITY_ASSUMPTION_PENALTY: f64 = 0.3;
/// Testable predictions needed for full specificity.
pub const SPECIFICITY_PREDICTIONS_MINIMUM: f64 = 2.0;
/// Confidence multiplier weight for evidence support.
pub const EVIDENCE_SUPPORT_MULTIPLIER: f64 = 0.5;
/// Evidence support above which a hypothesis is "supported".
pub const EVIDENCE_SUPPORT_MODERATE_THRESHOLD: f64 = 0.4;
/// Evidence support above which a hypothesis is "strongly supported".
pub const EVIDENCE_SUPPORT_HIGH_THRESHOLD: f64 = 0.7;
/// Observations a keyword must appear in to count as a theme.
pub const THEME_FREQUENCY_THRESHOLD: usize = 2;
/// Maximum number of themes returned from observations.
pub const MAX_THEMES_RETURNED: usize = 5;
/// Keywords shorter than or equal to this many characters are dropped.
pub const MIN_KEYWORD_LENGTH: usize = 2;
/// Length limit applied to keywords inserted into templates.
pub const KEYWORD_LENGTH_LIMIT: usize = 100;

// ============================================================================
// Runtime configuration
// ============================================================================

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Input size limits (DoS guards).
    pub limits: LimitsConfig,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default log level filter when `RUST_LOG` is unset.
    pub level: String,
    /// Log output format.
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable output.
    Pretty,
    /// Newline-delimited JSON output.
    Json,
}

/// Input size limits protecting against resource-exhaustion inputs
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Maximum number of elements in a numeric sequence.
    pub max_sequence_length: usize,
    /// Maximum absolute value of a sequence element.
    pub value_magnitude_limit: f64,
    /// Maximum length of a single observation string.
    pub max_observation_length: usize,
    /// Maximum length of a context string.
    pub max_context_length: usize,
    /// Maximum number of hypotheses returned by generation.
    pub max_hypotheses: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_sequence_length: 10_000,
            value_magnitude_limit: 1e15,
            max_observation_length: 10_000,
            max_context_length: 50_000,
            max_hypotheses: 5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Absent variables fall back to defaults; present but unparseable
    /// values are configuration errors rather than silent fallbacks.
    pub fn from_env() -> Result<Self, ReasoningError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let logging = LoggingConfig {
            level: env::var("REASONING_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("REASONING_LOG_FORMAT") {
                Ok(value) => match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    other => {
                        return Err(ReasoningError::Config {
                            message: format!(
                                "REASONING_LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                                other
                            ),
                        })
                    }
                },
                Err(_) => LogFormat::Pretty,
            },
        };

        let defaults = LimitsConfig::default();
        let limits = LimitsConfig {
            max_sequence_length: parse_env("REASONING_MAX_SEQUENCE_LENGTH")?
                .unwrap_or(defaults.max_sequence_length),
            value_magnitude_limit: parse_env("REASONING_VALUE_MAGNITUDE_LIMIT")?
                .unwrap_or(defaults.value_magnitude_limit),
            max_observation_length: parse_env("REASONING_MAX_OBSERVATION_LENGTH")?
                .unwrap_or(defaults.max_observation_length),
            max_context_length: parse_env("REASONING_MAX_CONTEXT_LENGTH")?
                .unwrap_or(defaults.max_context_length),
            max_hypotheses: parse_env("REASONING_MAX_HYPOTHESES")?
                .unwrap_or(defaults.max_hypotheses),
        };

        Ok(Config { logging, limits })
    }
}

/// Parse an optional environment variable, erroring on unparseable values.
fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ReasoningError> {
    match env::var(name) {
        Ok(value) => value.parse::<T>().map(Some).map_err(|_| ReasoningError::Config {
            message: format!("{} has invalid value '{}'", name, value),
        }),
        Err(_) => Ok(None),
    }
}

/// Initialize tracing/logging
pub fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.max_sequence_length, 10_000);
        assert_eq!(limits.max_hypotheses, 5);
        assert!(limits.value_magnitude_limit > 1e14);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_confidence_constants_within_bounds() {
        for base in [
            BASE_CONFIDENCE_ARITHMETIC,
            BASE_CONFIDENCE_GEOMETRIC,
            BASE_CONFIDENCE_PATTERN_DESCRIPTION,
            BASE_CONFIDENCE_RECURSIVE,
            BASE_CONFIDENCE_LUCAS_CLASSIC,
            BASE_CONFIDENCE_TRIBONACCI,
            BASE_CONFIDENCE_POLYNOMIAL,
            BASE_CONFIDENCE_ABDUCTIVE,
            DEFAULT_STEP_CONFIDENCE,
        ] {
            assert!((CONFIDENCE_MIN..=CONFIDENCE_MAX).contains(&base));
        }
    }
}
