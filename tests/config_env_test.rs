//! Environment-variable configuration tests.
//!
//! These mutate process environment variables, so they run serially.

use serial_test::serial;

use reasoning_kit::config::{Config, LogFormat};

const VARS: &[&str] = &[
    "REASONING_LOG_LEVEL",
    "REASONING_LOG_FORMAT",
    "REASONING_MAX_SEQUENCE_LENGTH",
    "REASONING_VALUE_MAGNITUDE_LIMIT",
    "REASONING_MAX_OBSERVATION_LENGTH",
    "REASONING_MAX_CONTEXT_LENGTH",
    "REASONING_MAX_HYPOTHESES",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_when_env_unset() {
    clear_env();
    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(config.limits.max_sequence_length, 10_000);
    assert_eq!(config.limits.max_hypotheses, 5);
}

#[test]
#[serial]
fn test_overrides_from_env() {
    clear_env();
    std::env::set_var("REASONING_LOG_LEVEL", "debug");
    std::env::set_var("REASONING_LOG_FORMAT", "json");
    std::env::set_var("REASONING_MAX_SEQUENCE_LENGTH", "2048");
    std::env::set_var("REASONING_MAX_HYPOTHESES", "7");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.limits.max_sequence_length, 2048);
    assert_eq!(config.limits.max_hypotheses, 7);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_numeric_value_is_config_error() {
    clear_env();
    std::env::set_var("REASONING_MAX_SEQUENCE_LENGTH", "not-a-number");

    let err = Config::from_env().unwrap_err();
    assert_eq!(err.error_code(), "config_error");
    assert!(err.to_string().contains("REASONING_MAX_SEQUENCE_LENGTH"));

    clear_env();
}

#[test]
#[serial]
fn test_invalid_log_format_is_config_error() {
    clear_env();
    std::env::set_var("REASONING_LOG_FORMAT", "xml");

    let err = Config::from_env().unwrap_err();
    assert!(err.to_string().contains("REASONING_LOG_FORMAT"));

    clear_env();
}

#[test]
#[serial]
fn test_log_format_parse_is_case_insensitive() {
    clear_env();
    std::env::set_var("REASONING_LOG_FORMAT", "JSON");
    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);
    clear_env();
}
