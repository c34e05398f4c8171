//! Error types and result aliases for the reasoning library.
//!
//! The taxonomy separates recoverable caller mistakes ([`ValidationError`]),
//! inputs that matched a known attack pattern ([`SecurityError`]), tool-spec
//! registration failures ([`ToolSpecError`]) and unexpected internal
//! conditions. Display strings are fixed templates over library-constructed
//! fields; caller-supplied detail maps never reach `Display` and are only
//! available through [`ReasoningError::debug_info`].

use std::collections::BTreeMap;

use thiserror::Error;

use crate::security::{log_security_event, SecurityEventType, SecuritySeverity};

/// Detail keys excluded from debug output unless explicitly requested.
const SENSITIVE_DETAIL_KEYS: &[&str] = &[
    "password",
    "passwd",
    "pwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "credential",
    "credentials",
    "raw_input",
];

/// Application-level errors
#[derive(Debug, Error)]
pub enum ReasoningError {
    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// What failed to load or parse.
        message: String,
    },

    /// Input failed shape, type or range validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Input matched a known attack pattern.
    #[error(transparent)]
    Security(#[from] SecurityError),

    /// Tool specification registration or import failed.
    #[error(transparent)]
    ToolSpec(#[from] ToolSpecError),

    /// Unexpected internal condition.
    #[error("Internal error: {message}")]
    Internal {
        /// Sanitized description of the failure.
        message: String,
    },
}

impl ReasoningError {
    /// Stable machine-readable code for the error category.
    pub fn error_code(&self) -> &'static str {
        match self {
            ReasoningError::Config { .. } => "config_error",
            ReasoningError::Validation(_) => "validation_error",
            ReasoningError::Security(_) => "security_error",
            ReasoningError::ToolSpec(_) => "tool_spec_error",
            ReasoningError::Internal { .. } => "internal_error",
        }
    }

    /// Structured debug payload for diagnostics.
    ///
    /// Detail entries under credential-like keys are withheld unless
    /// `include_sensitive` is set; the default output is safe to log.
    pub fn debug_info(&self, include_sensitive: bool) -> serde_json::Value {
        let mut info = serde_json::Map::new();
        info.insert(
            "error_code".to_string(),
            serde_json::Value::String(self.error_code().to_string()),
        );
        info.insert(
            "message".to_string(),
            serde_json::Value::String(self.to_string()),
        );

        if let ReasoningError::Validation(err) = self {
            let mut details = serde_json::Map::new();
            for (key, value) in &err.details {
                let sensitive = SENSITIVE_DETAIL_KEYS
                    .iter()
                    .any(|s| key.to_lowercase().contains(s));
                if sensitive && !include_sensitive {
                    continue;
                }
                details.insert(key.clone(), value.clone());
            }
            info.insert("details".to_string(), serde_json::Value::Object(details));
        }
        if let ReasoningError::Security(err) = self {
            info.insert(
                "category".to_string(),
                serde_json::Value::String(err.category.as_str().to_string()),
            );
        }

        serde_json::Value::Object(info)
    }
}

/// Input validation failure naming the offending parameter.
#[derive(Debug, Error)]
#[error("Validation failed: {field} - {reason}")]
pub struct ValidationError {
    /// The parameter that failed validation.
    pub field: String,
    /// Why validation failed.
    pub reason: String,
    /// Optional structured details, excluded from `Display`.
    details: BTreeMap<String, serde_json::Value>,
}

impl ValidationError {
    /// Create a validation error for the given field.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
            details: BTreeMap::new(),
        }
    }

    /// Attach a structured detail entry (never rendered in `Display`).
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// Input matched a known attack pattern.
///
/// Constructed through [`SecurityError::detected`], which logs the event
/// before the error becomes visible to the caller.
#[derive(Debug, Error)]
#[error("Security violation detected: {category}")]
pub struct SecurityError {
    /// The attack pattern category that matched.
    pub category: SecurityEventType,
}

impl SecurityError {
    /// Record a security event and produce the corresponding error.
    pub fn detected(
        category: SecurityEventType,
        severity: SecuritySeverity,
        source: &str,
        detail: &str,
    ) -> Self {
        log_security_event(category, severity, source, detail);
        Self { category }
    }

    /// Convert into the caller-facing validation error for the given field.
    pub fn into_validation(self, field: impl Into<String>) -> ValidationError {
        ValidationError::new(
            field,
            format!("input rejected by security policy ({})", self.category),
        )
    }
}

/// Tool specification registration and import errors.
#[derive(Debug, Error)]
pub enum ToolSpecError {
    /// A tool with the same name is already registered.
    #[error("Tool already registered: {name}")]
    Duplicate {
        /// Name of the conflicting tool.
        name: String,
    },

    /// The specification is structurally invalid.
    #[error("Invalid tool specification: {reason}")]
    InvalidSpec {
        /// Why the specification was rejected.
        reason: String,
    },

    /// A required field is missing from an imported specification.
    #[error("Tool specification missing required field: {field}")]
    MissingField {
        /// The missing field path.
        field: String,
    },
}

/// Result type alias for application errors
pub type ReasoningResult<T> = Result<T, ReasoningError>;

/// Result type alias for validation
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type alias for tool-spec operations
pub type ToolSpecResult<T> = Result<T, ToolSpecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("sequence", "cannot be empty");
        assert_eq!(err.to_string(), "Validation failed: sequence - cannot be empty");
    }

    #[test]
    fn test_validation_error_display_excludes_details() {
        let err = ValidationError::new("sequence", "bad element")
            .with_detail("raw_input", serde_json::json!("password=hunter2"));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn test_security_error_display() {
        let err = SecurityError {
            category: SecurityEventType::LogInjection,
        };
        assert_eq!(err.to_string(), "Security violation detected: log_injection");
    }

    #[test]
    fn test_security_error_into_validation() {
        let err = SecurityError {
            category: SecurityEventType::OversizedInput,
        };
        let validation = err.into_validation("observations");
        assert_eq!(validation.field, "observations");
        assert!(validation.reason.contains("oversized_input"));
    }

    #[test]
    fn test_tool_spec_error_display() {
        let err = ToolSpecError::Duplicate {
            name: "predict_next_in_sequence".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Tool already registered: predict_next_in_sequence"
        );

        let err = ToolSpecError::InvalidSpec {
            reason: "name is required".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid tool specification: name is required");

        let err = ToolSpecError::MissingField {
            field: "function.name".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Tool specification missing required field: function.name"
        );
    }

    #[test]
    fn test_reasoning_error_codes() {
        let err: ReasoningError = ValidationError::new("x", "y").into();
        assert_eq!(err.error_code(), "validation_error");

        let err: ReasoningError = SecurityError {
            category: SecurityEventType::EncodedPayload,
        }
        .into();
        assert_eq!(err.error_code(), "security_error");

        let err = ReasoningError::Internal {
            message: "unexpected".to_string(),
        };
        assert_eq!(err.error_code(), "internal_error");

        let err = ReasoningError::Config {
            message: "missing key".to_string(),
        };
        assert_eq!(err.error_code(), "config_error");
    }

    #[test]
    fn test_debug_info_filters_sensitive_keys() {
        let err: ReasoningError = ValidationError::new("input", "rejected")
            .with_detail("api_key", serde_json::json!("sk-12345"))
            .with_detail("position", serde_json::json!(3))
            .into();

        let info = err.debug_info(false);
        let details = info.get("details").unwrap();
        assert!(details.get("api_key").is_none());
        assert_eq!(details.get("position"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn test_debug_info_opt_in_includes_sensitive_keys() {
        let err: ReasoningError = ValidationError::new("input", "rejected")
            .with_detail("api_key", serde_json::json!("sk-12345"))
            .into();

        let info = err.debug_info(true);
        let details = info.get("details").unwrap();
        assert_eq!(details.get("api_key"), Some(&serde_json::json!("sk-12345")));
    }

    #[test]
    fn test_validation_error_conversion_to_reasoning_error() {
        let validation = ValidationError::new("confidence", "must be finite");
        let err: ReasoningError = validation.into();
        assert!(matches!(err, ReasoningError::Validation(_)));
        assert!(err.to_string().contains("must be finite"));
    }
}
