//! Security event classification and logging.
//!
//! Inputs that match known attack patterns are never rejected silently:
//! every detection is emitted as a structured `tracing` event before the
//! caller-facing error (if any) is produced. Event payloads are escaped
//! before logging so the security log itself cannot be poisoned.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sanitize::escape_control_chars;

/// Classification of a detected security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    /// Control characters or ANSI sequences aimed at a log sink.
    LogInjection,
    /// Template placeholder syntax embedded in a value.
    TemplateInjection,
    /// A credential-like assignment present in free text.
    CredentialExposure,
    /// Input exceeding a configured size or magnitude limit.
    OversizedInput,
    /// Encoded payload hiding one of the other categories.
    EncodedPayload,
    /// A pattern that is suspicious but not otherwise classified.
    SuspiciousPattern,
}

impl SecurityEventType {
    /// Get the event type as a stable string identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEventType::LogInjection => "log_injection",
            SecurityEventType::TemplateInjection => "template_injection",
            SecurityEventType::CredentialExposure => "credential_exposure",
            SecurityEventType::OversizedInput => "oversized_input",
            SecurityEventType::EncodedPayload => "encoded_payload",
            SecurityEventType::SuspiciousPattern => "suspicious_pattern",
        }
    }
}

impl std::fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of a security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecuritySeverity {
    /// Informational; input was neutralized in place.
    Low,
    /// Input was modified substantially or truncated.
    Medium,
    /// Input was rejected.
    High,
    /// Repeated or compound attack indicators.
    Critical,
}

impl SecuritySeverity {
    /// Get the severity as a stable string identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecuritySeverity::Low => "low",
            SecuritySeverity::Medium => "medium",
            SecuritySeverity::High => "high",
            SecuritySeverity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for SecuritySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Emit a structured security event to the log.
///
/// The detail excerpt is control-character escaped (not fully sanitized)
/// before logging; callers pass already-masked text when credentials may
/// be present.
pub fn log_security_event(
    event: SecurityEventType,
    severity: SecuritySeverity,
    source: &str,
    detail: &str,
) {
    let safe_detail = escape_control_chars(detail);
    warn!(
        category = %event,
        severity = %severity,
        source = %source,
        detail = %safe_detail,
        "Security event detected"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_as_str() {
        assert_eq!(SecurityEventType::LogInjection.as_str(), "log_injection");
        assert_eq!(
            SecurityEventType::TemplateInjection.as_str(),
            "template_injection"
        );
        assert_eq!(
            SecurityEventType::CredentialExposure.as_str(),
            "credential_exposure"
        );
        assert_eq!(SecurityEventType::OversizedInput.as_str(), "oversized_input");
        assert_eq!(SecurityEventType::EncodedPayload.as_str(), "encoded_payload");
        assert_eq!(
            SecurityEventType::SuspiciousPattern.as_str(),
            "suspicious_pattern"
        );
    }

    #[test]
    fn test_event_type_display_matches_as_str() {
        assert_eq!(
            format!("{}", SecurityEventType::LogInjection),
            "log_injection"
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(SecuritySeverity::Low < SecuritySeverity::Medium);
        assert!(SecuritySeverity::Medium < SecuritySeverity::High);
        assert!(SecuritySeverity::High < SecuritySeverity::Critical);
    }

    #[test]
    fn test_event_type_serde_round_trip() {
        let json = serde_json::to_string(&SecurityEventType::CredentialExposure).unwrap();
        assert_eq!(json, "\"credential_exposure\"");
        let parsed: SecurityEventType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, SecurityEventType::CredentialExposure);
    }

    #[test]
    fn test_log_security_event_does_not_panic() {
        log_security_event(
            SecurityEventType::LogInjection,
            SecuritySeverity::Low,
            "unit_test",
            "detail with\nnewline",
        );
    }
}
