//! Text sanitization for log-safe and template-safe output.
//!
//! This module neutralizes the classes of untrusted input that would
//! otherwise poison a log sink or a hypothesis template:
//! - control characters and ANSI escape sequences (log injection),
//! - percent- and HTML-entity-encoded payloads hiding either of the above,
//! - credential-like assignments (`password=...`, `api_key: ...`),
//! - forged log-level markers (`[ERROR]`, `[WARN]`, ...).
//!
//! Replacements are always visible tokens rather than silent removals, so
//! sanitized output keeps its audit value. All patterns run in linear time
//! on the input; none can be driven into catastrophic backtracking.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::security::SecurityEventType;

/// Token substituted for a masked credential value.
pub const REDACTION_TOKEN: &str = "[REDACTED]";

/// Token substituted for an ANSI escape sequence.
pub const ANSI_PLACEHOLDER: &str = "[ESC]";

/// Token substituted for an injected log-level marker.
pub const LOG_LEVEL_PLACEHOLDER: &str = "[LEVEL]";

/// Maximum number of decode passes applied to nested encodings.
const MAX_DECODE_DEPTH: usize = 3;

/// ANSI CSI sequences (`ESC [ ... <final byte>`).
static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]{0,32}[A-Za-z]").expect("valid ANSI pattern"));

/// Log-level markers that could forge log records when echoed verbatim.
static LOG_LEVEL_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[(?:ERROR|CRITICAL|WARN|WARNING|INFO|DEBUG|TRACE|FATAL)\]")
        .expect("valid log-level pattern")
});

/// Credential-like assignment: keyword, separator, then a bounded value.
///
/// The keyword must stand alone (word boundaries on both sides) so that
/// identifiers like `password_reset_page` are not mistaken for secrets.
static CREDENTIAL_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(password|passwd|pwd|api[_-]?key|apikey|secret|token|auth[_-]?token|access[_-]?token|credentials?)\b(\s{0,8}[=:]\s{0,8})("[^"]{1,256}"|'[^']{1,256}'|[^\s"'&;,]{1,256})"#,
    )
    .expect("valid credential pattern")
});

/// Percent-encoded byte (`%3D`, `%0a`, ...).
static PERCENT_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([0-9a-fA-F]{2})").expect("valid percent pattern"));

/// Numeric HTML entity (`&#61;`, `&#x3D;`).
static NUMERIC_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#(?:x([0-9a-fA-F]{1,6})|([0-9]{1,7}));").expect("valid entity pattern")
});

/// Template placeholder syntaxes recognized by downstream engines.
static TEMPLATE_SYNTAX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{[^}]{0,256}\}|\{\{[^}]{0,256}\}\}|#\{[^}]{0,256}\}")
        .expect("valid template pattern")
});

/// Named HTML entities worth decoding before re-checking.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&colon;", ":"),
    ("&equals;", "="),
    ("&NewLine;", "\n"),
    ("&Tab;", "\t"),
];

/// Sanitize text for writing to a log sink.
///
/// Decodes nested percent/entity encodings (bounded depth), replaces ANSI
/// escape sequences and control characters with visible tokens, neutralizes
/// forged log-level markers, and masks every credential-like assignment.
/// Never fails: the worst case is an over-escaped but intact string.
pub fn sanitize_for_logging(text: &str) -> String {
    let decoded = decode_layers(text);
    let text = ANSI_ESCAPE.replace_all(&decoded, ANSI_PLACEHOLDER);
    let text = escape_control_chars(&text);
    let text = LOG_LEVEL_MARKER.replace_all(&text, LOG_LEVEL_PLACEHOLDER);
    mask_credentials(&text)
}

/// Scan text for known attack patterns without modifying it.
///
/// Returns the matched categories so callers can emit security events
/// before the sanitized form is stored or logged.
pub fn scan(text: &str) -> Vec<SecurityEventType> {
    let mut findings = Vec::new();
    let decoded = decode_layers(text);

    if decoded != text {
        findings.push(SecurityEventType::EncodedPayload);
    }
    if decoded.chars().any(|c| c.is_control()) || ANSI_ESCAPE.is_match(&decoded) {
        findings.push(SecurityEventType::LogInjection);
    }
    if TEMPLATE_SYNTAX.is_match(&decoded) {
        findings.push(SecurityEventType::TemplateInjection);
    }
    if CREDENTIAL_ASSIGNMENT.is_match(&decoded) {
        findings.push(SecurityEventType::CredentialExposure);
    }
    findings
}

/// Fill `{name}` placeholders in a template with literal values.
///
/// Substitution is a single left-to-right pass: inserted values are opaque
/// text and are never re-scanned, so a value that itself looks like a
/// placeholder appears verbatim in the output. Unknown placeholders are
/// left untouched.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start..];
        match after.find('}') {
            Some(end) => {
                let key = &after[1..end];
                match values.iter().find(|(name, _)| *name == key) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&after[..=end]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(after);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Replace control characters with visible escape tokens.
///
/// Newline, carriage return and tab become their two-character escape
/// spellings; anything else in the control ranges becomes `\x..`/`\u{..}`.
/// Unicode line/paragraph separators are escaped as well since many log
/// viewers render them as line breaks.
pub(crate) fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' | '\u{2029}' => out.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c if c.is_control() => {
                if (c as u32) <= 0xff {
                    out.push_str(&format!("\\x{:02x}", c as u32));
                } else {
                    out.push_str(&format!("\\u{{{:x}}}", c as u32));
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// Mask the value of every credential-like assignment.
fn mask_credentials(text: &str) -> String {
    CREDENTIAL_ASSIGNMENT
        .replace_all(text, |caps: &regex::Captures<'_>| {
            format!("{}{}{}", &caps[1], &caps[2], REDACTION_TOKEN)
        })
        .into_owned()
}

/// Decode percent and HTML-entity encodings one layer at a time.
///
/// Stops after [`MAX_DECODE_DEPTH`] passes or as soon as a pass is a
/// fixed point, so nested-encoding chains cannot loop forever.
fn decode_layers(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_DECODE_DEPTH {
        let decoded = decode_once(&current);
        if decoded == current {
            break;
        }
        current = decoded;
    }
    current
}

/// Apply a single decoding pass over percent escapes and HTML entities.
fn decode_once(text: &str) -> String {
    let text = PERCENT_ESCAPE.replace_all(text, |caps: &regex::Captures<'_>| {
        match u8::from_str_radix(&caps[1], 16) {
            Ok(byte) if byte.is_ascii() => (byte as char).to_string(),
            _ => caps[0].to_string(),
        }
    });

    let text = NUMERIC_ENTITY.replace_all(&text, |caps: &regex::Captures<'_>| {
        let parsed = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            _ => None,
        };
        match parsed.and_then(char::from_u32) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    });

    let mut out = text.into_owned();
    for (entity, replacement) in NAMED_ENTITIES {
        if out.contains(entity) {
            out = out.replace(entity, replacement);
        }
    }
    out
}
