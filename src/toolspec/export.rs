//! Export formats for tool specifications.
//!
//! All exporters build their output from the registry's typed state; the
//! only untyped entry path is [`sanitize_spec_value`], which copies a
//! spec-like JSON value through a fixed key allow-list so injected keys
//! (`__proto__`, `constructor` and anything else unknown) never reach the
//! registry or any export.

use serde_json::{json, Map, Value};

use super::{JsonType, ParamSpec, ToolMetadata, ToolSpec};
use crate::error::{ToolSpecError, ToolSpecResult};

/// Top-level keys a legacy-format spec may carry.
const ALLOWED_TOP_LEVEL_KEYS: &[&str] = &["type", "function"];

/// Keys the `function` object may carry.
const ALLOWED_FUNCTION_KEYS: &[&str] = &["name", "description", "parameters"];

/// Build the JSON Schema `parameters` object for a tool.
pub(super) fn parameters_schema(spec: &ToolSpec) -> Value {
    let mut properties = Map::new();
    for param in &spec.params {
        let mut property = Map::new();
        property.insert("type".to_string(), json!(param.param_type.as_str()));
        if !param.description.is_empty() {
            property.insert("description".to_string(), json!(param.description));
        }
        if let Some(items) = param.items {
            property.insert("items".to_string(), json!({ "type": items.as_str() }));
        }
        properties.insert(param.name.clone(), Value::Object(property));
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": spec.required_params(),
        "additionalProperties": false
    })
}

/// Legacy flat format: `{type: "function", function: {...}}`.
pub(super) fn legacy_format(spec: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": spec.name,
            "description": spec.description,
            "parameters": parameters_schema(spec),
        }
    })
}

/// OpenAI ChatCompletions format with metadata-enriched description.
pub(super) fn openai_format(spec: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": spec.name,
            "description": enrich_description(&spec.description, &spec.metadata),
            "parameters": parameters_schema(spec),
        }
    })
}

/// AWS Bedrock Converse format with metadata-enriched description.
pub(super) fn bedrock_format(spec: &ToolSpec) -> Value {
    json!({
        "toolSpec": {
            "name": spec.name,
            "description": enrich_description(&spec.description, &spec.metadata),
            "inputSchema": { "json": parameters_schema(spec) },
        }
    })
}

/// Append confidence documentation derived from declared metadata.
///
/// Enrichment is idempotent: a description that already carries a
/// mathematical-basis block is returned unchanged.
pub(super) fn enrich_description(description: &str, metadata: &ToolMetadata) -> String {
    if !metadata.is_mathematical_reasoning() {
        return description.to_string();
    }
    if description.contains("Mathematical Basis:") {
        return description.to_string();
    }

    let mut enriched = description.to_string();
    if let Some(basis) = &metadata.mathematical_basis {
        enriched.push_str(&format!("\n\nMathematical Basis: {}", basis));
    }
    if !metadata.confidence_factors.is_empty() {
        enriched.push_str(&format!(
            "\n\nConfidence Scoring: Confidence calculation based on: {}",
            metadata.confidence_factors.join(", ")
        ));
    }
    if let Some(formula) = &metadata.confidence_formula {
        enriched.push_str(&format!("\n\nConfidence Formula: {}", formula));
    }
    enriched
}

/// Copy a legacy-format spec value through the fixed key allow-list.
///
/// Unknown keys are dropped, never copied; allow-listed keys are copied
/// verbatim so legitimate fields are never lost.
///
/// # Errors
/// [`ToolSpecError::InvalidSpec`] when the value or its `function` entry is
/// not an object; [`ToolSpecError::MissingField`] when `function` is absent.
pub fn sanitize_spec_value(value: &Value) -> ToolSpecResult<Value> {
    let object = value.as_object().ok_or_else(|| ToolSpecError::InvalidSpec {
        reason: "tool specification must be an object".to_string(),
    })?;

    let function = object
        .get("function")
        .ok_or_else(|| ToolSpecError::MissingField {
            field: "function".to_string(),
        })?
        .as_object()
        .ok_or_else(|| ToolSpecError::InvalidSpec {
            reason: "'function' value must be an object".to_string(),
        })?;

    let mut safe_function = Map::new();
    for (key, entry) in function {
        if ALLOWED_FUNCTION_KEYS.contains(&key.as_str()) {
            safe_function.insert(key.clone(), entry.clone());
        }
    }

    let mut safe_spec = Map::new();
    for (key, entry) in object {
        if !ALLOWED_TOP_LEVEL_KEYS.contains(&key.as_str()) {
            continue;
        }
        if key == "function" {
            safe_spec.insert(key.clone(), Value::Object(safe_function.clone()));
        } else {
            safe_spec.insert(key.clone(), entry.clone());
        }
    }

    Ok(Value::Object(safe_spec))
}

/// Parse a legacy-format spec value into a typed [`ToolSpec`].
pub(super) fn parse_spec_value(value: &Value) -> ToolSpecResult<ToolSpec> {
    let sanitized = sanitize_spec_value(value)?;
    let function = sanitized
        .get("function")
        .and_then(Value::as_object)
        .expect("sanitize_spec_value guarantees a function object");

    let name = function
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolSpecError::MissingField {
            field: "function.name".to_string(),
        })?;

    let description = function
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut spec = ToolSpec::new(name, description);

    if let Some(parameters) = function.get("parameters").and_then(Value::as_object) {
        let required: Vec<&str> = parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        if let Some(properties) = parameters.get("properties").and_then(Value::as_object) {
            for (param_name, property) in properties {
                let param_type = property
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(|s| s.parse::<JsonType>().ok())
                    .unwrap_or(JsonType::String);
                let param_description = property
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default();

                let mut param = ParamSpec::new(param_name, param_type, param_description);
                if !required.contains(&param_name.as_str()) {
                    param = param.optional();
                }
                if let Some(items_type) = property
                    .get("items")
                    .and_then(|i| i.get("type"))
                    .and_then(Value::as_str)
                    .and_then(|s| s.parse::<JsonType>().ok())
                {
                    param = param.with_items(items_type);
                }
                spec = spec.with_param(param);
            }
        }
    }

    Ok(spec)
}
