//! Declarative tool specifications for LLM function-calling.
//!
//! Callers describe their functions with [`ToolSpec`] builders at
//! registration time; no signatures, docstrings or source text are ever
//! inspected. The [`ToolRegistry`] preserves registration order and exports
//! the same set in three wire formats: a legacy flat list, OpenAI-style
//! wrappers and AWS Bedrock `toolSpec` wrappers.

mod builtins;
mod export;

pub use builtins::builtin_tool_specs;
pub use export::sanitize_spec_value;

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ToolSpecError, ToolSpecResult};

/// JSON Schema scalar/container types used in parameter specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// A JSON integer.
    Integer,
    /// A JSON boolean.
    Boolean,
    /// A JSON array.
    Array,
    /// A JSON object.
    Object,
}

impl JsonType {
    /// The JSON Schema type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::Boolean => "boolean",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JsonType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(JsonType::String),
            "number" => Ok(JsonType::Number),
            "integer" => Ok(JsonType::Integer),
            "boolean" => Ok(JsonType::Boolean),
            "array" => Ok(JsonType::Array),
            "object" => Ok(JsonType::Object),
            _ => Err(format!("Unknown JSON type: {}", s)),
        }
    }
}

/// Specification of a single tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,
    /// JSON Schema type of the parameter.
    pub param_type: JsonType,
    /// Description of the parameter.
    pub description: String,
    /// Whether the parameter must be supplied (no default value).
    pub required: bool,
    /// Element type for array parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<JsonType>,
}

impl ParamSpec {
    /// Create a required parameter.
    pub fn new(name: impl Into<String>, param_type: JsonType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            items: None,
        }
    }

    /// Mark the parameter as optional (it has a default value).
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the element type for an array parameter.
    pub fn with_items(mut self, items: JsonType) -> Self {
        self.items = Some(items);
        self
    }
}

/// Declared metadata describing a tool's confidence mathematics.
///
/// Supplied explicitly at registration; enrichment never inspects the
/// function itself, so implementation details cannot leak into exports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolMetadata {
    /// The mathematical principle the tool relies on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mathematical_basis: Option<String>,
    /// Factors that feed the tool's confidence score.
    #[serde(default)]
    pub confidence_factors: Vec<String>,
    /// The confidence combination formula.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_formula: Option<String>,
}

impl ToolMetadata {
    /// Whether any mathematical-confidence metadata was declared.
    pub fn is_mathematical_reasoning(&self) -> bool {
        self.mathematical_basis.is_some()
            || !self.confidence_factors.is_empty()
            || self.confidence_formula.is_some()
    }
}

/// Read-only description of a registered tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name (used in tool calls).
    pub name: String,
    /// Human-readable description of the tool.
    pub description: String,
    /// Ordered parameter specifications.
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    /// Declared confidence metadata.
    #[serde(default)]
    pub metadata: ToolMetadata,
}

impl ToolSpec {
    /// Create a tool spec with no parameters.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            metadata: ToolMetadata::default(),
        }
    }

    /// Append a parameter.
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Declare the tool's mathematical basis.
    pub fn with_mathematical_basis(mut self, basis: impl Into<String>) -> Self {
        self.metadata.mathematical_basis = Some(basis.into());
        self
    }

    /// Declare the tool's confidence factors.
    pub fn with_confidence_factors(mut self, factors: Vec<String>) -> Self {
        self.metadata.confidence_factors = factors;
        self
    }

    /// Declare the tool's confidence formula.
    pub fn with_confidence_formula(mut self, formula: impl Into<String>) -> Self {
        self.metadata.confidence_formula = Some(formula.into());
        self
    }

    /// Names of parameters lacking a default value.
    pub fn required_params(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// The JSON Schema object describing this tool's parameters.
    pub fn parameters_schema(&self) -> Value {
        export::parameters_schema(self)
    }
}

/// Ordered, thread-safe registry of tool specifications.
///
/// Constructed explicitly (no process-wide instance); duplicate names are
/// rejected so each export format describes exactly one entry per tool.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: RwLock<Vec<ToolSpec>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(Vec::new()),
        }
    }

    /// Create a registry pre-populated with the built-in reasoning tools.
    pub fn with_builtin_tools() -> Self {
        let registry = Self::new();
        for spec in builtin_tool_specs() {
            // Built-in names are unique; a failure here is a programming error.
            if let Err(e) = registry.register(spec) {
                tracing::error!(error = %e, "Failed to register builtin tool");
            }
        }
        registry
    }

    /// Register a tool specification.
    ///
    /// # Errors
    /// [`ToolSpecError::InvalidSpec`] for an empty name,
    /// [`ToolSpecError::Duplicate`] when the name is already registered.
    pub fn register(&self, spec: ToolSpec) -> ToolSpecResult<()> {
        if spec.name.trim().is_empty() {
            return Err(ToolSpecError::InvalidSpec {
                reason: "tool name is required".to_string(),
            });
        }

        let mut tools = self.tools.write().expect("tool registry lock poisoned");
        if tools.iter().any(|t| t.name == spec.name) {
            return Err(ToolSpecError::Duplicate { name: spec.name });
        }

        debug!(tool = %spec.name, "Tool registered");
        tools.push(spec);
        Ok(())
    }

    /// Register a tool from a legacy-format JSON value.
    ///
    /// The value passes through a fixed key allow-list before any field is
    /// read, so spec-like input carrying keys such as `__proto__` or
    /// `constructor` can never influence the registry or its exports.
    pub fn register_raw_spec(&self, value: &Value) -> ToolSpecResult<()> {
        let spec = export::parse_spec_value(value)?;
        self.register(spec)
    }

    /// Get a registered tool by name.
    pub fn get(&self, name: &str) -> Option<ToolSpec> {
        self.tools
            .read()
            .expect("tool registry lock poisoned")
            .iter()
            .find(|t| t.name == name)
            .cloned()
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools
            .read()
            .expect("tool registry lock poisoned")
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.read().expect("tool registry lock poisoned").len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export all tools in the legacy flat format.
    pub fn legacy_specs(&self) -> Vec<Value> {
        self.tools
            .read()
            .expect("tool registry lock poisoned")
            .iter()
            .map(export::legacy_format)
            .collect()
    }

    /// Export all tools in OpenAI ChatCompletions format.
    ///
    /// Descriptions are enriched with declared confidence metadata.
    pub fn openai_tools(&self) -> Vec<Value> {
        self.tools
            .read()
            .expect("tool registry lock poisoned")
            .iter()
            .map(export::openai_format)
            .collect()
    }

    /// Export all tools in AWS Bedrock Converse format.
    ///
    /// Descriptions are enriched with declared confidence metadata.
    pub fn bedrock_tools(&self) -> Vec<Value> {
        self.tools
            .read()
            .expect("tool registry lock poisoned")
            .iter()
            .map(export::bedrock_format)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec(name: &str) -> ToolSpec {
        ToolSpec::new(name, "A sample tool").with_param(ParamSpec::new(
            "input",
            JsonType::String,
            "The input value",
        ))
    }

    #[test]
    fn test_json_type_round_trip() {
        for (ty, s) in [
            (JsonType::String, "string"),
            (JsonType::Number, "number"),
            (JsonType::Integer, "integer"),
            (JsonType::Boolean, "boolean"),
            (JsonType::Array, "array"),
            (JsonType::Object, "object"),
        ] {
            assert_eq!(ty.as_str(), s);
            assert_eq!(s.parse::<JsonType>().unwrap(), ty);
        }
        assert!("banana".parse::<JsonType>().is_err());
    }

    #[test]
    fn test_register_and_get() {
        let registry = ToolRegistry::new();
        registry.register(sample_spec("alpha")).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("alpha").unwrap().name, "alpha");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_register_rejects_duplicate() {
        let registry = ToolRegistry::new();
        registry.register(sample_spec("alpha")).unwrap();
        let err = registry.register(sample_spec("alpha")).unwrap_err();
        assert!(matches!(err, ToolSpecError::Duplicate { .. }));
    }

    #[test]
    fn test_register_rejects_empty_name() {
        let registry = ToolRegistry::new();
        let err = registry.register(sample_spec("  ")).unwrap_err();
        assert!(matches!(err, ToolSpecError::InvalidSpec { .. }));
    }

    #[test]
    fn test_registration_order_preserved() {
        let registry = ToolRegistry::new();
        registry.register(sample_spec("zeta")).unwrap();
        registry.register(sample_spec("alpha")).unwrap();
        registry.register(sample_spec("mid")).unwrap();
        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_required_params_derived_from_defaults() {
        let spec = ToolSpec::new("t", "d")
            .with_param(ParamSpec::new("a", JsonType::String, "required one"))
            .with_param(ParamSpec::new("b", JsonType::Number, "optional one").optional());
        assert_eq!(spec.required_params(), vec!["a"]);
    }

    #[test]
    fn test_metadata_flags_mathematical_reasoning() {
        let plain = ToolSpec::new("t", "d");
        assert!(!plain.metadata.is_mathematical_reasoning());

        let mathy = ToolSpec::new("t", "d").with_mathematical_basis("Progression analysis");
        assert!(mathy.metadata.is_mathematical_reasoning());
    }

    #[test]
    fn test_with_builtin_tools_registers_entry_points() {
        let registry = ToolRegistry::with_builtin_tools();
        let names = registry.names();
        for expected in [
            "apply_modus_ponens",
            "predict_next_in_sequence",
            "find_pattern_description",
            "detect_recursive_pattern",
            "generate_hypotheses",
            "rank_hypotheses",
            "evaluate_best_explanation",
            "chain_of_thought_step",
            "get_chain_summary",
            "clear_chain",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {}", expected);
        }
    }
}
