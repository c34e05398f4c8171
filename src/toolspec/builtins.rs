//! Built-in tool specifications for the library's reasoning entry points.

use super::{JsonType, ParamSpec, ToolSpec};

const PROGRESSION_FACTORS: &[&str] = &["data_sufficiency", "pattern_quality", "complexity"];
const PROGRESSION_FORMULA: &str =
    "base * data_sufficiency_factor * pattern_quality_factor * complexity_factor";
const ABDUCTIVE_FACTORS: &[&str] = &["coverage", "simplicity", "specificity"];
const ABDUCTIVE_FORMULA: &str =
    "base * coverage_factor * simplicity_factor * specificity_factor";

fn factors(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Tool specifications for every public reasoning entry point.
pub fn builtin_tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "apply_modus_ponens",
            "Apply modus ponens: from P and P -> Q, conclude Q.",
        )
        .with_param(ParamSpec::new(
            "p_is_true",
            JsonType::Boolean,
            "Whether premise P holds",
        ))
        .with_param(ParamSpec::new(
            "p_implies_q_is_true",
            JsonType::Boolean,
            "Whether the implication P -> Q holds",
        ))
        .with_mathematical_basis("Modus ponens inference rule of propositional logic"),
        ToolSpec::new(
            "predict_next_in_sequence",
            "Predict the next number in a sequence from arithmetic, geometric, recursive, polynomial or exponential progressions.",
        )
        .with_param(
            ParamSpec::new("sequence", JsonType::Array, "The numeric sequence to analyze")
                .with_items(JsonType::Number),
        )
        .with_param(
            ParamSpec::new("rtol", JsonType::Number, "Relative tolerance for pattern detection")
                .optional(),
        )
        .with_param(
            ParamSpec::new("atol", JsonType::Number, "Absolute tolerance for pattern detection")
                .optional(),
        )
        .with_mathematical_basis("Arithmetic and geometric progression analysis")
        .with_confidence_factors(factors(PROGRESSION_FACTORS))
        .with_confidence_formula(PROGRESSION_FORMULA),
        ToolSpec::new(
            "find_pattern_description",
            "Describe the pattern found in a numeric sequence.",
        )
        .with_param(
            ParamSpec::new("sequence", JsonType::Array, "The numeric sequence to analyze")
                .with_items(JsonType::Number),
        )
        .with_mathematical_basis("Arithmetic and geometric progression analysis")
        .with_confidence_factors(factors(PROGRESSION_FACTORS))
        .with_confidence_formula(PROGRESSION_FORMULA),
        ToolSpec::new(
            "detect_recursive_pattern",
            "Detect additive recursive patterns (Fibonacci, Lucas, Tribonacci) in a sequence.",
        )
        .with_param(
            ParamSpec::new("sequence", JsonType::Array, "The numeric sequence to analyze")
                .with_items(JsonType::Number),
        )
        .with_mathematical_basis("Recursive sequence analysis (Fibonacci, Lucas, Tribonacci)")
        .with_confidence_factors(factors(PROGRESSION_FACTORS))
        .with_confidence_formula(PROGRESSION_FORMULA),
        ToolSpec::new(
            "generate_hypotheses",
            "Generate plausible explanatory hypotheses from observations using abductive reasoning.",
        )
        .with_param(
            ParamSpec::new("observations", JsonType::Array, "The observations to explain")
                .with_items(JsonType::String),
        )
        .with_param(
            ParamSpec::new("context", JsonType::String, "Additional context for generation")
                .optional(),
        )
        .with_mathematical_basis("Abductive reasoning - inference to the best explanation")
        .with_confidence_factors(factors(ABDUCTIVE_FACTORS))
        .with_confidence_formula(ABDUCTIVE_FORMULA),
        ToolSpec::new(
            "rank_hypotheses",
            "Rank hypotheses by confidence, highest first.",
        )
        .with_param(
            ParamSpec::new("hypotheses", JsonType::Array, "The hypotheses to rank")
                .with_items(JsonType::Object),
        )
        .with_mathematical_basis("Abductive reasoning - inference to the best explanation")
        .with_confidence_factors(factors(ABDUCTIVE_FACTORS))
        .with_confidence_formula(ABDUCTIVE_FORMULA),
        ToolSpec::new(
            "evaluate_best_explanation",
            "Select the best explanation from a set of hypotheses.",
        )
        .with_param(
            ParamSpec::new("hypotheses", JsonType::Array, "The hypotheses to evaluate")
                .with_items(JsonType::Object),
        )
        .with_mathematical_basis("Abductive reasoning - inference to the best explanation")
        .with_confidence_factors(factors(ABDUCTIVE_FACTORS))
        .with_confidence_formula(ABDUCTIVE_FORMULA),
        ToolSpec::new(
            "chain_of_thought_step",
            "Record a reasoning step in a conversation's chain of thought.",
        )
        .with_param(ParamSpec::new(
            "conversation_id",
            JsonType::String,
            "The conversation to record the step under",
        ))
        .with_param(ParamSpec::new("stage", JsonType::String, "Reasoning stage name"))
        .with_param(ParamSpec::new(
            "description",
            JsonType::String,
            "What the step did",
        ))
        .with_param(ParamSpec::new("result", JsonType::String, "The step's result"))
        .with_param(
            ParamSpec::new("confidence", JsonType::Number, "Confidence in the result (0.0-1.0)")
                .optional(),
        )
        .with_param(
            ParamSpec::new("evidence", JsonType::String, "Supporting evidence").optional(),
        ),
        ToolSpec::new(
            "get_chain_summary",
            "Summarize a conversation's reasoning chain.",
        )
        .with_param(ParamSpec::new(
            "conversation_id",
            JsonType::String,
            "The conversation to summarize",
        )),
        ToolSpec::new("clear_chain", "Clear a conversation's reasoning chain.").with_param(
            ParamSpec::new(
                "conversation_id",
                JsonType::String,
                "The conversation to clear",
            ),
        ),
    ]
}
