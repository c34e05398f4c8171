//! Reasoning chain data structures.
//!
//! A [`ReasoningChain`] is an append-only log of [`ReasoningStep`] records
//! accumulated during a reasoning session. Chains are owned by whichever
//! caller constructs them and are never shared implicitly; the
//! conversation-keyed [`ChainStore`] provides explicit shared ownership
//! when multiple callers contribute to one conversation.

mod store;

pub use store::{ChainStore, ChainSummary};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::{CONFIDENCE_MAX, CONFIDENCE_MIN, DEFAULT_STEP_CONFIDENCE};
use crate::sanitize::sanitize_for_logging;

/// A single step in a reasoning chain, immutable once recorded.
///
/// Text fields are sanitized before storage so a rendered chain summary is
/// always safe to write to a log sink; confidence is clamped to [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningStep {
    /// 1-based position within the chain.
    pub step_number: usize,
    /// Reasoning stage that produced the step.
    pub stage: String,
    /// Human-readable description of the step.
    pub description: String,
    /// The step's result, rendered as text.
    pub result: String,
    /// Confidence in the result (0.0-1.0).
    pub confidence: f64,
    /// Supporting evidence, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Assumptions made during the step.
    #[serde(default)]
    pub assumptions: Vec<String>,
    /// When the step was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input parameters for recording a reasoning step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Reasoning stage name.
    pub stage: String,
    /// Description of what the step did.
    pub description: String,
    /// Result rendered as text.
    pub result: String,
    /// Confidence in the result (0.0-1.0).
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Optional supporting evidence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Assumptions made during the step.
    #[serde(default)]
    pub assumptions: Vec<String>,
}

fn default_confidence() -> f64 {
    DEFAULT_STEP_CONFIDENCE
}

impl StepRecord {
    /// Create a new step record with the default confidence.
    pub fn new(
        stage: impl Into<String>,
        description: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            description: description.into(),
            result: result.into(),
            confidence: DEFAULT_STEP_CONFIDENCE,
            evidence: None,
            assumptions: Vec::new(),
        }
    }

    /// Set the confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    /// Attach supporting evidence.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// Attach the full list of assumptions.
    pub fn with_assumptions(mut self, assumptions: Vec<String>) -> Self {
        self.assumptions = assumptions;
        self
    }

    /// Append a single assumption.
    pub fn with_assumption(mut self, assumption: impl Into<String>) -> Self {
        self.assumptions.push(assumption.into());
        self
    }
}

/// An ordered, append-only sequence of reasoning steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningChain {
    /// Chain identity, used for log correlation.
    pub id: Uuid,
    steps: Vec<ReasoningStep>,
    step_counter: usize,
}

impl ReasoningChain {
    /// Create an empty reasoning chain.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            steps: Vec::new(),
            step_counter: 0,
        }
    }

    /// Record a step, sanitizing text fields and clamping confidence.
    pub fn add_step(&mut self, record: StepRecord) -> &ReasoningStep {
        self.step_counter += 1;
        let step = ReasoningStep {
            step_number: self.step_counter,
            stage: sanitize_for_logging(&record.stage),
            description: sanitize_for_logging(&record.description),
            result: sanitize_for_logging(&record.result),
            confidence: clamp_confidence(record.confidence),
            evidence: record.evidence.as_deref().map(sanitize_for_logging),
            assumptions: record
                .assumptions
                .iter()
                .map(|a| sanitize_for_logging(a))
                .collect(),
            created_at: Utc::now(),
        };

        debug!(
            chain_id = %self.id,
            step_number = step.step_number,
            stage = %step.stage,
            confidence = step.confidence,
            "Reasoning step recorded"
        );

        self.steps.push(step);
        self.steps.last().expect("step was just pushed")
    }

    /// All recorded steps, in order.
    pub fn steps(&self) -> &[ReasoningStep] {
        &self.steps
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the chain has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The result text of the most recent step, if any.
    pub fn last_result(&self) -> Option<&str> {
        self.steps.last().map(|s| s.result.as_str())
    }

    /// The weakest-link confidence: minimum over all steps.
    pub fn overall_confidence(&self) -> Option<f64> {
        self.steps
            .iter()
            .map(|s| s.confidence)
            .fold(None, |acc, c| match acc {
                None => Some(c),
                Some(min) if c < min => Some(c),
                Some(min) => Some(min),
            })
    }

    /// Render a multi-line, log-safe summary of the chain.
    pub fn summary(&self) -> String {
        let mut parts = vec!["Reasoning Chain Summary:".to_string()];
        for step in &self.steps {
            parts.push(format!(
                "  Step {} ({}): {}",
                step.step_number, step.stage, step.description
            ));
            parts.push(format!("    Result: {}", step.result));
            parts.push(format!("    Confidence: {:.2}", step.confidence));
            if let Some(evidence) = &step.evidence {
                parts.push(format!("    Evidence: {}", evidence));
            }
            if !step.assumptions.is_empty() {
                parts.push(format!("    Assumptions: {}", step.assumptions.join(", ")));
            }
        }
        parts.join("\n")
    }

    /// Remove all steps and reset the counter.
    pub fn clear(&mut self) {
        self.steps.clear();
        self.step_counter = 0;
    }
}

impl Default for ReasoningChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a confidence value into [0, 1]; non-finite values collapse to 0.
pub(crate) fn clamp_confidence(confidence: f64) -> f64 {
    if !confidence.is_finite() {
        return CONFIDENCE_MIN;
    }
    confidence.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX)
}
