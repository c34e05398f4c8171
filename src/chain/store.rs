//! Conversation-keyed chain store.
//!
//! The store is the library's only shared mutable state. It maps a caller
//! supplied conversation id to its [`ReasoningChain`], creating the chain
//! on first use. Access is serialized through a store-level lock so adds,
//! summaries and clears are atomic with respect to each other: a reader
//! never observes a partially appended step and a clear cannot interleave
//! with an in-flight add on the same id.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ReasoningChain, ReasoningStep, StepRecord};
use crate::error::{ReasoningResult, ValidationError};
use crate::sanitize;
use crate::security::{log_security_event, SecuritySeverity};

/// Aggregated view of one conversation's reasoning chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSummary {
    /// The conversation this summary describes.
    pub conversation_id: String,
    /// Number of recorded steps.
    pub step_count: usize,
    /// Minimum confidence across all steps, if any steps exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_confidence: Option<f64>,
    /// Rendered multi-line summary text.
    pub summary: String,
}

/// Thread-safe store of reasoning chains keyed by conversation id.
///
/// Constructed explicitly and passed to callers; there is no process-wide
/// instance. Contents live in process memory only.
#[derive(Debug, Default)]
pub struct ChainStore {
    chains: RwLock<HashMap<String, ReasoningChain>>,
}

impl ChainStore {
    /// Create an empty chain store.
    pub fn new() -> Self {
        Self {
            chains: RwLock::new(HashMap::new()),
        }
    }

    /// Record a chain-of-thought step for a conversation.
    ///
    /// The chain is created on first use of the id. Attack patterns found
    /// in the step text are logged as security events; the stored text is
    /// the sanitized form. Returns the recorded step.
    pub fn add_step(
        &self,
        conversation_id: &str,
        record: StepRecord,
    ) -> ReasoningResult<ReasoningStep> {
        if conversation_id.trim().is_empty() {
            return Err(ValidationError::new(
                "conversation_id",
                "cannot be empty or whitespace",
            )
            .into());
        }

        for text in [&record.stage, &record.description, &record.result] {
            for finding in sanitize::scan(text) {
                log_security_event(
                    finding,
                    SecuritySeverity::Low,
                    "chain_store.add_step",
                    &sanitize::sanitize_for_logging(text),
                );
            }
        }

        let mut chains = self.chains.write().expect("chain store lock poisoned");
        let chain = chains
            .entry(conversation_id.to_string())
            .or_insert_with(ReasoningChain::new);
        let step = chain.add_step(record).clone();

        debug!(
            conversation_id = %conversation_id,
            step_number = step.step_number,
            "Chain-of-thought step added"
        );
        Ok(step)
    }

    /// Summarize a conversation's chain.
    ///
    /// An unknown id yields an empty summary rather than an error.
    pub fn get_summary(&self, conversation_id: &str) -> ChainSummary {
        let chains = self.chains.read().expect("chain store lock poisoned");
        match chains.get(conversation_id) {
            Some(chain) => ChainSummary {
                conversation_id: conversation_id.to_string(),
                step_count: chain.len(),
                overall_confidence: chain.overall_confidence(),
                summary: chain.summary(),
            },
            None => ChainSummary {
                conversation_id: conversation_id.to_string(),
                step_count: 0,
                overall_confidence: None,
                summary: "Reasoning Chain Summary:".to_string(),
            },
        }
    }

    /// Remove a conversation's chain.
    ///
    /// Returns whether a chain existed; clearing an unknown id is a no-op.
    pub fn clear(&self, conversation_id: &str) -> bool {
        let mut chains = self.chains.write().expect("chain store lock poisoned");
        let existed = chains.remove(conversation_id).is_some();
        debug!(
            conversation_id = %conversation_id,
            existed = existed,
            "Chain cleared"
        );
        existed
    }

    /// Number of conversations currently tracked.
    pub fn conversation_count(&self) -> usize {
        self.chains.read().expect("chain store lock poisoned").len()
    }
}
