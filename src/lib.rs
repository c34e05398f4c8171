//! # Reasoning Kit
//!
//! A small reasoning library providing deductive, inductive and abductive
//! primitives with chain-of-thought bookkeeping and LLM tool-spec
//! generation.
//!
//! ## Features
//!
//! - **Deductive Reasoning**: modus ponens inference with recorded certainty
//! - **Inductive Reasoning**: arithmetic, geometric, recursive
//!   (Fibonacci/Lucas/Tribonacci), polynomial and exponential sequence
//!   pattern detection with bounded confidence scoring
//! - **Abductive Reasoning**: hypothesis generation, stable ranking and
//!   best-explanation selection from free-text observations
//! - **Chain of Thought**: per-session reasoning chains plus a
//!   conversation-keyed store safe under concurrent callers
//! - **Tool Specs**: declarative registry exporting legacy, OpenAI and
//!   AWS Bedrock function-calling schemas
//! - **Sanitization**: log-injection, credential and template-injection
//!   neutralization applied to every stored text field
//!
//! ## Architecture
//!
//! ```text
//! caller → modes::{deductive, inductive, abductive} → ReasoningChain
//!            │                                           │
//!            └── toolspec::ToolRegistry (exports)        └── chain::ChainStore
//! ```
//!
//! ## Example
//!
//! ```
//! use reasoning_kit::chain::ReasoningChain;
//! use reasoning_kit::modes::inductive::predict_next_in_sequence;
//!
//! let mut chain = ReasoningChain::new();
//! let next = predict_next_in_sequence(&[1.0, 2.0, 3.0, 4.0, 5.0], Some(&mut chain))?;
//! assert_eq!(next, Some(6.0));
//! assert_eq!(chain.len(), 1);
//! # Ok::<(), reasoning_kit::error::ReasoningError>(())
//! ```

#![warn(missing_docs)]

/// Reasoning chain records and the conversation-keyed chain store.
pub mod chain;
/// Configuration management and confidence/tolerance constants.
pub mod config;
/// Error types and result aliases for the library.
pub mod error;
/// Reasoning mode implementations (deductive, inductive, abductive).
pub mod modes;
/// Text sanitization for log-safe and template-safe output.
pub mod sanitize;
/// Security event classification and logging.
pub mod security;
/// Declarative tool-spec registry and export formats.
pub mod toolspec;

pub use chain::{ChainStore, ChainSummary, ReasoningChain, ReasoningStep, StepRecord};
pub use config::Config;
pub use error::{ReasoningError, ReasoningResult};
pub use modes::abductive::{
    evaluate_best_explanation, generate_hypotheses, rank_hypotheses, Hypothesis,
};
pub use modes::deductive::apply_modus_ponens;
pub use modes::inductive::{find_pattern_description, predict_next_in_sequence};
pub use toolspec::{ToolRegistry, ToolSpec};
