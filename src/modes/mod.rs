//! Reasoning mode implementations.
//!
//! This module provides the reasoning primitives:
//! - [`deductive`]: modus ponens inference
//! - [`inductive`]: numeric sequence pattern detection and prediction
//! - [`abductive`]: hypothesis generation, ranking and selection
//!
//! Every entry point optionally records its work into a caller-owned
//! [`ReasoningChain`](crate::chain::ReasoningChain).

pub mod abductive;
pub mod deductive;
pub mod inductive;

pub use abductive::*;
pub use deductive::*;
pub use inductive::*;

use crate::chain::{ReasoningChain, StepRecord};

/// Record a step on an optional chain, consuming the chain handle.
pub(crate) fn note_step(chain: Option<&mut ReasoningChain>, record: StepRecord) {
    if let Some(chain) = chain {
        chain.add_step(record);
    }
}
