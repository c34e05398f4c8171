//! Deductive reasoning: modus ponens.

use tracing::debug;

use super::note_step;
use crate::chain::{ReasoningChain, StepRecord};

/// Apply modus ponens: from P and P → Q, conclude Q.
///
/// Returns whether Q can be derived, which requires both premises to hold.
/// A derived conclusion is deductively certain (confidence 1.0); when the
/// premises do not support the inference the recorded confidence is 0.0.
pub fn apply_modus_ponens(
    p_is_true: bool,
    p_implies_q_is_true: bool,
    chain: Option<&mut ReasoningChain>,
) -> bool {
    let conclusion = p_is_true && p_implies_q_is_true;

    debug!(
        p = p_is_true,
        p_implies_q = p_implies_q_is_true,
        conclusion = conclusion,
        "Modus ponens applied"
    );

    let evidence = if conclusion {
        "Both P and P -> Q hold, so Q follows by modus ponens."
    } else {
        "Premises do not jointly hold; Q cannot be derived."
    };

    note_step(
        chain,
        StepRecord::new(
            "Deductive Reasoning: Modus Ponens",
            format!(
                "Evaluating modus ponens with P={} and P->Q={}",
                p_is_true, p_implies_q_is_true
            ),
            format!("Q={}", conclusion),
        )
        .with_confidence(if conclusion { 1.0 } else { 0.0 })
        .with_evidence(evidence)
        .with_assumption("Premise truth values are accurate"),
    );

    conclusion
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modus_ponens_derives_q() {
        assert!(apply_modus_ponens(true, true, None));
    }

    #[test]
    fn test_modus_ponens_fails_without_implication() {
        assert!(!apply_modus_ponens(true, false, None));
    }

    #[test]
    fn test_modus_ponens_fails_without_antecedent() {
        assert!(!apply_modus_ponens(false, true, None));
        assert!(!apply_modus_ponens(false, false, None));
    }

    #[test]
    fn test_chain_records_certain_conclusion() {
        let mut chain = ReasoningChain::new();
        apply_modus_ponens(true, true, Some(&mut chain));

        assert_eq!(chain.len(), 1);
        let step = &chain.steps()[0];
        assert_eq!(step.confidence, 1.0);
        assert_eq!(step.result, "Q=true");
    }

    #[test]
    fn test_chain_records_failed_derivation() {
        let mut chain = ReasoningChain::new();
        apply_modus_ponens(false, true, Some(&mut chain));

        let step = &chain.steps()[0];
        assert_eq!(step.confidence, 0.0);
        assert_eq!(step.result, "Q=false");
    }

    #[test]
    fn test_chained_inference() {
        let mut chain = ReasoningChain::new();
        let b = apply_modus_ponens(true, true, Some(&mut chain));
        let c = apply_modus_ponens(b, true, Some(&mut chain));
        assert!(c);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.overall_confidence(), Some(1.0));
    }
}
