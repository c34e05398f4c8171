//! Integration tests for the abductive hypothesis engine.

use pretty_assertions::assert_eq;

use reasoning_kit::chain::ReasoningChain;
use reasoning_kit::modes::abductive::{
    evaluate_best_explanation, generate_hypotheses, generate_hypotheses_with_context,
    rank_hypotheses, update_hypotheses_with_evidence, Hypothesis, HypothesisKind,
};

fn observations(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

#[test]
fn test_full_abductive_flow_records_chain_steps() {
    let mut chain = ReasoningChain::new();
    let obs = observations(&[
        "database queries are slow",
        "database cpu is high",
        "database errors increasing",
    ]);

    let hypotheses = generate_hypotheses(&obs, Some(&mut chain)).unwrap();
    assert!(!hypotheses.is_empty());

    let ranked = rank_hypotheses(hypotheses, Some(&mut chain)).unwrap();
    let best = evaluate_best_explanation(&ranked, Some(&mut chain))
        .unwrap()
        .unwrap();

    assert!(best.confidence > 0.0);
    assert!(best.evaluation.is_some());
    assert_eq!(chain.len(), 3);
}

#[test]
fn test_generation_produces_single_cause_for_shared_theme() {
    let hypotheses = generate_hypotheses(
        &observations(&["database is slow", "database errors", "database restarted"]),
        None,
    )
    .unwrap();

    let single = hypotheses
        .iter()
        .find(|h| h.kind == HypothesisKind::SingleCause)
        .expect("shared theme should produce a single-cause hypothesis");
    assert!(single.explanation.contains("database"));
    assert!(!single.testable_predictions.is_empty());
}

#[test]
fn test_generation_caps_hypothesis_count() {
    let hypotheses = generate_hypotheses_with_context(
        &observations(&[
            "server slow after deploy",
            "server errors after deploy",
            "database cpu high after deploy",
        ]),
        Some("recent code deploy to production servers"),
        None,
    )
    .unwrap();

    assert!(hypotheses.len() <= 5);
    for pair in hypotheses.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
}

#[test]
fn test_empty_observations_yield_empty_hypotheses() {
    let mut chain = ReasoningChain::new();
    let hypotheses = generate_hypotheses(&[], Some(&mut chain)).unwrap();
    assert!(hypotheses.is_empty());
    assert_eq!(chain.len(), 1);
    assert_eq!(chain.steps()[0].confidence, 0.0);
}

#[test]
fn test_rank_empty_is_defined_not_error() {
    let ranked = rank_hypotheses(Vec::new(), None).unwrap();
    assert!(ranked.is_empty());
}

#[test]
fn test_rank_rejects_nan_confidence() {
    let hypotheses = vec![
        Hypothesis {
            explanation: "fine".to_string(),
            confidence: 0.4,
            ..Hypothesis::default()
        },
        Hypothesis {
            explanation: "broken".to_string(),
            confidence: f64::NAN,
            ..Hypothesis::default()
        },
    ];
    let err = rank_hypotheses(hypotheses, None).unwrap_err();
    assert_eq!(err.error_code(), "validation_error");
    assert!(err.to_string().contains("hypotheses[1].confidence"));
}

#[test]
fn test_partial_hypotheses_never_fail_ranking() {
    // Hypotheses deserialized from minimal JSON carry defaulted fields.
    let partial: Vec<Hypothesis> = serde_json::from_str(
        r#"[
            {"explanation": "only text"},
            {"explanation": "with confidence", "confidence": 0.6}
        ]"#,
    )
    .unwrap();

    let ranked = rank_hypotheses(partial, None).unwrap();
    assert_eq!(ranked[0].explanation, "with confidence");
    assert_eq!(ranked[1].confidence, 0.0);
    assert!(ranked[1].testable_predictions.is_empty());
}

#[test]
fn test_evidence_update_promotes_supported_hypothesis() {
    let hypotheses = vec![
        Hypothesis {
            explanation: "Cosmic ray interference".to_string(),
            confidence: 0.5,
            ..Hypothesis::default()
        },
        Hypothesis {
            explanation: "Database connection pool exhausted under load".to_string(),
            confidence: 0.5,
            ..Hypothesis::default()
        },
    ];

    let updated = update_hypotheses_with_evidence(
        hypotheses,
        &observations(&["connection pool exhausted", "database load spiking"]),
        None,
    )
    .unwrap();

    assert!(updated[0].explanation.starts_with("Database connection pool"));
    assert_eq!(updated[0].supporting_evidence.len(), 2);
    assert!(updated[0].confidence > 0.5);
    assert!(updated[0].confidence <= 1.0);
}

#[test]
fn test_best_explanation_none_for_empty_set() {
    let mut chain = ReasoningChain::new();
    let best = evaluate_best_explanation(&[], Some(&mut chain)).unwrap();
    assert!(best.is_none());
    assert_eq!(chain.len(), 1);
}

#[test]
fn test_hypotheses_serialize_round_trip() {
    let hypotheses = generate_hypotheses(
        &observations(&["api latency rising", "api errors rising"]),
        None,
    )
    .unwrap();

    let json = serde_json::to_string(&hypotheses).unwrap();
    let parsed: Vec<Hypothesis> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.len(), hypotheses.len());
    for (original, round_tripped) in hypotheses.iter().zip(&parsed) {
        assert_eq!(original.explanation, round_tripped.explanation);
        assert_eq!(original.kind, round_tripped.kind);
    }
}

#[test]
fn test_template_values_are_literal_even_when_adversarial() {
    // An observation that smuggles template syntax must come out verbatim,
    // never trigger a second substitution pass.
    let hypotheses = generate_hypotheses_with_context(
        &observations(&["server responding slowly after deploy of {issue} build"]),
        Some("recent code deploy to the server"),
        None,
    )
    .unwrap();

    for hypothesis in &hypotheses {
        assert!(!hypothesis.explanation.contains("{action}"));
        assert!(!hypothesis.explanation.contains("{component}"));
    }
}
