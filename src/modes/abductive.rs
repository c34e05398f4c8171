//! Abductive reasoning: inference to the best explanation.
//!
//! Observations are reduced to keyword buckets, candidate explanations are
//! produced from a fixed hypothesis family plus domain templates, and each
//! hypothesis is scored by coverage, simplicity (Occam's razor) and
//! specificity. Ranking is stable under ties and degrades gracefully on
//! partially formed hypotheses.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::note_step;
use crate::chain::{clamp_confidence, ReasoningChain, StepRecord};
use crate::config::{
    BASE_CONFIDENCE_ABDUCTIVE, EVIDENCE_SUPPORT_HIGH_THRESHOLD,
    EVIDENCE_SUPPORT_MODERATE_THRESHOLD, EVIDENCE_SUPPORT_MULTIPLIER, KEYWORD_LENGTH_LIMIT,
    LimitsConfig, MAX_THEMES_RETURNED, MIN_KEYWORD_LENGTH, SIMPLICITY_ASSUMPTION_PENALTY,
    SPECIFICITY_PREDICTIONS_MINIMUM, THEME_FREQUENCY_THRESHOLD,
};
use crate::error::{ReasoningResult, ValidationError};
use crate::sanitize::fill_template;

const GENERATION_STAGE: &str = "Abductive Reasoning: Hypothesis Generation";
const RANKING_STAGE: &str = "Abductive Reasoning: Hypothesis Ranking";
const SELECTION_STAGE: &str = "Abductive Reasoning: Best Explanation Selection";

static WORD_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z0-9]+").expect("valid token pattern"));

/// Common words excluded from keyword extraction.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "and", "or", "but", "in", "with", "to", "for",
    "of", "as", "by", "that", "this", "it", "from", "are", "be", "was", "were", "been", "have",
    "has", "had", "do", "does", "did", "will", "would", "could", "should", "may", "might", "can",
    "must", "shall", "very", "really",
];

const ACTION_WORDS: &[&str] = &["deploy", "deployment", "update", "restart", "change"];
const ACTION_MODIFIERS: &[&str] = &["recent", "code", "new"];
const COMPONENT_WORDS: &[&str] = &["server", "database", "cache", "api", "network", "application"];
const RESOURCE_WORDS: &[&str] = &["cpu", "memory", "disk", "network"];

/// Fallbacks used when a keyword bucket is empty at template-fill time.
const FALLBACK_ACTION: &str = "recent change";
const FALLBACK_COMPONENT: &str = "system";
const FALLBACK_ISSUE: &str = "performance issue";

/// A domain's trigger keywords and hypothesis templates.
struct DomainTemplates {
    name: &'static str,
    keywords: &'static [&'static str],
    templates: &'static [&'static str],
}

const DOMAINS: &[DomainTemplates] = &[
    DomainTemplates {
        name: "debugging",
        keywords: &[
            "deploy", "code", "server", "database", "cpu", "memory", "slow", "error",
        ],
        templates: &[
            "{action} introduced {issue} in {component}",
            "{component} experiencing {issue} due to {action}",
            "Performance regression in {component} from {action} causing {issue}",
            "{action} causing {component} resource exhaustion due to {issue}",
        ],
    },
    DomainTemplates {
        name: "system",
        keywords: &["connection", "network", "timeout", "latency", "load"],
        templates: &[
            "Network or connection {issue} affecting {component}",
            "Load balancing problem causing {issue} in {component}",
            "{component} contention due to {action} causing {issue}",
        ],
    },
];

/// Keywords extracted from observations, grouped by role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordBuckets {
    /// Action phrases ("recent deploy", "restart").
    pub actions: Vec<String>,
    /// Affected components ("database", "server").
    pub components: Vec<String>,
    /// Observed issues ("high CPU usage", "errors").
    pub issues: Vec<String>,
}

impl KeywordBuckets {
    /// Whether all buckets are empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.components.is_empty() && self.issues.is_empty()
    }
}

/// The kind of explanation a hypothesis offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisKind {
    /// One explanation covering all observations.
    SingleCause,
    /// Several contributing factors.
    MultipleCauses,
    /// Observations form a causal progression.
    CausalChain,
    /// Produced from a domain template.
    DomainTemplate,
    /// Derived from caller-supplied context.
    #[default]
    Contextual,
    /// A system-wide root cause.
    Systemic,
}

impl HypothesisKind {
    /// Stable string identifier for the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            HypothesisKind::SingleCause => "single_cause",
            HypothesisKind::MultipleCauses => "multiple_causes",
            HypothesisKind::CausalChain => "causal_chain",
            HypothesisKind::DomainTemplate => "domain_template",
            HypothesisKind::Contextual => "contextual",
            HypothesisKind::Systemic => "systemic",
        }
    }
}

impl std::fmt::Display for HypothesisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Evaluation metadata attached to a selected best explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// How many hypotheses competed.
    pub total_hypotheses: usize,
    /// Rank of this hypothesis (1 = best).
    pub rank: usize,
    /// Whether this hypothesis was selected as best.
    pub selected_as_best: bool,
    /// Why it was selected.
    pub selection_reason: String,
}

/// A candidate explanation for a set of observations.
///
/// Every collection field defaults to empty, so partially formed
/// hypotheses deserialize and rank without lookup failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hypothesis {
    /// The explanation text.
    pub explanation: String,
    /// Confidence in the explanation (0.0-1.0).
    #[serde(default)]
    pub confidence: f64,
    /// The kind of explanation.
    #[serde(default)]
    pub kind: HypothesisKind,
    /// Indices of the observations this hypothesis explains.
    #[serde(default)]
    pub explains: Vec<usize>,
    /// Assumptions the hypothesis rests on.
    #[serde(default)]
    pub assumptions: Vec<String>,
    /// Predictions that would test the hypothesis.
    #[serde(default)]
    pub testable_predictions: Vec<String>,
    /// Evidence accumulated in support of the hypothesis.
    #[serde(default)]
    pub supporting_evidence: Vec<String>,
    /// Evaluation metadata, present after best-explanation selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
}

impl Hypothesis {
    /// Create a hypothesis with the given kind and explanation.
    pub fn new(kind: HypothesisKind, explanation: impl Into<String>) -> Self {
        Self {
            explanation: explanation.into(),
            kind,
            ..Self::default()
        }
    }

    fn explaining_all(mut self, total_observations: usize) -> Self {
        self.explains = (0..total_observations).collect();
        self
    }

    fn with_assumptions(mut self, assumptions: Vec<String>) -> Self {
        self.assumptions = assumptions;
        self
    }

    fn with_predictions(mut self, predictions: Vec<String>) -> Self {
        self.testable_predictions = predictions;
        self
    }

    fn scored(mut self, total_observations: usize) -> Self {
        self.confidence = hypothesis_confidence(
            total_observations,
            self.explains.len(),
            self.assumptions.len(),
            self.testable_predictions.len(),
        );
        self
    }
}

// ============================================================================
// Keyword extraction
// ============================================================================

/// Extract unique, stop-word-filtered keywords from free text.
///
/// Deterministic: tokens are lowercased, filtered and sorted.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut keywords: Vec<String> = WORD_TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .filter(|w| w.len() > MIN_KEYWORD_LENGTH && !STOP_WORDS.contains(&w.as_str()))
        .collect();
    keywords.sort();
    keywords.dedup();
    keywords
}

/// Extract action/component/issue keyword buckets from observations.
///
/// Empty or whitespace-only input produces empty buckets, not an error;
/// fallback values are applied later, at template-fill time.
pub fn extract_keyword_buckets(observations: &[String], context: Option<&str>) -> KeywordBuckets {
    let limits = LimitsConfig::default();
    let mut text = observations
        .iter()
        .map(|o| truncate_chars(o, limits.max_observation_length))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if let Some(context) = context {
        text.push(' ');
        text.push_str(&truncate_chars(context, limits.max_context_length).to_lowercase());
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let mut buckets = KeywordBuckets::default();

    for (i, word) in words.iter().enumerate() {
        if ACTION_WORDS.contains(word) {
            let modifier = match i.checked_sub(1).map(|p| words[p]) {
                Some(prev) if ACTION_MODIFIERS.contains(&prev) => format!("{} ", prev),
                _ => String::new(),
            };
            buckets.actions.push(format!("{}{}", modifier, word));
        }

        if COMPONENT_WORDS.contains(word) {
            buckets.components.push(word.to_string());
        }

        if RESOURCE_WORDS.contains(word) {
            let qualified = match i.checked_sub(1).map(|p| words[p]) {
                Some(prev) if prev == "high" || prev == "low" => {
                    format!("{} {} usage", prev, word.to_uppercase())
                }
                _ => format!("high {} usage", word.to_uppercase()),
            };
            buckets.issues.push(qualified);
        } else if *word == "slow" || *word == "slowly" {
            let issue = match i.checked_sub(1).map(|p| words[p]) {
                Some("responding") => "slow response times",
                _ => "performance issues",
            };
            buckets.issues.push(issue.to_string());
        } else if matches!(*word, "error" | "errors" | "crash" | "failure") {
            let singular = word.trim_end_matches('s');
            buckets.issues.push(format!("{}s", singular));
        }
    }

    buckets
}

/// Find keywords shared across multiple observations, most frequent first.
fn common_themes(observations: &[String]) -> Vec<String> {
    let mut frequency: HashMap<String, usize> = HashMap::new();
    for observation in observations {
        for keyword in extract_keywords(observation) {
            *frequency.entry(keyword).or_insert(0) += 1;
        }
    }

    let mut themes: Vec<(String, usize)> = frequency
        .into_iter()
        .filter(|(_, count)| *count >= THEME_FREQUENCY_THRESHOLD)
        .collect();
    // Frequency descending, then alphabetical for determinism.
    themes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    themes
        .into_iter()
        .take(MAX_THEMES_RETURNED)
        .map(|(keyword, _)| keyword)
        .collect()
}

// ============================================================================
// Hypothesis generation
// ============================================================================

/// Generate plausible explanatory hypotheses from observations.
///
/// An empty observation list yields an empty hypothesis list. When a chain
/// is supplied one step is recorded.
pub fn generate_hypotheses(
    observations: &[String],
    chain: Option<&mut ReasoningChain>,
) -> ReasoningResult<Vec<Hypothesis>> {
    generate_hypotheses_with_context(observations, None, chain)
}

/// [`generate_hypotheses`] with additional free-text context.
///
/// Context activates domain-template hypotheses when its keywords match a
/// known domain, or a contextual fallback hypothesis otherwise.
pub fn generate_hypotheses_with_context(
    observations: &[String],
    context: Option<&str>,
    chain: Option<&mut ReasoningChain>,
) -> ReasoningResult<Vec<Hypothesis>> {
    let limits = LimitsConfig::default();
    let observations: Vec<String> = observations
        .iter()
        .map(|o| truncate_chars(o, limits.max_observation_length))
        .collect();
    let context = context.map(|c| truncate_chars(c, limits.max_context_length));

    if observations.is_empty() {
        note_step(
            chain,
            StepRecord::new(
                GENERATION_STAGE,
                "No observations provided for hypothesis generation",
                "[]",
            )
            .with_confidence(0.0),
        );
        return Ok(Vec::new());
    }

    let total = observations.len();
    let themes = common_themes(&observations);
    let mut hypotheses = Vec::new();

    if let Some(primary) = themes.first() {
        hypotheses.push(
            Hypothesis::new(
                HypothesisKind::SingleCause,
                format!("The observations are caused by {}", primary),
            )
            .explaining_all(total)
            .with_assumptions(vec![format!("{} is the primary cause", primary)])
            .with_predictions(vec![
                format!("Removing {} should stop the observations", primary),
                format!("Changing {} should change the observations", primary),
            ])
            .scored(total),
        );
    }

    if themes.len() >= 2 {
        let leading: Vec<String> = themes.iter().take(3).cloned().collect();
        hypotheses.push(
            Hypothesis::new(
                HypothesisKind::MultipleCauses,
                format!("Multiple factors are contributing: {}", leading.join(", ")),
            )
            .explaining_all(total)
            .with_assumptions(
                leading
                    .iter()
                    .map(|theme| format!("{} is a contributing factor", theme))
                    .collect(),
            )
            .with_predictions(vec![
                "Addressing each factor should reduce corresponding observations".to_string(),
                "Combined intervention should have greater effect than individual".to_string(),
            ])
            .scored(total),
        );
    }

    if total >= 2 {
        hypotheses.push(
            Hypothesis::new(
                HypothesisKind::CausalChain,
                "The observations represent a causal chain or progression",
            )
            .explaining_all(total)
            .with_assumptions(vec![
                "Observations occur in a temporal sequence".to_string(),
                "Earlier observations influence later ones".to_string(),
            ])
            .with_predictions(vec![
                "Intervening early should prevent later observations".to_string(),
                "Reversing the order should change outcomes".to_string(),
            ])
            .scored(total),
        );
    }

    if let Some(context) = &context {
        let domain = matching_domain(&observations, context);
        match domain {
            Some(domain) => {
                hypotheses.extend(template_hypotheses(&observations, context, domain));
            }
            None => {
                if let Some(hypothesis) = contextual_hypothesis(&observations, context) {
                    hypotheses.push(hypothesis);
                }
            }
        }
    }

    hypotheses.push(
        Hypothesis::new(
            HypothesisKind::Systemic,
            "The observations indicate a systemic issue affecting multiple components",
        )
        .explaining_all(total)
        .with_assumptions(vec![
            "Multiple observations share a common root cause".to_string(),
            "System-wide factors are at play".to_string(),
        ])
        .with_predictions(vec![
            "Addressing the root cause should resolve all observations".to_string(),
            "Similar issues may appear in other related areas".to_string(),
        ])
        .scored(total),
    );

    sort_by_confidence(&mut hypotheses);
    hypotheses.truncate(limits.max_hypotheses);

    let top_confidence = hypotheses.first().map(|h| h.confidence).unwrap_or(0.0);
    debug!(
        observation_count = total,
        hypothesis_count = hypotheses.len(),
        top_confidence = top_confidence,
        "Hypotheses generated"
    );
    note_step(
        chain,
        StepRecord::new(
            GENERATION_STAGE,
            format!("Generating hypotheses to explain {} observations", total),
            format!("{} candidate explanations", hypotheses.len()),
        )
        .with_confidence(top_confidence)
        .with_evidence(format!(
            "Generated {} hypotheses from {} observations",
            hypotheses.len(),
            total
        ))
        .with_assumptions(vec![
            "Observations are accurate and relevant".to_string(),
            "Generated hypotheses are plausible".to_string(),
        ]),
    );

    Ok(hypotheses)
}

/// Pick the first domain whose trigger keywords appear in the input.
fn matching_domain(observations: &[String], context: &str) -> Option<&'static DomainTemplates> {
    let mut text = observations.join(" ").to_lowercase();
    text.push(' ');
    text.push_str(&context.to_lowercase());
    DOMAINS
        .iter()
        .find(|domain| domain.keywords.iter().any(|k| text.contains(k)))
}

/// Build hypotheses from a domain's templates and the keyword buckets.
fn template_hypotheses(
    observations: &[String],
    context: &str,
    domain: &DomainTemplates,
) -> Vec<Hypothesis> {
    let limits = LimitsConfig::default();
    let buckets = extract_keyword_buckets(observations, Some(context));
    let total = observations.len();
    let mut hypotheses = Vec::new();

    for (index, template) in domain
        .templates
        .iter()
        .take(limits.max_hypotheses)
        .enumerate()
    {
        let action = pick_keyword(&buckets.actions, 0, FALLBACK_ACTION);
        let component = pick_keyword(&buckets.components, index, FALLBACK_COMPONENT);
        let issue = pick_keyword(&buckets.issues, index, FALLBACK_ISSUE);

        let filled = fill_template(
            template,
            &[
                ("action", action.as_str()),
                ("component", component.as_str()),
                ("issue", issue.as_str()),
            ],
        );
        let explanation = capitalize_first(&filled);

        hypotheses.push(
            Hypothesis::new(HypothesisKind::DomainTemplate, explanation)
                .explaining_all(total)
                .with_assumptions(vec![format!(
                    "The {} domain is relevant to the issue",
                    domain.name
                )])
                .with_predictions(vec![
                    format!("Reverting the {} should reduce or resolve the {}", action, issue),
                    format!(
                        "Monitoring {} metrics should show correlation with the issue",
                        component
                    ),
                ])
                .scored(total),
        );
    }

    hypotheses
}

/// Fallback contextual hypothesis when no domain matches.
fn contextual_hypothesis(observations: &[String], context: &str) -> Option<Hypothesis> {
    let keywords: Vec<String> = extract_keywords(context)
        .into_iter()
        .take(MAX_THEMES_RETURNED)
        .map(|k| truncate_chars(&k, KEYWORD_LENGTH_LIMIT))
        .collect();
    if keywords.is_empty() {
        return None;
    }

    let total = observations.len();
    let explanation = format!(
        "The observations are related to the context: {}",
        keywords.join(", ")
    );

    Some(
        Hypothesis::new(HypothesisKind::Contextual, explanation)
            .explaining_all(total)
            .with_assumptions(vec![
                "Context is relevant to observations".to_string(),
                format!("{} is a key factor", keywords[0]),
            ])
            .with_predictions(vec![
                "Changing the context should change the observations".to_string(),
                "Similar contexts should produce similar observations".to_string(),
            ])
            .scored(total),
    )
}

fn pick_keyword(bucket: &[String], index: usize, fallback: &str) -> String {
    let keyword = match bucket.len() {
        0 => fallback.to_string(),
        len => bucket[index.min(len - 1)].clone(),
    };
    truncate_chars(keyword.trim(), KEYWORD_LENGTH_LIMIT)
}

// ============================================================================
// Ranking and selection
// ============================================================================

/// Rank hypotheses by descending confidence.
///
/// Sorting is stable, so ties keep their generation order. Non-finite
/// confidence values are rejected; out-of-range values are clamped.
pub fn rank_hypotheses(
    hypotheses: Vec<Hypothesis>,
    chain: Option<&mut ReasoningChain>,
) -> ReasoningResult<Vec<Hypothesis>> {
    if hypotheses.is_empty() {
        note_step(
            chain,
            StepRecord::new(RANKING_STAGE, "No hypotheses provided for ranking", "[]")
                .with_confidence(0.0),
        );
        return Ok(Vec::new());
    }

    let mut ranked = validate_confidences(hypotheses)?;
    sort_by_confidence(&mut ranked);

    let top_confidence = ranked.first().map(|h| h.confidence).unwrap_or(0.0);
    note_step(
        chain,
        StepRecord::new(
            RANKING_STAGE,
            format!("Ranking {} hypotheses by confidence", ranked.len()),
            format!("best: {}", ranked[0].explanation),
        )
        .with_confidence(top_confidence),
    );

    Ok(ranked)
}

/// Re-rank hypotheses in light of new evidence.
///
/// Each hypothesis gains confidence proportional to the average keyword
/// overlap between its explanation and the evidence; well-supported
/// hypotheses receive a textual annotation.
pub fn update_hypotheses_with_evidence(
    hypotheses: Vec<Hypothesis>,
    new_evidence: &[String],
    chain: Option<&mut ReasoningChain>,
) -> ReasoningResult<Vec<Hypothesis>> {
    if hypotheses.is_empty() {
        note_step(
            chain,
            StepRecord::new(RANKING_STAGE, "No hypotheses provided for ranking", "[]")
                .with_confidence(0.0),
        );
        return Ok(Vec::new());
    }

    let mut updated = validate_confidences(hypotheses)?;

    for hypothesis in &mut updated {
        let hypothesis_keywords = extract_keywords(&hypothesis.explanation);
        let mut support = 0.0;
        let mut scored_evidence = 0.0;

        for evidence in new_evidence {
            let evidence_keywords = extract_keywords(evidence);
            let overlap = evidence_keywords
                .iter()
                .filter(|k| hypothesis_keywords.contains(k))
                .count();
            let union = evidence_keywords.len() + hypothesis_keywords.len() - overlap;
            if union > 0 {
                support += overlap as f64 / union as f64;
                scored_evidence += 1.0;
            }
        }

        let average_support = if scored_evidence > 0.0 {
            support / scored_evidence
        } else {
            0.0
        };

        hypothesis.confidence = clamp_confidence(
            hypothesis.confidence * (1.0 + EVIDENCE_SUPPORT_MULTIPLIER * average_support),
        );
        hypothesis
            .supporting_evidence
            .extend(new_evidence.iter().cloned());

        if average_support > EVIDENCE_SUPPORT_HIGH_THRESHOLD {
            hypothesis
                .explanation
                .push_str(" (strongly supported by new evidence)");
        } else if average_support > EVIDENCE_SUPPORT_MODERATE_THRESHOLD {
            hypothesis.explanation.push_str(" (supported by new evidence)");
        }
    }

    sort_by_confidence(&mut updated);

    let top_confidence = updated.first().map(|h| h.confidence).unwrap_or(0.0);
    note_step(
        chain,
        StepRecord::new(
            RANKING_STAGE,
            format!(
                "Updating {} hypotheses against {} pieces of new evidence",
                updated.len(),
                new_evidence.len()
            ),
            format!("best: {}", updated[0].explanation),
        )
        .with_confidence(top_confidence)
        .with_evidence(format!(
            "Hypotheses re-ranked using {} pieces of new evidence",
            new_evidence.len()
        )),
    );

    Ok(updated)
}

/// Select the best explanation from a set of hypotheses.
///
/// Returns `Ok(None)` for an empty set rather than an error.
/// Ties keep the earliest hypothesis.
pub fn evaluate_best_explanation(
    hypotheses: &[Hypothesis],
    chain: Option<&mut ReasoningChain>,
) -> ReasoningResult<Option<Hypothesis>> {
    if hypotheses.is_empty() {
        note_step(
            chain,
            StepRecord::new(
                SELECTION_STAGE,
                "No hypotheses provided for evaluation",
                "none",
            )
            .with_confidence(0.0),
        );
        return Ok(None);
    }

    let mut best_index = 0;
    for (index, hypothesis) in hypotheses.iter().enumerate() {
        validate_confidence(hypothesis.confidence, index)?;
        if hypothesis.confidence > hypotheses[best_index].confidence {
            best_index = index;
        }
    }

    let mut best = hypotheses[best_index].clone();
    best.confidence = clamp_confidence(best.confidence);
    best.evaluation = Some(Evaluation {
        total_hypotheses: hypotheses.len(),
        rank: 1,
        selected_as_best: true,
        selection_reason: format!("Highest confidence score ({:.3})", best.confidence),
    });

    note_step(
        chain,
        StepRecord::new(
            SELECTION_STAGE,
            format!(
                "Evaluating {} hypotheses to select best explanation",
                hypotheses.len()
            ),
            best.explanation.clone(),
        )
        .with_confidence(best.confidence)
        .with_evidence(format!(
            "Selected from {} hypotheses based on confidence score",
            hypotheses.len()
        )),
    );

    Ok(Some(best))
}

// ============================================================================
// Scoring helpers
// ============================================================================

/// Confidence = base × coverage × simplicity × specificity, clamped.
fn hypothesis_confidence(
    total_observations: usize,
    explained_observations: usize,
    assumption_count: usize,
    prediction_count: usize,
) -> f64 {
    let coverage = if total_observations > 0 {
        explained_observations as f64 / total_observations as f64
    } else {
        0.0
    };
    let simplicity = 1.0 / (1.0 + SIMPLICITY_ASSUMPTION_PENALTY * assumption_count as f64);
    let specificity = (prediction_count as f64 / SPECIFICITY_PREDICTIONS_MINIMUM).min(1.0);

    clamp_confidence(BASE_CONFIDENCE_ABDUCTIVE * coverage * simplicity * specificity)
}

fn validate_confidence(confidence: f64, index: usize) -> Result<(), ValidationError> {
    if confidence.is_nan() {
        return Err(ValidationError::new(
            format!("hypotheses[{}].confidence", index),
            "cannot be NaN",
        ));
    }
    if confidence.is_infinite() {
        return Err(ValidationError::new(
            format!("hypotheses[{}].confidence", index),
            "cannot be infinite",
        ));
    }
    Ok(())
}

fn validate_confidences(hypotheses: Vec<Hypothesis>) -> Result<Vec<Hypothesis>, ValidationError> {
    let mut validated = hypotheses;
    for (index, hypothesis) in validated.iter_mut().enumerate() {
        validate_confidence(hypothesis.confidence, index)?;
        hypothesis.confidence = clamp_confidence(hypothesis.confidence);
    }
    Ok(validated)
}

/// Stable descending sort; confidences are finite by this point.
fn sort_by_confidence(hypotheses: &mut [Hypothesis]) {
    hypotheses.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Truncate to a maximum number of characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.trim().to_string();
    }
    text.chars().take(max_chars).collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observations(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_extract_keywords_filters_and_sorts() {
        let keywords = extract_keywords("The database is slow and the database failed");
        assert_eq!(keywords, vec!["database", "failed", "slow"]);
    }

    #[test]
    fn test_extract_keywords_empty_input() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   \t  ").is_empty());
    }

    #[test]
    fn test_keyword_buckets_detects_roles() {
        let buckets = extract_keyword_buckets(
            &observations(&["recent deploy made the database respond slowly", "high cpu load"]),
            None,
        );
        assert_eq!(buckets.actions, vec!["recent deploy"]);
        assert_eq!(buckets.components, vec!["database"]);
        assert!(buckets.issues.contains(&"performance issues".to_string()));
        assert!(buckets.issues.contains(&"high CPU usage".to_string()));
    }

    #[test]
    fn test_keyword_buckets_empty_for_whitespace() {
        let buckets = extract_keyword_buckets(&observations(&["   "]), None);
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_common_themes_requires_repetition() {
        let themes = common_themes(&observations(&[
            "database is slow",
            "database errors rising",
            "cache is fine",
        ]));
        assert_eq!(themes, vec!["database"]);
    }

    #[test]
    fn test_generate_hypotheses_empty_observations() {
        let hypotheses = generate_hypotheses(&[], None).unwrap();
        assert!(hypotheses.is_empty());
    }

    #[test]
    fn test_generate_hypotheses_always_includes_systemic() {
        let hypotheses = generate_hypotheses(&observations(&["one observation"]), None).unwrap();
        assert!(hypotheses
            .iter()
            .any(|h| h.kind == HypothesisKind::Systemic));
    }

    #[test]
    fn test_generate_hypotheses_confidences_bounded_and_sorted() {
        let hypotheses = generate_hypotheses(
            &observations(&["database is slow", "database errors", "database timeouts"]),
            None,
        )
        .unwrap();
        assert!(!hypotheses.is_empty());
        for pair in hypotheses.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        for hypothesis in &hypotheses {
            assert!((0.0..=1.0).contains(&hypothesis.confidence));
        }
    }

    #[test]
    fn test_generate_with_context_uses_domain_templates() {
        let hypotheses = generate_hypotheses_with_context(
            &observations(&["server responding slowly after deploy"]),
            Some("recent code deploy to the api server"),
            None,
        )
        .unwrap();
        assert!(hypotheses
            .iter()
            .any(|h| h.kind == HypothesisKind::DomainTemplate));
    }

    #[test]
    fn test_generate_with_unmatched_context_falls_back_to_contextual() {
        let hypotheses = generate_hypotheses_with_context(
            &observations(&["plants are wilting", "leaves turning yellow"]),
            Some("greenhouse irrigation schedule changed drastically"),
            None,
        )
        .unwrap();
        assert!(hypotheses
            .iter()
            .any(|h| h.kind == HypothesisKind::Contextual));
    }

    #[test]
    fn test_rank_hypotheses_empty_is_defined() {
        let ranked = rank_hypotheses(Vec::new(), None).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rank_hypotheses_stable_on_ties() {
        let hypotheses = vec![
            Hypothesis {
                explanation: "first".to_string(),
                confidence: 0.5,
                ..Hypothesis::default()
            },
            Hypothesis {
                explanation: "second".to_string(),
                confidence: 0.5,
                ..Hypothesis::default()
            },
            Hypothesis {
                explanation: "third".to_string(),
                confidence: 0.9,
                ..Hypothesis::default()
            },
        ];
        let ranked = rank_hypotheses(hypotheses, None).unwrap();
        assert_eq!(ranked[0].explanation, "third");
        assert_eq!(ranked[1].explanation, "first");
        assert_eq!(ranked[2].explanation, "second");
    }

    #[test]
    fn test_rank_hypotheses_rejects_nan() {
        let hypotheses = vec![Hypothesis {
            confidence: f64::NAN,
            ..Hypothesis::default()
        }];
        let err = rank_hypotheses(hypotheses, None).unwrap_err();
        assert!(err.to_string().contains("hypotheses[0].confidence"));
    }

    #[test]
    fn test_rank_hypotheses_clamps_out_of_range() {
        let hypotheses = vec![Hypothesis {
            confidence: 3.5,
            ..Hypothesis::default()
        }];
        let ranked = rank_hypotheses(hypotheses, None).unwrap();
        assert_eq!(ranked[0].confidence, 1.0);
    }

    #[test]
    fn test_partial_hypothesis_deserializes_with_defaults() {
        let hypothesis: Hypothesis =
            serde_json::from_str(r#"{"explanation": "minimal"}"#).unwrap();
        assert_eq!(hypothesis.confidence, 0.0);
        assert!(hypothesis.testable_predictions.is_empty());
        assert!(hypothesis.assumptions.is_empty());
    }

    #[test]
    fn test_update_with_evidence_boosts_overlapping_hypothesis() {
        let hypotheses = vec![
            Hypothesis {
                explanation: "Server overload causing slow database queries".to_string(),
                confidence: 0.5,
                ..Hypothesis::default()
            },
            Hypothesis {
                explanation: "Unrelated cosmic rays".to_string(),
                confidence: 0.5,
                ..Hypothesis::default()
            },
        ];
        let evidence = observations(&["database queries slow under server load"]);
        let updated = update_hypotheses_with_evidence(hypotheses, &evidence, None).unwrap();

        assert_eq!(
            updated[0].explanation.split(" (").next().unwrap(),
            "Server overload causing slow database queries"
        );
        assert!(updated[0].confidence > updated[1].confidence);
        assert_eq!(updated[0].supporting_evidence.len(), 1);
    }

    #[test]
    fn test_evaluate_best_explanation_empty_is_none() {
        assert!(evaluate_best_explanation(&[], None).unwrap().is_none());
    }

    #[test]
    fn test_evaluate_best_explanation_picks_highest_and_annotates() {
        let hypotheses = vec![
            Hypothesis {
                explanation: "weaker".to_string(),
                confidence: 0.4,
                ..Hypothesis::default()
            },
            Hypothesis {
                explanation: "stronger".to_string(),
                confidence: 0.8,
                ..Hypothesis::default()
            },
        ];
        let best = evaluate_best_explanation(&hypotheses, None)
            .unwrap()
            .unwrap();
        assert_eq!(best.explanation, "stronger");
        let evaluation = best.evaluation.unwrap();
        assert_eq!(evaluation.total_hypotheses, 2);
        assert!(evaluation.selected_as_best);
    }

    #[test]
    fn test_evaluate_best_explanation_tie_keeps_first() {
        let hypotheses = vec![
            Hypothesis {
                explanation: "first".to_string(),
                confidence: 0.6,
                ..Hypothesis::default()
            },
            Hypothesis {
                explanation: "second".to_string(),
                confidence: 0.6,
                ..Hypothesis::default()
            },
        ];
        let best = evaluate_best_explanation(&hypotheses, None)
            .unwrap()
            .unwrap();
        assert_eq!(best.explanation, "first");
    }

    #[test]
    fn test_hypothesis_confidence_prefers_fewer_assumptions() {
        let few = hypothesis_confidence(3, 3, 1, 2);
        let many = hypothesis_confidence(3, 3, 4, 2);
        assert!(few > many);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
