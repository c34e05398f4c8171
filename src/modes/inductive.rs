//! Inductive reasoning: numeric sequence pattern detection.
//!
//! Detection runs a fixed family of hypotheses (arithmetic, geometric,
//! additive-recursive, polynomial via constant finite differences, and
//! exponential), each following the same shape: derive candidate
//! parameters, verify closeness, predict the next value. The first
//! confident match wins; no match is an explicit no-pattern result,
//! never a fabricated guess.
//!
//! Confidence per match is base × data-sufficiency × pattern-quality ×
//! complexity, clamped into [0, 1].

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::note_step;
use crate::chain::{clamp_confidence, ReasoningChain, StepRecord};
use crate::config::{
    BASE_CONFIDENCE_ARITHMETIC, BASE_CONFIDENCE_GEOMETRIC, BASE_CONFIDENCE_LUCAS_CLASSIC,
    BASE_CONFIDENCE_PATTERN_DESCRIPTION, BASE_CONFIDENCE_POLYNOMIAL, BASE_CONFIDENCE_RECURSIVE,
    BASE_CONFIDENCE_TRIBONACCI, COEFFICIENT_OF_VARIATION_DECAY, COMPLEXITY_POLYNOMIAL_DEGREE_FACTOR,
    COMPLEXITY_SCORE_ARITHMETIC, COMPLEXITY_SCORE_GEOMETRIC, COMPLEXITY_SCORE_RECURSIVE,
    DATA_SUFFICIENCY_MINIMUM_ARITHMETIC, DATA_SUFFICIENCY_MINIMUM_GEOMETRIC,
    DATA_SUFFICIENCY_MINIMUM_RECURSIVE, DATA_SUFFICIENCY_POLYNOMIAL_EXTRA,
    EXPONENTIAL_CONFIDENCE_CAP, EXPONENTIAL_RELATIVE_TOLERANCE, LimitsConfig,
    NUMERICAL_STABILITY_THRESHOLD, PATTERN_QUALITY_FLOOR, PATTERN_QUALITY_MINIMAL_DATA,
    POLYNOMIAL_LEVEL_TOLERANCE, RATIO_CLAMP_LIMIT, RECURSIVE_MATCH_TOLERANCE,
    RELATIVE_TOLERANCE_DEFAULT, ABSOLUTE_TOLERANCE_DEFAULT,
};
use crate::error::{ReasoningResult, ValidationError};
use crate::security::{log_security_event, SecurityEventType, SecuritySeverity};

/// Maximum polynomial degree considered by the finite-difference detector.
const MAX_POLYNOMIAL_DEGREE: usize = 3;

const PREDICTION_STAGE: &str = "Inductive Reasoning: Sequence Prediction";
const DESCRIPTION_STAGE: &str = "Inductive Reasoning: Pattern Description";
const RECURSIVE_STAGE: &str = "Inductive Reasoning: Recursive Pattern Detection";

/// Closeness tolerances for pattern verification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tolerances {
    /// Relative tolerance against the mean parameter.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
}

impl Tolerances {
    /// Create explicit tolerances.
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            rtol: RELATIVE_TOLERANCE_DEFAULT,
            atol: ABSOLUTE_TOLERANCE_DEFAULT,
        }
    }
}

/// An additive recursive pattern (Fibonacci family).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecursivePattern {
    /// Which recurrence matched.
    pub kind: RecursiveKind,
    /// The recurrence rule in closed form.
    pub rule: String,
    /// Predicted next term.
    pub next_term: f64,
    /// Confidence in the match (0.0-1.0).
    pub confidence: f64,
    /// Seed values the recurrence starts from.
    pub seed_values: Vec<f64>,
}

/// Kind of additive recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecursiveKind {
    /// Two-term recurrence seeded 1, 1.
    Fibonacci,
    /// Two-term recurrence seeded 2, 1.
    Lucas,
    /// Two-term recurrence with arbitrary seeds.
    LucasVariant,
    /// Three-term recurrence.
    Tribonacci,
}

impl RecursiveKind {
    /// Human-readable label for the recurrence kind.
    pub fn label(&self) -> &'static str {
        match self {
            RecursiveKind::Fibonacci => "Fibonacci",
            RecursiveKind::Lucas => "Lucas",
            RecursiveKind::LucasVariant => "Lucas-variant",
            RecursiveKind::Tribonacci => "Tribonacci",
        }
    }

    /// The recurrence rule in closed form.
    pub fn rule(&self) -> &'static str {
        match self {
            RecursiveKind::Fibonacci => "F[n] = F[n-1] + F[n-2]",
            RecursiveKind::Lucas | RecursiveKind::LucasVariant => "L[n] = L[n-1] + L[n-2]",
            RecursiveKind::Tribonacci => "T[n] = T[n-1] + T[n-2] + T[n-3]",
        }
    }
}

impl std::fmt::Display for RecursiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A polynomial pattern identified through constant finite differences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolynomialPattern {
    /// Polynomial degree (depth of the constant difference level).
    pub degree: usize,
    /// The constant value of the final difference level.
    pub level_difference: f64,
    /// Human-readable description.
    pub description: String,
    /// Predicted next term.
    pub next_term: f64,
    /// Confidence in the match (0.0-1.0).
    pub confidence: f64,
}

/// An exponential pattern `a * b^n` identified through a log-linear fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExponentialPattern {
    /// The base `b` of the fitted model.
    pub base: f64,
    /// The coefficient `a` of the fitted model.
    pub coefficient: f64,
    /// Human-readable description.
    pub description: String,
    /// Predicted next term.
    pub next_term: f64,
    /// Confidence in the match (0.0-1.0).
    pub confidence: f64,
    /// Raw goodness-of-fit score (0.0-1.0).
    pub match_score: f64,
}

// ============================================================================
// Public entry points
// ============================================================================

/// Predict the next number in a sequence, if a pattern is detected.
///
/// Checks, in order: arithmetic, geometric, additive-recursive, polynomial,
/// exponential. Returns `Ok(None)` when no hypothesis passes its closeness
/// test. When a chain is supplied one step is recorded per call.
///
/// # Errors
/// [`ValidationError`] when the sequence is empty, oversized, or contains
/// non-finite or excessively large elements.
pub fn predict_next_in_sequence(
    sequence: &[f64],
    chain: Option<&mut ReasoningChain>,
) -> ReasoningResult<Option<f64>> {
    predict_next_in_sequence_with(sequence, chain, &Tolerances::default())
}

/// [`predict_next_in_sequence`] with explicit closeness tolerances.
pub fn predict_next_in_sequence_with(
    sequence: &[f64],
    chain: Option<&mut ReasoningChain>,
    tolerances: &Tolerances,
) -> ReasoningResult<Option<f64>> {
    validate_sequence(sequence, "sequence")?;

    if sequence.len() < 2 {
        note_step(
            chain,
            StepRecord::new(
                PREDICTION_STAGE,
                format!("Sequence {:?} too short to determine a pattern", sequence),
                "none",
            )
            .with_confidence(0.0),
        );
        return Ok(None);
    }

    if let Some(m) = check_arithmetic(sequence, tolerances, BASE_CONFIDENCE_ARITHMETIC) {
        debug!(
            difference = m.parameter,
            prediction = m.prediction,
            confidence = m.confidence,
            "Arithmetic progression detected"
        );
        note_step(
            chain,
            StepRecord::new(
                PREDICTION_STAGE,
                format!(
                    "Identified arithmetic progression with common difference {}",
                    m.parameter
                ),
                format!("{}", m.prediction),
            )
            .with_confidence(m.confidence)
            .with_evidence(format!(
                "Common difference {} found in {:?}. Confidence derived from pattern quality and data sufficiency.",
                m.parameter, m.residuals
            ))
            .with_assumption("Sequence follows a simple arithmetic progression"),
        );
        return Ok(Some(m.prediction));
    }

    if let Some(m) = check_geometric(sequence, tolerances, BASE_CONFIDENCE_GEOMETRIC) {
        debug!(
            ratio = m.parameter,
            prediction = m.prediction,
            confidence = m.confidence,
            "Geometric progression detected"
        );
        note_step(
            chain,
            StepRecord::new(
                PREDICTION_STAGE,
                format!(
                    "Identified geometric progression with common ratio {}",
                    m.parameter
                ),
                format!("{}", m.prediction),
            )
            .with_confidence(m.confidence)
            .with_evidence(format!(
                "Common ratio {} found in {:?}. Confidence derived from pattern quality and data sufficiency.",
                m.parameter, m.residuals
            ))
            .with_assumption("Sequence follows a simple geometric progression"),
        );
        return Ok(Some(m.prediction));
    }

    if let Some(p) = recursive_match(sequence) {
        note_step(
            chain,
            StepRecord::new(
                PREDICTION_STAGE,
                format!("Identified {} recurrence: {}", p.kind.label(), p.rule),
                format!("{}", p.next_term),
            )
            .with_confidence(p.confidence)
            .with_evidence(format!(
                "Recurrence {} reproduces the sequence from seeds {:?}.",
                p.rule, p.seed_values
            ))
            .with_assumption(format!(
                "Sequence follows the {} recurrence relation",
                p.kind.label().to_lowercase()
            )),
        );
        return Ok(Some(p.next_term));
    }

    if let Some(p) = polynomial_match(sequence, MAX_POLYNOMIAL_DEGREE) {
        note_step(
            chain,
            StepRecord::new(
                PREDICTION_STAGE,
                format!("Identified {}", p.description),
                format!("{}", p.next_term),
            )
            .with_confidence(p.confidence)
            .with_evidence(format!(
                "Order-{} differences are constant at {}.",
                p.degree, p.level_difference
            ))
            .with_assumption("Sequence follows a low-degree polynomial"),
        );
        return Ok(Some(p.next_term));
    }

    if let Some(p) = exponential_match(sequence) {
        note_step(
            chain,
            StepRecord::new(
                PREDICTION_STAGE,
                format!("Identified {}", p.description),
                format!("{}", p.next_term),
            )
            .with_confidence(p.confidence)
            .with_evidence(format!(
                "Log-linear fit with base {:.3} and coefficient {:.3}.",
                p.base, p.coefficient
            ))
            .with_assumption("Sequence follows an exponential model"),
        );
        return Ok(Some(p.next_term));
    }

    note_step(
        chain,
        StepRecord::new(
            PREDICTION_STAGE,
            format!("No simple pattern found for sequence {:?}", sequence),
            "none",
        )
        .with_confidence(0.0),
    );
    Ok(None)
}

/// Describe the pattern found in a numeric sequence.
///
/// Uses the same hypothesis family as [`predict_next_in_sequence`] but with
/// a higher base confidence for arithmetic/geometric description.
///
/// # Errors
/// [`ValidationError`] under the same conditions as prediction.
pub fn find_pattern_description(
    sequence: &[f64],
    chain: Option<&mut ReasoningChain>,
) -> ReasoningResult<String> {
    find_pattern_description_with(sequence, chain, &Tolerances::default())
}

/// [`find_pattern_description`] with explicit closeness tolerances.
pub fn find_pattern_description_with(
    sequence: &[f64],
    chain: Option<&mut ReasoningChain>,
    tolerances: &Tolerances,
) -> ReasoningResult<String> {
    validate_sequence(sequence, "sequence")?;

    if sequence.len() < 2 {
        let result = "Sequence too short to determine a pattern.".to_string();
        note_step(
            chain,
            StepRecord::new(
                DESCRIPTION_STAGE,
                format!("Attempting to describe pattern in sequence {:?}", sequence),
                result.clone(),
            )
            .with_confidence(0.0),
        );
        return Ok(result);
    }

    if let Some(m) = check_arithmetic(sequence, tolerances, BASE_CONFIDENCE_PATTERN_DESCRIPTION) {
        let result = format!(
            "Arithmetic progression with common difference: {}",
            m.parameter
        );
        note_step(
            chain,
            StepRecord::new(
                DESCRIPTION_STAGE,
                format!("Attempting to describe pattern in sequence {:?}", sequence),
                result.clone(),
            )
            .with_confidence(m.confidence)
            .with_evidence(format!(
                "Common difference {} found in {:?}.",
                m.parameter, m.residuals
            )),
        );
        return Ok(result);
    }

    if let Some(m) = check_geometric(sequence, tolerances, BASE_CONFIDENCE_PATTERN_DESCRIPTION) {
        let result = format!("Geometric progression with common ratio: {}", m.parameter);
        note_step(
            chain,
            StepRecord::new(
                DESCRIPTION_STAGE,
                format!("Attempting to describe pattern in sequence {:?}", sequence),
                result.clone(),
            )
            .with_confidence(m.confidence)
            .with_evidence(format!(
                "Common ratio {} found in {:?}.",
                m.parameter, m.residuals
            )),
        );
        return Ok(result);
    }

    if let Some(p) = recursive_match(sequence) {
        let result = format!("{} recurrence: {}", p.kind.label(), p.rule);
        note_step(
            chain,
            StepRecord::new(
                DESCRIPTION_STAGE,
                format!("Attempting to describe pattern in sequence {:?}", sequence),
                result.clone(),
            )
            .with_confidence(p.confidence)
            .with_evidence(format!("Seeds {:?} reproduce the sequence.", p.seed_values)),
        );
        return Ok(result);
    }

    if let Some(p) = polynomial_match(sequence, MAX_POLYNOMIAL_DEGREE) {
        let result = p.description.clone();
        note_step(
            chain,
            StepRecord::new(
                DESCRIPTION_STAGE,
                format!("Attempting to describe pattern in sequence {:?}", sequence),
                result.clone(),
            )
            .with_confidence(p.confidence),
        );
        return Ok(result);
    }

    if let Some(p) = exponential_match(sequence) {
        let result = p.description.clone();
        note_step(
            chain,
            StepRecord::new(
                DESCRIPTION_STAGE,
                format!("Attempting to describe pattern in sequence {:?}", sequence),
                result.clone(),
            )
            .with_confidence(p.confidence),
        );
        return Ok(result);
    }

    let result = "No discernible pattern found.".to_string();
    note_step(
        chain,
        StepRecord::new(
            DESCRIPTION_STAGE,
            format!("Attempting to describe pattern in sequence {:?}", sequence),
            result.clone(),
        )
        .with_confidence(0.0),
    );
    Ok(result)
}

/// Detect an additive recursive pattern (Fibonacci, Lucas, Tribonacci).
///
/// Requires at least 5 terms (6 for the three-term recurrence); shorter
/// sequences yield `Ok(None)` rather than an error.
///
/// # Errors
/// [`ValidationError`] under the same conditions as prediction.
pub fn detect_recursive_pattern(
    sequence: &[f64],
    chain: Option<&mut ReasoningChain>,
) -> ReasoningResult<Option<RecursivePattern>> {
    validate_sequence(sequence, "sequence")?;

    match recursive_match(sequence) {
        Some(pattern) => {
            debug!(
                kind = %pattern.kind,
                next_term = pattern.next_term,
                confidence = pattern.confidence,
                "Recursive pattern detected"
            );
            note_step(
                chain,
                StepRecord::new(
                    RECURSIVE_STAGE,
                    format!("Detected {} recurrence: {}", pattern.kind.label(), pattern.rule),
                    format!("{}", pattern.next_term),
                )
                .with_confidence(pattern.confidence)
                .with_evidence(format!(
                    "Pattern rule: {}. Next term: {}",
                    pattern.rule, pattern.next_term
                ))
                .with_assumption(format!(
                    "Sequence follows the {} recurrence relation",
                    pattern.kind.label().to_lowercase()
                )),
            );
            Ok(Some(pattern))
        }
        None => {
            note_step(
                chain,
                StepRecord::new(
                    RECURSIVE_STAGE,
                    format!("No recursive pattern found in sequence {:?}", sequence),
                    "none",
                )
                .with_confidence(0.0),
            );
            Ok(None)
        }
    }
}

/// Detect a polynomial pattern through constant finite differences.
///
/// # Errors
/// [`ValidationError`] under the same conditions as prediction.
pub fn detect_polynomial_pattern(
    sequence: &[f64],
    max_degree: usize,
) -> ReasoningResult<Option<PolynomialPattern>> {
    validate_sequence(sequence, "sequence")?;
    Ok(polynomial_match(sequence, max_degree))
}

/// Detect an exponential pattern `a * b^n` through a log-linear fit.
///
/// Only defined for all-positive sequences of at least 4 terms; anything
/// else yields `Ok(None)`.
///
/// # Errors
/// [`ValidationError`] under the same conditions as prediction.
pub fn detect_exponential_pattern(
    sequence: &[f64],
) -> ReasoningResult<Option<ExponentialPattern>> {
    validate_sequence(sequence, "sequence")?;
    Ok(exponential_match(sequence))
}

// ============================================================================
// Validation
// ============================================================================

/// Validate a numeric sequence for pattern analysis.
fn validate_sequence(sequence: &[f64], field: &str) -> Result<(), ValidationError> {
    let limits = LimitsConfig::default();

    if sequence.is_empty() {
        return Err(ValidationError::new(field, "cannot be empty"));
    }

    if sequence.len() > limits.max_sequence_length {
        log_security_event(
            SecurityEventType::OversizedInput,
            SecuritySeverity::High,
            "inductive.validate_sequence",
            &format!("sequence of {} elements rejected", sequence.len()),
        );
        return Err(ValidationError::new(
            field,
            format!(
                "too large ({} elements, maximum {})",
                sequence.len(),
                limits.max_sequence_length
            ),
        ));
    }

    for (position, value) in sequence.iter().enumerate() {
        if !value.is_finite() {
            return Err(ValidationError::new(
                field,
                format!("non-finite value at position {}", position),
            ));
        }
        if value.abs() > limits.value_magnitude_limit {
            log_security_event(
                SecurityEventType::OversizedInput,
                SecuritySeverity::Medium,
                "inductive.validate_sequence",
                &format!("value magnitude over limit at position {}", position),
            );
            return Err(ValidationError::new(
                field,
                format!(
                    "value magnitude too large at position {} (maximum {:e})",
                    position, limits.value_magnitude_limit
                ),
            ));
        }
    }

    Ok(())
}

// ============================================================================
// Progression checks
// ============================================================================

/// A matched arithmetic or geometric progression.
struct ProgressionMatch {
    /// Common difference or ratio.
    parameter: f64,
    /// Predicted next value.
    prediction: f64,
    /// Scaled confidence.
    confidence: f64,
    /// The differences or ratios the match was verified against.
    residuals: Vec<f64>,
}

fn check_arithmetic(
    sequence: &[f64],
    tolerances: &Tolerances,
    base_confidence: f64,
) -> Option<ProgressionMatch> {
    let diffs = consecutive_differences(sequence);
    let mean = close_to_mean(&diffs, tolerances)?;

    let confidence = scaled_confidence(
        base_confidence,
        data_sufficiency(sequence.len(), DATA_SUFFICIENCY_MINIMUM_ARITHMETIC),
        pattern_quality(&diffs),
        COMPLEXITY_SCORE_ARITHMETIC,
    );

    Some(ProgressionMatch {
        parameter: mean,
        prediction: sequence[sequence.len() - 1] + mean,
        confidence,
        residuals: diffs,
    })
}

fn check_geometric(
    sequence: &[f64],
    tolerances: &Tolerances,
    base_confidence: f64,
) -> Option<ProgressionMatch> {
    // Division is undefined on any zero element; the check is skipped, not
    // attempted with a fallback.
    if sequence.iter().any(|v| *v == 0.0) {
        return None;
    }

    let ratios: Vec<f64> = sequence
        .windows(2)
        .map(|w| (w[1] / w[0]).clamp(-RATIO_CLAMP_LIMIT, RATIO_CLAMP_LIMIT))
        .collect();
    let mean = close_to_mean(&ratios, tolerances)?;

    let confidence = scaled_confidence(
        base_confidence,
        data_sufficiency(sequence.len(), DATA_SUFFICIENCY_MINIMUM_GEOMETRIC),
        pattern_quality(&ratios),
        COMPLEXITY_SCORE_GEOMETRIC,
    );

    Some(ProgressionMatch {
        parameter: mean,
        prediction: sequence[sequence.len() - 1] * mean,
        confidence,
        residuals: ratios,
    })
}

// ============================================================================
// Recursive patterns
// ============================================================================

fn recursive_match(sequence: &[f64]) -> Option<RecursivePattern> {
    if let Some((match_score, next_term)) = check_additive_recurrence(sequence, 2) {
        let seeds = sequence[..2].to_vec();
        let (kind, base) = classify_two_term(&seeds);
        return Some(RecursivePattern {
            kind,
            rule: kind.rule().to_string(),
            next_term,
            confidence: scaled_confidence(
                base,
                data_sufficiency(sequence.len(), DATA_SUFFICIENCY_MINIMUM_RECURSIVE),
                match_score,
                COMPLEXITY_SCORE_RECURSIVE,
            ),
            seed_values: seeds,
        });
    }

    if let Some((match_score, next_term)) = check_additive_recurrence(sequence, 3) {
        return Some(RecursivePattern {
            kind: RecursiveKind::Tribonacci,
            rule: RecursiveKind::Tribonacci.rule().to_string(),
            next_term,
            confidence: scaled_confidence(
                BASE_CONFIDENCE_TRIBONACCI,
                data_sufficiency(sequence.len(), DATA_SUFFICIENCY_MINIMUM_RECURSIVE + 1.0),
                match_score,
                COMPLEXITY_SCORE_RECURSIVE,
            ),
            seed_values: sequence[..3].to_vec(),
        });
    }

    None
}

/// Classify a two-term additive recurrence by its seeds.
fn classify_two_term(seeds: &[f64]) -> (RecursiveKind, f64) {
    let approx = |a: f64, b: f64| (a - b).abs() <= RECURSIVE_MATCH_TOLERANCE;
    if approx(seeds[0], 1.0) && approx(seeds[1], 1.0) {
        (RecursiveKind::Fibonacci, BASE_CONFIDENCE_RECURSIVE)
    } else if approx(seeds[0], 2.0) && approx(seeds[1], 1.0) {
        (RecursiveKind::Lucas, BASE_CONFIDENCE_LUCAS_CLASSIC)
    } else {
        (RecursiveKind::LucasVariant, BASE_CONFIDENCE_RECURSIVE)
    }
}

/// Verify an order-`order` additive recurrence against the sequence.
///
/// Returns the match-quality score and the predicted next term. The
/// reconstruction guards each addition against magnitude overflow; a
/// sequence that would overflow simply fails the check.
fn check_additive_recurrence(sequence: &[f64], order: usize) -> Option<(f64, f64)> {
    if sequence.len() < order + 3 {
        return None;
    }

    let limit = LimitsConfig::default().value_magnitude_limit;
    let mut calculated = sequence[..order].to_vec();
    for i in order..sequence.len() {
        if calculated[i - order..i].iter().any(|v| v.abs() > limit) {
            return None;
        }
        let next: f64 = calculated[i - order..i].iter().sum();
        calculated.push(next);
    }

    let matches = sequence
        .iter()
        .zip(&calculated)
        .all(|(a, c)| (a - c).abs() <= RECURSIVE_MATCH_TOLERANCE);
    if !matches {
        return None;
    }

    let mean_abs_error = sequence
        .iter()
        .zip(&calculated)
        .map(|(a, c)| (a - c).abs())
        .sum::<f64>()
        / sequence.len() as f64;
    let mean_abs = sequence.iter().map(|v| v.abs()).sum::<f64>() / sequence.len() as f64;
    let match_score =
        (1.0 - mean_abs_error / (mean_abs + NUMERICAL_STABILITY_THRESHOLD)).clamp(0.0, 1.0);

    let next_term = calculated[calculated.len() - order..].iter().sum();
    Some((match_score, next_term))
}

// ============================================================================
// Polynomial patterns
// ============================================================================

fn polynomial_match(sequence: &[f64], max_degree: usize) -> Option<PolynomialPattern> {
    let constancy = Tolerances::new(1e-9, POLYNOMIAL_LEVEL_TOLERANCE);

    for degree in 1..=max_degree {
        if sequence.len() < degree + DATA_SUFFICIENCY_POLYNOMIAL_EXTRA {
            break;
        }

        let mut levels: Vec<Vec<f64>> = vec![sequence.to_vec()];
        for _ in 0..degree {
            let next = consecutive_differences(levels.last().expect("levels is non-empty"));
            levels.push(next);
        }

        let top = levels.last().expect("levels is non-empty");
        if top.len() < 2 {
            continue;
        }
        let mean = match close_to_mean(top, &constancy) {
            Some(mean) => mean,
            None => continue,
        };

        // Rebuild the next value by folding the difference table back up.
        let mut next_term = mean;
        for level in levels[..levels.len() - 1].iter().rev() {
            next_term += level.last().expect("difference levels are non-empty");
        }

        let label = match degree {
            1 => "Linear".to_string(),
            2 => "Quadratic".to_string(),
            3 => "Cubic".to_string(),
            d => format!("Degree-{} polynomial", d),
        };

        let confidence = scaled_confidence(
            BASE_CONFIDENCE_POLYNOMIAL,
            data_sufficiency(
                sequence.len(),
                (degree + DATA_SUFFICIENCY_POLYNOMIAL_EXTRA) as f64,
            ),
            pattern_quality(top),
            COMPLEXITY_POLYNOMIAL_DEGREE_FACTOR * degree as f64,
        );

        return Some(PolynomialPattern {
            degree,
            level_difference: mean,
            description: format!(
                "{} pattern with constant order-{} difference: {}",
                label, degree, mean
            ),
            next_term,
            confidence,
        });
    }

    None
}

// ============================================================================
// Exponential patterns
// ============================================================================

fn exponential_match(sequence: &[f64]) -> Option<ExponentialPattern> {
    if sequence.len() < 4 {
        return None;
    }
    // The log-linear transform is only defined for strictly positive values.
    if sequence.iter().any(|v| *v <= 0.0) {
        return None;
    }

    let n = sequence.len() as f64;
    let log_values: Vec<f64> = sequence.iter().map(|v| v.ln()).collect();

    let mean_x = (sequence.len() - 1) as f64 / 2.0;
    let mean_y = log_values.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (i, y) in log_values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        covariance += dx * (y - mean_y);
        variance += dx * dx;
    }
    let slope = covariance / variance;
    let intercept = mean_y - slope * mean_x;

    let rtol = EXPONENTIAL_RELATIVE_TOLERANCE;
    let predicted: Vec<f64> = (0..sequence.len())
        .map(|i| (intercept + slope * i as f64).exp())
        .collect();
    let close = sequence
        .iter()
        .zip(&predicted)
        .all(|(a, p)| (a - p).abs() <= ABSOLUTE_TOLERANCE_DEFAULT + rtol * a.abs());
    if !close {
        return None;
    }

    let relative_error = sequence
        .iter()
        .zip(&predicted)
        .map(|(a, p)| (a - p).abs() / a)
        .sum::<f64>()
        / n;
    let match_score = (1.0 - relative_error / rtol).clamp(0.0, 1.0);

    let coefficient = intercept.exp();
    let base = slope.exp();
    let next_term = (intercept + slope * n).exp();

    Some(ExponentialPattern {
        base,
        coefficient,
        description: format!("Exponential pattern: {:.3} * {:.3}^n", coefficient, base),
        next_term,
        confidence: clamp_confidence(match_score * EXPONENTIAL_CONFIDENCE_CAP),
        match_score,
    })
}

// ============================================================================
// Shared numeric helpers
// ============================================================================

fn consecutive_differences(sequence: &[f64]) -> Vec<f64> {
    sequence.windows(2).map(|w| w[1] - w[0]).collect()
}

/// If every value is close to the values' mean, return that mean.
fn close_to_mean(values: &[f64], tolerances: &Tolerances) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let close = values
        .iter()
        .all(|v| (v - mean).abs() <= tolerances.atol + tolerances.rtol * mean.abs());
    close.then_some(mean)
}

/// Saturating data-sufficiency factor: length over the required minimum.
fn data_sufficiency(sequence_length: usize, minimum_required: f64) -> f64 {
    (sequence_length as f64 / minimum_required).min(1.0)
}

/// Pattern-quality factor from the variance of the residuals.
///
/// A perfectly uniform residual set scores 1.0; noise degrades the score
/// through exponential decay of the coefficient of variation, floored at a
/// small positive minimum so a detected pattern never scores zero.
fn pattern_quality(residuals: &[f64]) -> f64 {
    if residuals.len() <= 1 {
        return PATTERN_QUALITY_MINIMAL_DATA;
    }

    let mean_abs = residuals.iter().map(|v| v.abs()).sum::<f64>() / residuals.len() as f64;
    if mean_abs < NUMERICAL_STABILITY_THRESHOLD {
        return 1.0;
    }

    let mean = residuals.iter().sum::<f64>() / residuals.len() as f64;
    let variance =
        residuals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / residuals.len() as f64;
    let coefficient_of_variation =
        variance.sqrt() / (mean_abs + NUMERICAL_STABILITY_THRESHOLD);

    (-COEFFICIENT_OF_VARIATION_DECAY * coefficient_of_variation)
        .exp()
        .max(PATTERN_QUALITY_FLOOR)
}

/// Combine the confidence factors and clamp the result into [0, 1].
fn scaled_confidence(
    base_confidence: f64,
    sufficiency: f64,
    quality: f64,
    complexity_score: f64,
) -> f64 {
    clamp_confidence(base_confidence * sufficiency * quality / (1.0 + complexity_score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consecutive_differences() {
        assert_eq!(consecutive_differences(&[1.0, 3.0, 6.0]), vec![2.0, 3.0]);
    }

    #[test]
    fn test_close_to_mean_uniform() {
        let mean = close_to_mean(&[2.0, 2.0, 2.0], &Tolerances::default());
        assert_eq!(mean, Some(2.0));
    }

    #[test]
    fn test_close_to_mean_rejects_spread() {
        assert!(close_to_mean(&[4.0, -3.0, 6.0], &Tolerances::default()).is_none());
    }

    #[test]
    fn test_data_sufficiency_saturates() {
        assert!(data_sufficiency(2, 3.0) < 1.0);
        assert_eq!(data_sufficiency(3, 3.0), 1.0);
        assert_eq!(data_sufficiency(50, 3.0), 1.0);
    }

    #[test]
    fn test_pattern_quality_perfect() {
        assert_eq!(pattern_quality(&[2.0, 2.0, 2.0]), 1.0);
    }

    #[test]
    fn test_pattern_quality_zero_residuals() {
        // All-identical sequences produce zero residuals, not a division error.
        assert_eq!(pattern_quality(&[0.0, 0.0]), 1.0);
    }

    #[test]
    fn test_pattern_quality_degrades_with_noise() {
        let clean = pattern_quality(&[2.0, 2.0, 2.0, 2.0]);
        let noisy = pattern_quality(&[2.0, 2.5, 1.5, 2.2]);
        assert!(noisy < clean);
        assert!(noisy >= PATTERN_QUALITY_FLOOR);
    }

    #[test]
    fn test_pattern_quality_minimal_data() {
        assert_eq!(pattern_quality(&[5.0]), PATTERN_QUALITY_MINIMAL_DATA);
    }

    #[test]
    fn test_scaled_confidence_clamped() {
        assert!(scaled_confidence(0.95, 1.0, 1.0, 0.0) <= 1.0);
        assert!(scaled_confidence(0.95, 0.0, 1.0, 0.0) >= 0.0);
    }

    #[test]
    fn test_check_additive_recurrence_fibonacci() {
        let (score, next) =
            check_additive_recurrence(&[1.0, 1.0, 2.0, 3.0, 5.0, 8.0], 2).unwrap();
        assert_eq!(next, 13.0);
        assert!(score > 0.99);
    }

    #[test]
    fn test_check_additive_recurrence_requires_length() {
        assert!(check_additive_recurrence(&[1.0, 1.0, 2.0, 3.0], 2).is_none());
    }

    #[test]
    fn test_classify_two_term_seeds() {
        assert_eq!(
            classify_two_term(&[1.0, 1.0]).0,
            RecursiveKind::Fibonacci
        );
        assert_eq!(classify_two_term(&[2.0, 1.0]).0, RecursiveKind::Lucas);
        assert_eq!(
            classify_two_term(&[3.0, 7.0]).0,
            RecursiveKind::LucasVariant
        );
    }

    #[test]
    fn test_polynomial_match_squares() {
        let pattern = polynomial_match(&[1.0, 4.0, 9.0, 16.0, 25.0], 3).unwrap();
        assert_eq!(pattern.degree, 2);
        assert_eq!(pattern.next_term, 36.0);
        assert!(pattern.description.contains("Quadratic"));
    }

    #[test]
    fn test_polynomial_match_rejects_irregular() {
        assert!(polynomial_match(&[1.0, 5.0, 2.0, 8.0], 3).is_none());
    }

    #[test]
    fn test_exponential_match_requires_positive() {
        assert!(exponential_match(&[1.0, -2.0, 4.0, -8.0]).is_none());
        assert!(exponential_match(&[0.0, 1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_exponential_match_fits_power_sequence() {
        let pattern = exponential_match(&[2.0, 6.0, 18.0, 54.0]).unwrap();
        assert!((pattern.base - 3.0).abs() < 1e-6);
        assert!((pattern.coefficient - 2.0).abs() < 1e-6);
        assert!((pattern.next_term - 162.0).abs() < 1e-6);
        assert!(pattern.confidence <= EXPONENTIAL_CONFIDENCE_CAP);
    }

    #[test]
    fn test_validate_sequence_rejects_empty() {
        let err = validate_sequence(&[], "sequence").unwrap_err();
        assert!(err.to_string().contains("sequence"));
    }

    #[test]
    fn test_validate_sequence_rejects_non_finite() {
        let err = validate_sequence(&[1.0, f64::NAN], "sequence").unwrap_err();
        assert!(err.to_string().contains("position 1"));

        let err = validate_sequence(&[f64::INFINITY], "sequence").unwrap_err();
        assert!(err.to_string().contains("position 0"));
    }

    #[test]
    fn test_validate_sequence_rejects_huge_magnitude() {
        let err = validate_sequence(&[1.0, 1e16], "sequence").unwrap_err();
        assert!(err.to_string().contains("magnitude"));
    }
}
