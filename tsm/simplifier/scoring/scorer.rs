use serde::{Deserialize, Serialize};

use crate::{config::ScoringWeights, scoring::GrammarGrade};

/// Externally computed sub-scores of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubScores {
    /// Meaning preservation against the original sentence.
    pub semantic: f64,
    /// Deletion-only fidelity against the current text.
    pub paraphrase: f64,
    /// Closeness to the target length ratio.
    pub length: f64,
}

/// One rewrite candidate of a round, fully scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResponse {
    /// Raw rewrite (wrapping quotes removed).
    pub text: String,
    /// Rewrite reverted onto the pre-rewrite text.
    pub reverted: String,
    /// Grammar grade of the reverted text.
    pub grade: GrammarGrade,
    /// Numeric grammar score.
    pub grammar_score: f64,
    /// Ranking value.
    pub composite_score: f64,
}

/// Fraction of characters removed going from `current` to `reverted`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn length_reduction(current: &str, reverted: &str) -> f64 {
    let before = current.chars().count();
    if before == 0 {
        return 0.0;
    }
    1.0 - reverted.chars().count() as f64 / before as f64
}

/// Blends the conservative and aggressive scoring regimes by aggressiveness.
///
/// At or below `weights.blend_floor` only the gentle formula (conservative
/// weights with `gentle_grammar` as grammar weight) is used.
#[must_use]
pub fn composite_score(
    grade: GrammarGrade,
    sub: &SubScores,
    aggressiveness: f64,
    length_reduction: f64,
    weights: &ScoringWeights,
) -> f64 {
    let grammar = grade.score();
    let penalty = grade.penalty(weights);
    if aggressiveness <= weights.blend_floor {
        return sub.semantic
            + grammar * weights.gentle_grammar
            + sub.paraphrase
            + sub.length
            + penalty;
    }
    let length_bonus = length_reduction * weights.length_bonus * aggressiveness;
    let conservative = sub.semantic * weights.conservative_semantic
        + grammar * weights.conservative_grammar
        + sub.paraphrase * weights.conservative_paraphrase
        + sub.length * weights.conservative_length
        + penalty;
    let aggressive = sub.semantic * weights.aggressive_semantic
        + grammar * weights.aggressive_grammar
        + sub.paraphrase * weights.aggressive_paraphrase
        + sub.length * weights.aggressive_length
        + length_bonus
        + penalty;
    conservative * (1.0 - aggressiveness) + aggressive * aggressiveness
}
