use serde::Serialize;

use crate::{
    config::StoppingPolicy,
    schedule::{word_count, AggressivenessProfile},
    scoring::{CandidateResponse, RoundSelection},
};

/// Why a depth chain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The configured number of rounds was used up.
    MaxDepth,
    /// The round produced no candidates.
    Exhausted,
    /// The oracle call failed.
    OracleFailed,
    /// Word count did not change (low aggressiveness).
    NoProgress,
    /// Too few words removed (high aggressiveness).
    InsufficientReduction,
    /// Nothing to shorten.
    EmptySentence,
}

impl StopReason {
    /// Short label for logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MaxDepth => "max_depth",
            Self::Exhausted => "exhausted",
            Self::OracleFailed => "oracle_failed",
            Self::NoProgress => "no_progress",
            Self::InsufficientReduction => "insufficient_reduction",
            Self::EmptySentence => "empty_sentence",
        }
    }
}

/// Outcome of the stop check for one round.
#[derive(Debug, Clone, PartialEq)]
pub enum StopDecision {
    /// Accept this candidate and keep going.
    Continue(CandidateResponse),
    /// End the chain without appending this round's winner.
    Stop(StopReason),
}

/// Applies the stopping policy to a round.
///
/// `round` counts completed rounds including this one, so the first round
/// is 1 and can never stop the chain.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn evaluate(
    current: &str,
    selection: RoundSelection,
    profile: &AggressivenessProfile,
    round: usize,
    policy: &StoppingPolicy,
) -> StopDecision {
    let a = profile.aggressiveness;
    let previous = word_count(current);
    let shortened = word_count(&selection.winner().reverted);

    if a <= policy.high_aggressiveness {
        if previous == shortened && round > 1 {
            return StopDecision::Stop(StopReason::NoProgress);
        }
        return StopDecision::Continue(selection.into_winner());
    }

    let removed = previous as f64 - shortened as f64;
    let ratio = if previous == 0 {
        0.0
    } else {
        removed / previous as f64
    };
    let min_ratio = policy.min_ratio_slope.mul_add(a, policy.min_ratio_base);
    let min_words = policy.min_words_slope.mul_add(a, policy.min_words_base).floor();

    let mut selection = selection;
    if ratio < min_ratio && removed < min_words {
        let winner_chars = selection.winner().reverted.chars().count();
        let salvage = selection
            .runner_up()
            .is_some_and(|next| next.reverted.chars().count() < winner_chars);
        if salvage {
            selection.promote_runner_up();
        }
    }

    if ratio < min_ratio / 2.0 && removed < min_words - 1.0 && round > 1 {
        return StopDecision::Stop(StopReason::InsufficientReduction);
    }
    StopDecision::Continue(selection.into_winner())
}
