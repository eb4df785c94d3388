use serde::{Deserialize, Serialize};

use crate::{
    config::{ScheduleConfig, SimplifierConfig},
    oracle::PromptVariant,
};

/// Whitespace-separated word count.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Clamped cubic smoothstep of the word count between the schedule bounds.
///
/// Continuous and monotone with zero slope at both bounds, so neighbouring
/// sentence lengths never produce a jump in behaviour.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn smooth_aggressiveness(words: usize, schedule: &ScheduleConfig) -> f64 {
    let linear = if words <= schedule.min_words {
        0.0
    } else if words >= schedule.max_words {
        1.0
    } else {
        (words - schedule.min_words) as f64 / (schedule.max_words - schedule.min_words) as f64
    };
    linear * linear * 2.0f64.mul_add(-linear, 3.0)
}

/// Generation parameters fixed for a sentence's whole depth chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggressivenessProfile {
    /// Smoothstep aggressiveness in `[0, 1]`.
    pub aggressiveness: f64,
    /// Sampling temperature.
    pub temperature: f64,
    /// Candidates per round.
    pub candidate_count: usize,
    /// Fraction of the text the length score aims to keep.
    pub target_length_ratio: f64,
    /// Whether the aggressive deletion prompt is used.
    pub use_aggressive_prompt: bool,
}

impl AggressivenessProfile {
    /// Profile for a sentence, derived from its word count.
    #[must_use]
    pub fn for_sentence(sentence: &str, config: &SimplifierConfig) -> Self {
        Self::from_word_count(word_count(sentence), config)
    }

    /// Profile for a given word count.
    #[must_use]
    pub fn from_word_count(words: usize, config: &SimplifierConfig) -> Self {
        let schedule = &config.schedule;
        let aggressiveness = smooth_aggressiveness(words, schedule);
        let span = schedule.base_length_ratio - schedule.min_length_ratio;
        Self {
            aggressiveness,
            temperature: config.temperature,
            candidate_count: config.candidate_count,
            target_length_ratio: span.mul_add(-aggressiveness, schedule.base_length_ratio),
            use_aggressive_prompt: aggressiveness > schedule.aggressive_prompt_threshold,
        }
    }

    /// Shortening prompt for this profile.
    #[must_use]
    pub const fn prompt_variant(&self) -> PromptVariant {
        PromptVariant::shortener(self.use_aggressive_prompt)
    }
}
