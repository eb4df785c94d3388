use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SimplifyError;

/// Top-level settings for one simplifier instance.
///
/// Every analysis receives its own copy; nothing here is process-global.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimplifierConfig {
    /// Maximum number of shortening rounds per sentence.
    pub max_depth: usize,
    /// Sampling temperature for rewrite generation.
    pub temperature: f64,
    /// Rewrite candidates requested per round.
    pub candidate_count: usize,
    /// Sentences processed concurrently.
    pub worker_count: usize,
    /// Minimum number of levels in a ladder (shorter ladders repeat their last level).
    pub ladder_levels: usize,
    /// Aggressiveness schedule.
    pub schedule: ScheduleConfig,
    /// Composite score weights.
    pub scoring: ScoringWeights,
    /// Early-stop thresholds.
    pub stopping: StoppingPolicy,
    /// Chat-completions endpoint settings.
    pub oracle: OracleConfig,
}

impl Default for SimplifierConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            temperature: 0.8,
            candidate_count: 2,
            worker_count: 8,
            ladder_levels: 5,
            schedule: ScheduleConfig::default(),
            scoring: ScoringWeights::default(),
            stopping: StoppingPolicy::default(),
            oracle: OracleConfig::default(),
        }
    }
}

impl SimplifierConfig {
    /// Loads configuration from a TOML file; missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading simplifier config {}", path.display()))?;
        let config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating {}", path.display()))?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), SimplifyError> {
        let invalid = |msg: &str| Err(SimplifyError::Config(msg.to_string()));
        if self.max_depth == 0 {
            return invalid("max_depth must be at least 1");
        }
        if self.candidate_count == 0 {
            return invalid("candidate_count must be at least 1");
        }
        if self.worker_count == 0 {
            return invalid("worker_count must be at least 1");
        }
        if self.ladder_levels == 0 {
            return invalid("ladder_levels must be at least 1");
        }
        if !(self.temperature.is_finite() && self.temperature >= 0.0) {
            return invalid("temperature must be a non-negative number");
        }
        if self.schedule.min_words >= self.schedule.max_words {
            return invalid("schedule.min_words must be below schedule.max_words");
        }
        let ratio_ok = |r: f64| r > 0.0 && r <= 1.0;
        if !ratio_ok(self.schedule.base_length_ratio) || !ratio_ok(self.schedule.min_length_ratio)
        {
            return invalid("schedule length ratios must lie in (0, 1]");
        }
        if self.schedule.min_length_ratio > self.schedule.base_length_ratio {
            return invalid("schedule.min_length_ratio must not exceed base_length_ratio");
        }
        if self.oracle.endpoint.trim().is_empty() || self.oracle.model.trim().is_empty() {
            return invalid("oracle endpoint and model must be set");
        }
        Ok(())
    }
}

/// Word-count bounds and targets of the aggressiveness schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// At or below this many words aggressiveness is 0.
    pub min_words: usize,
    /// At or above this many words aggressiveness is 1.
    pub max_words: usize,
    /// Target remaining length fraction at aggressiveness 0.
    pub base_length_ratio: f64,
    /// Target remaining length fraction at aggressiveness 1.
    pub min_length_ratio: f64,
    /// Aggressiveness above which the aggressive deletion prompt is used.
    pub aggressive_prompt_threshold: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            min_words: 20,
            max_words: 80,
            base_length_ratio: 0.6,
            min_length_ratio: 0.5,
            aggressive_prompt_threshold: 0.5,
        }
    }
}

/// Weights of the two blended scoring regimes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    /// At or below this aggressiveness only the gentle formula applies.
    pub blend_floor: f64,
    /// Grammar weight of the gentle formula.
    pub gentle_grammar: f64,
    /// Conservative regime: semantic weight.
    pub conservative_semantic: f64,
    /// Conservative regime: grammar weight.
    pub conservative_grammar: f64,
    /// Conservative regime: paraphrase weight.
    pub conservative_paraphrase: f64,
    /// Conservative regime: length weight.
    pub conservative_length: f64,
    /// Aggressive regime: semantic weight.
    pub aggressive_semantic: f64,
    /// Aggressive regime: grammar weight.
    pub aggressive_grammar: f64,
    /// Aggressive regime: paraphrase weight.
    pub aggressive_paraphrase: f64,
    /// Aggressive regime: length weight.
    pub aggressive_length: f64,
    /// Scale of the character-reduction bonus (further scaled by aggressiveness).
    pub length_bonus: f64,
    /// Penalty added for grade B.
    pub penalty_b: f64,
    /// Penalty added for grade C.
    pub penalty_c: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            blend_floor: 0.1,
            gentle_grammar: 2.0,
            conservative_semantic: 1.0,
            conservative_grammar: 1.5,
            conservative_paraphrase: 1.0,
            conservative_length: 1.0,
            aggressive_semantic: 0.3,
            aggressive_grammar: 0.6,
            aggressive_paraphrase: 0.15,
            aggressive_length: 0.4,
            length_bonus: 0.3,
            penalty_b: -0.3,
            penalty_c: -2.0,
        }
    }
}

/// Thresholds deciding when a sentence stops shortening.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoppingPolicy {
    /// Aggressiveness above which the reduction-ratio branch applies.
    pub high_aggressiveness: f64,
    /// Minimum word reduction ratio at aggressiveness 0.
    pub min_ratio_base: f64,
    /// Added to the minimum ratio per unit of aggressiveness.
    pub min_ratio_slope: f64,
    /// Minimum removed words at aggressiveness 0.
    pub min_words_base: f64,
    /// Added to the minimum removed words per unit of aggressiveness.
    pub min_words_slope: f64,
}

impl Default for StoppingPolicy {
    fn default() -> Self {
        Self {
            high_aggressiveness: 0.3,
            min_ratio_base: 0.01,
            min_ratio_slope: 0.01,
            min_words_base: 3.0,
            min_words_slope: 2.0,
        }
    }
}

/// Chat-completions endpoint used by the HTTP oracle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OracleConfig {
    /// Full URL of the chat-completions endpoint.
    pub endpoint: String,
    /// Model name sent with every request.
    pub model: String,
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Temperature for grammar grading requests.
    pub grammar_temperature: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".into(),
            model: "gpt-3.5-turbo".into(),
            timeout_ms: 60_000,
            grammar_temperature: 0.0,
        }
    }
}
