use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::{OracleError, SimplifyError},
    scoring::GrammarGrade,
};

/// System message steering rewrites of UK legal judgments.
pub const LEGAL_SYSTEM_MESSAGE: &str = "You are an expert legal assistant. Your goal is to reveal \
the core legal structure. You MUST aggressively delete specific dates, locations, and citations as \
they are considered noise here. However, you must PRESERVE legal terms of art (e.g., 'common \
ground', 'proprietor', 'registered') and the logical flow of the argument. Focus on the main legal \
action.";

const STANDARD_SHORTENER: &str = "For each sentence in the following paragraph from a legal \
document, delete phrases that are not the main subject, verb, or object of the sentence, or key \
modifiers/ terms, while preserving the main meaning of the sentence as much as possible. Be \
aggressive in removing parentheticals, attached clauses, and details about dates/ location. The \
length of the result should be at most 80 percent of the original length (you must delete at least \
20% of the text). Important: Please make sure the result remains grammatical!!";

const AGGRESSIVE_SHORTENER: &str = "For each sentence in the following paragraph from a legal \
document, delete phrases that are not the main subject, verb, or object of the sentence, or key \
modifiers/ terms, while preserving the main meaning of the sentence as much as possible. Be more \
aggressive in removing parentheticals, attached clauses, and details about dates/ location. The \
length of the result should be at most 70 percent of the original length (you must delete at least \
30% of the text). Important: Please make sure the result remains grammatical!!";

const DELETION_ONLY: &str = "Please do not add any new words or change words, only delete words.";

const GRAMMAR_CHECK: &str = "Score the following paragraph from a legal document by how \
grammatical it is. Be strict in your evaluation - only mark as A if the text is fully \
grammatically correct with proper sentence structure, subject-verb agreement, and correct word \
order.";

const GRAMMAR_ANSWER: &str = "Answer A for grammatically correct, B for moderately grammatical \
(minor issues), and C for bad grammar (major grammatical errors). Only respond with one letter.";

/// API key handed to the oracle. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    /// Trims the key and rejects blank input.
    pub fn new(api_key: impl AsRef<str>) -> Result<Self, SimplifyError> {
        let key = api_key.as_ref().trim();
        if key.is_empty() {
            return Err(SimplifyError::MissingCredentials);
        }
        Ok(Self(key.to_string()))
    }

    /// The raw key.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(***)")
    }
}

/// Instruction sent to the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptVariant {
    /// Delete at least 20% of the text.
    Standard,
    /// Delete at least 30% of the text.
    Aggressive,
    /// Grade grammaticality with a single letter.
    GrammarCheck,
}

impl PromptVariant {
    /// Shortening variant for a profile.
    #[must_use]
    pub const fn shortener(aggressive: bool) -> Self {
        if aggressive {
            Self::Aggressive
        } else {
            Self::Standard
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Aggressive => "aggressive",
            Self::GrammarCheck => "grammar_check",
        }
    }

    /// Full prompt with `text` embedded in double quotes.
    #[must_use]
    pub fn render(self, text: &str) -> String {
        let (head, tail) = match self {
            Self::Standard => (STANDARD_SHORTENER, DELETION_ONLY),
            Self::Aggressive => (AGGRESSIVE_SHORTENER, DELETION_ONLY),
            Self::GrammarCheck => (GRAMMAR_CHECK, GRAMMAR_ANSWER),
        };
        format!("{head}\n\"{text}\"\n\n{tail}")
    }
}

/// One call to the generation oracle.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Which instruction to send.
    pub variant: PromptVariant,
    /// Text being rewritten or graded.
    pub text: &'a str,
    /// Number of completions wanted.
    pub n: usize,
    /// Sampling temperature.
    pub temperature: f64,
    /// Caller credentials.
    pub credentials: &'a Credentials,
    /// Optional system message.
    pub system_message: Option<&'a str>,
}

/// Text generation backend (typically an LLM chat endpoint).
#[async_trait]
pub trait GenerationOracle: Send + Sync {
    /// Returns up to `request.n` raw completions. An empty vector means the
    /// oracle had nothing to offer.
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Vec<String>, OracleError>;
}

/// Maps a candidate back onto a form measurable against the pre-rewrite text.
pub trait RewriteReverter: Send + Sync {
    /// Undoes substitutions/insertions the rewrite was not allowed to make.
    fn revert(&self, original: &str, candidate: &str) -> String;
}

/// Bounded sub-scores used by the composite score.
pub trait Evaluator: Send + Sync {
    /// Meaning preservation between two texts.
    fn semantic_score(&self, reference: &str, candidate: &str) -> f64;
    /// How faithfully `candidate` only deletes from `source`.
    fn paraphrase_score(&self, source: &str, candidate: &str) -> f64;
    /// How close the length of `candidate` relative to `source` is to `target_ratio`.
    fn length_score(&self, source: &str, candidate: &str, target_ratio: f64) -> f64;
}

/// Grades grammaticality as A, B or C.
#[async_trait]
pub trait GrammarClassifier: Send + Sync {
    /// Grades `text`.
    async fn classify(&self, text: &str, credentials: &Credentials)
        -> Result<GrammarGrade, OracleError>;
}

/// Shared handles to every external collaborator of the depth iterator.
#[derive(Clone)]
pub struct Collaborators {
    /// Rewrite generator.
    pub oracle: Arc<dyn GenerationOracle>,
    /// Candidate normaliser.
    pub reverter: Arc<dyn RewriteReverter>,
    /// Sub-score functions.
    pub evaluator: Arc<dyn Evaluator>,
    /// Grammar grader.
    pub grammar: Arc<dyn GrammarClassifier>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_are_rejected() {
        assert!(matches!(
            Credentials::new("   "),
            Err(SimplifyError::MissingCredentials)
        ));
        let creds = Credentials::new("  sk-test \n").unwrap();
        assert_eq!(creds.expose(), "sk-test");
        assert_eq!(format!("{creds:?}"), "Credentials(***)");
    }

    #[test]
    fn prompts_embed_quoted_text() {
        let standard = PromptVariant::Standard.render("The court held.");
        assert!(standard.contains("\"The court held.\""));
        assert!(standard.contains("at least 20%"));
        let aggressive = PromptVariant::shortener(true).render("x");
        assert!(aggressive.contains("at least 30%"));
        let grammar = PromptVariant::GrammarCheck.render("x");
        assert!(grammar.ends_with("Only respond with one letter."));
    }
}
