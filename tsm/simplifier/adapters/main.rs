/// OpenAI-compatible chat-completions oracle.
pub mod chat;
/// Grammar grading through the generation oracle.
pub mod grammar;
/// Word-overlap evaluator and deletion-only reverter.
pub mod lexical;

use std::sync::Arc;

pub use chat::ChatCompletionsOracle;
pub use grammar::OracleGrammarClassifier;
pub use lexical::{normalize_word, DeletionReverter, LexicalEvaluator};

use crate::{config::OracleConfig, error::OracleError, oracle::Collaborators};

/// HTTP oracle, oracle-backed grammar grading and lexical scoring.
pub fn default_collaborators(config: &OracleConfig) -> Result<Collaborators, OracleError> {
    let oracle = Arc::new(ChatCompletionsOracle::new(config.clone())?);
    Ok(Collaborators {
        grammar: Arc::new(OracleGrammarClassifier::new(
            oracle.clone(),
            config.grammar_temperature,
        )),
        oracle,
        reverter: Arc::new(DeletionReverter),
        evaluator: Arc::new(LexicalEvaluator),
    })
}
