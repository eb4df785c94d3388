use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::OracleError,
    oracle::{Credentials, GenerationOracle, GenerationRequest, GrammarClassifier, PromptVariant},
    scoring::GrammarGrade,
};

/// Asks the generation oracle for a single-letter grammar grade.
#[derive(Clone)]
pub struct OracleGrammarClassifier {
    oracle: Arc<dyn GenerationOracle>,
    temperature: f64,
}

impl OracleGrammarClassifier {
    /// Grades with `oracle` at the given sampling temperature.
    #[must_use]
    pub fn new(oracle: Arc<dyn GenerationOracle>, temperature: f64) -> Self {
        Self {
            oracle,
            temperature,
        }
    }
}

impl std::fmt::Debug for OracleGrammarClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleGrammarClassifier")
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GrammarClassifier for OracleGrammarClassifier {
    async fn classify(
        &self,
        text: &str,
        credentials: &Credentials,
    ) -> Result<GrammarGrade, OracleError> {
        let replies = self
            .oracle
            .generate(GenerationRequest {
                variant: PromptVariant::GrammarCheck,
                text,
                n: 1,
                temperature: self.temperature,
                credentials,
                system_message: None,
            })
            .await?;
        Ok(replies
            .first()
            .map_or(GrammarGrade::C, |reply| GrammarGrade::parse_reply(reply)))
    }
}
