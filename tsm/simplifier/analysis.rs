use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tsm_logging::LogLevel;
use uuid::Uuid;

use crate::{
    cefr::{is_difficult, CefrLevel, DifficultyClassifier},
    error::SimplifyResult,
    importance::{align_ladder, misaligned_levels, STRIPPED_PUNCTUATION},
    oracle::Credentials,
    orchestrator::Simplifier,
    telemetry::SimplifierTelemetry,
};

/// Importance marking a paragraph break.
pub const NEWLINE_IMPORTANCE: i8 = -1;

/// One word of the analysed text, or a paragraph break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportanceToken {
    /// Word as written, or `"\n"`.
    pub text: String,
    /// 0..=4 for words, -1 for paragraph breaks.
    pub importance: i8,
    /// Vocabulary level, when rated.
    pub cefr: Option<CefrLevel>,
    /// Harder than the reader's level.
    pub is_difficult: bool,
}

impl ImportanceToken {
    fn newline() -> Self {
        Self {
            text: "\n".into(),
            importance: NEWLINE_IMPORTANCE,
            cefr: None,
            is_difficult: false,
        }
    }
}

/// Result of [`TextAnalyzer::analyze`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Request id shared by every log record and event of the analysis.
    pub request_id: Uuid,
    /// Ladder of every non-blank paragraph, levels keyed `"0"`..
    pub paragraphs: Vec<IndexMap<String, String>>,
    /// Annotated words of all paragraphs, each paragraph closed by a newline token.
    pub tokens: Vec<ImportanceToken>,
}

/// Simplifies text paragraph by paragraph and annotates every word.
#[derive(Clone)]
pub struct TextAnalyzer {
    simplifier: Simplifier,
    difficulty: Arc<dyn DifficultyClassifier>,
    telemetry: Option<SimplifierTelemetry>,
}

impl std::fmt::Debug for TextAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextAnalyzer")
            .field("simplifier", &self.simplifier)
            .finish_non_exhaustive()
    }
}

impl TextAnalyzer {
    /// Creates an analyzer.
    #[must_use]
    pub fn new(simplifier: Simplifier, difficulty: Arc<dyn DifficultyClassifier>) -> Self {
        Self {
            simplifier,
            difficulty,
            telemetry: None,
        }
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: SimplifierTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Splits `text` on newlines, skips blank paragraphs, simplifies each one
    /// and labels its words with importance, CEFR level and difficulty.
    pub async fn analyze(
        &self,
        text: &str,
        user_level: Option<CefrLevel>,
        api_key: &str,
        system_message: Option<&str>,
    ) -> SimplifyResult<AnalysisReport> {
        let credentials = Credentials::new(api_key)?;
        let request_id = Uuid::new_v4();
        let telemetry = self.telemetry.as_ref().map(|tel| tel.scoped(request_id));

        let mut paragraphs = Vec::new();
        let mut tokens = Vec::new();
        for (index, paragraph) in text.split('\n').filter(|p| !p.trim().is_empty()).enumerate() {
            let ladder = self
                .simplifier
                .ladder_for(paragraph, &credentials, system_message, request_id)
                .await;

            let levels: Vec<&str> = ladder.levels().iter().map(String::as_str).collect();
            let misaligned = misaligned_levels(&levels);
            if !misaligned.is_empty() {
                if let Some(tel) = &telemetry {
                    let _ = tel.log(
                        LogLevel::Warn,
                        "analysis.paragraph.misaligned",
                        json!({ "paragraph": index, "levels": misaligned }),
                    );
                }
            }

            tokens.extend(align_ladder(&ladder).into_iter().map(|word| {
                let cefr = self.difficulty.level(clean_word(&word.text));
                ImportanceToken {
                    importance: i8::try_from(word.importance).unwrap_or(i8::MAX),
                    is_difficult: is_difficult(cefr, user_level),
                    cefr,
                    text: word.text,
                }
            }));
            tokens.push(ImportanceToken::newline());
            paragraphs.push(ladder.as_level_map());
        }

        if let Some(tel) = &telemetry {
            let _ = tel.log(
                LogLevel::Info,
                "analysis.complete",
                json!({ "paragraphs": paragraphs.len(), "tokens": tokens.len() }),
            );
        }
        Ok(AnalysisReport {
            request_id,
            paragraphs,
            tokens,
        })
    }
}

/// Drops one trailing, then one leading, punctuation mark from words longer
/// than one character.
#[must_use]
pub fn clean_word(word: &str) -> &str {
    let is_punct = |c: char| STRIPPED_PUNCTUATION.contains(&c);
    let mut cleaned = word;
    if cleaned.chars().count() > 1 {
        cleaned = cleaned.strip_suffix(is_punct).unwrap_or(cleaned);
    }
    if cleaned.chars().count() > 1 {
        cleaned = cleaned.strip_prefix(is_punct).unwrap_or(cleaned);
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tsm_logging::MemoryLogSink;

    use super::*;
    use crate::{
        cefr::ZipfDifficultyClassifier,
        depth::iterator::tests::{collaborators, ScriptedOracle},
        error::SimplifyError,
    };

    fn analyzer(oracle: Arc<ScriptedOracle>, sink: Arc<MemoryLogSink>) -> TextAnalyzer {
        let telemetry = SimplifierTelemetry::builder("simplifier")
            .sink(sink)
            .build()
            .unwrap();
        let simplifier = Simplifier::builder(collaborators(oracle))
            .telemetry(telemetry.clone())
            .build()
            .unwrap();
        let table = HashMap::from([
            ("the".to_string(), 7.7),
            ("court".to_string(), 5.1),
            ("estoppel".to_string(), 2.4),
        ]);
        TextAnalyzer::new(simplifier, Arc::new(ZipfDifficultyClassifier::from_map(table)))
            .with_telemetry(telemetry)
    }

    #[test]
    fn cleans_one_mark_each_side() {
        assert_eq!(clean_word("court,"), "court");
        assert_eq!(clean_word("(estoppel)"), "estoppel");
        assert_eq!(clean_word("((x))"), "(x)");
        assert_eq!(clean_word("."), ".");
        assert_eq!(clean_word("a."), "a");
    }

    #[tokio::test]
    async fn annotates_words_and_marks_paragraph_breaks() {
        let oracle = Arc::new(ScriptedOracle::new(Vec::new()));
        let sink = Arc::new(MemoryLogSink::new());
        let analyzer = analyzer(oracle, sink.clone());
        let report = analyzer
            .analyze(
                "The court applied estoppel.\n\n   \nThe court,",
                Some(CefrLevel::B2),
                "sk-test",
                None,
            )
            .await
            .unwrap();

        assert_eq!(report.paragraphs.len(), 2);
        let texts: Vec<&str> = report.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["The", "court", "applied", "estoppel.", "\n", "The", "court,", "\n"]
        );
        let newline = &report.tokens[4];
        assert_eq!(newline.importance, -1);
        assert_eq!(newline.cefr, None);
        assert!(report.tokens.iter().filter(|t| t.text != "\n").all(|t| t.importance == 4));

        assert_eq!(report.tokens[0].cefr, Some(CefrLevel::A1));
        assert_eq!(report.tokens[6].cefr, Some(CefrLevel::A2));
        let estoppel = &report.tokens[3];
        assert_eq!(estoppel.cefr, Some(CefrLevel::C2));
        assert!(estoppel.is_difficult);
        assert!(!report.tokens[1].is_difficult);

        let messages = sink.messages();
        assert_eq!(messages.last().map(String::as_str), Some("analysis.complete"));
        assert!(sink
            .records()
            .iter()
            .all(|record| record.request_id == Some(report.request_id)));
    }

    #[tokio::test]
    async fn serializes_tokens_in_camel_case() {
        let oracle = Arc::new(ScriptedOracle::new(Vec::new()));
        let analyzer = analyzer(oracle, Arc::new(MemoryLogSink::new()));
        let report = analyzer
            .analyze("Costs.", None, "sk-test", None)
            .await
            .unwrap();
        let value = serde_json::to_value(&report.tokens).unwrap();
        assert_eq!(value[0]["isDifficult"], false);
        assert_eq!(value[0]["cefr"], "C2");
        assert_eq!(value[1]["text"], "\n");
        assert_eq!(value[1]["importance"], -1);
    }

    #[tokio::test]
    async fn blank_key_is_rejected() {
        let oracle = Arc::new(ScriptedOracle::new(Vec::new()));
        let analyzer = analyzer(oracle.clone(), Arc::new(MemoryLogSink::new()));
        let err = analyzer.analyze("Text.", None, "", None).await.unwrap_err();
        assert!(matches!(err, SimplifyError::MissingCredentials));
        assert_eq!(*oracle.calls.lock(), 0);
    }
}
