use std::sync::Arc;

use serde_json::json;
use tsm_logging::LogLevel;

use crate::{
    config::SimplifierConfig,
    depth::stopping::{evaluate, StopDecision, StopReason},
    ladder::DepthChain,
    oracle::{Collaborators, Credentials, GenerationRequest},
    schedule::AggressivenessProfile,
    scoring::{composite_score, length_reduction, select, CandidateResponse, GrammarGrade, SubScores},
    scratch::{ScratchStats, SentenceScratch},
    telemetry::SimplifierTelemetry,
};

/// Per-call inputs of a depth run.
#[derive(Debug, Clone, Copy)]
pub struct SentenceContext<'a> {
    /// Position of the sentence in its paragraph.
    pub index: usize,
    /// Caller credentials forwarded to the oracle.
    pub credentials: &'a Credentials,
    /// Optional system message for rewrite requests.
    pub system_message: Option<&'a str>,
}

/// Result of shortening one sentence.
#[derive(Debug, Clone)]
pub struct DepthOutcome {
    /// Accepted rewrites, original first.
    pub chain: DepthChain,
    /// Why the loop ended.
    pub reason: StopReason,
    /// Scratch counters.
    pub stats: ScratchStats,
}

/// Repeatedly shortens one sentence until a stop condition holds.
#[derive(Debug, Clone)]
pub struct DepthIterator {
    config: Arc<SimplifierConfig>,
    collaborators: Collaborators,
    telemetry: Option<SimplifierTelemetry>,
}

impl DepthIterator {
    /// Creates an iterator over shared collaborators.
    #[must_use]
    pub fn new(
        config: Arc<SimplifierConfig>,
        collaborators: Collaborators,
        telemetry: Option<SimplifierTelemetry>,
    ) -> Self {
        Self {
            config,
            collaborators,
            telemetry,
        }
    }

    /// Builds the depth chain of `sentence`.
    ///
    /// Never fails: oracle errors and empty rounds end the chain early and
    /// whatever was accepted so far is returned.
    pub async fn run(&self, sentence: &str, ctx: &SentenceContext<'_>) -> DepthOutcome {
        let original = sentence.trim();
        let mut scratch = SentenceScratch::new(ctx.index);
        let mut chain = DepthChain::new(original);
        if original.is_empty() {
            return DepthOutcome {
                chain,
                reason: StopReason::EmptySentence,
                stats: scratch.release(),
            };
        }

        let profile = AggressivenessProfile::for_sentence(original, &self.config);
        let mut current = original.to_string();
        let mut round = 0;
        let reason = loop {
            if round >= self.config.max_depth {
                break StopReason::MaxDepth;
            }
            let request = GenerationRequest {
                variant: profile.prompt_variant(),
                text: &current,
                n: profile.candidate_count,
                temperature: profile.temperature,
                credentials: ctx.credentials,
                system_message: ctx.system_message,
            };
            let responses = match self.collaborators.oracle.generate(request).await {
                Ok(responses) => responses,
                Err(err) => {
                    self.log(
                        LogLevel::Warn,
                        "simplify.sentence.oracle_failed",
                        json!({ "sentence": ctx.index, "round": round, "error": err.to_string() }),
                    );
                    break StopReason::OracleFailed;
                }
            };
            scratch.record_generation(responses.len());

            let mut candidates = Vec::with_capacity(responses.len());
            for response in responses {
                let text = strip_wrapping_quotes(&response).to_string();
                let reverted = self.collaborators.reverter.revert(&current, &text);
                if reverted.trim().is_empty() {
                    self.log(
                        LogLevel::Debug,
                        "simplify.sentence.candidate_discarded",
                        json!({ "sentence": ctx.index, "round": round, "candidate": text }),
                    );
                    continue;
                }
                candidates.push(
                    self.score(original, &current, text, reverted, &profile, ctx, &mut scratch)
                        .await,
                );
            }

            let Some(selection) = select(candidates) else {
                self.log(
                    LogLevel::Warn,
                    "simplify.sentence.stopped",
                    json!({ "sentence": ctx.index, "round": round, "reason": StopReason::Exhausted.label() }),
                );
                break StopReason::Exhausted;
            };
            round += 1;

            match evaluate(&current, selection, &profile, round, &self.config.stopping) {
                StopDecision::Stop(reason) => {
                    self.log(
                        LogLevel::Info,
                        "simplify.sentence.stopped",
                        json!({ "sentence": ctx.index, "round": round, "reason": reason.label() }),
                    );
                    break reason;
                }
                StopDecision::Continue(winner) => {
                    self.log(
                        LogLevel::Debug,
                        "simplify.sentence.round",
                        json!({
                            "sentence": ctx.index,
                            "round": round,
                            "grade": winner.grade.letter().to_string(),
                            "score": winner.composite_score,
                            "aggressiveness": profile.aggressiveness,
                        }),
                    );
                    current.clone_from(&winner.reverted);
                    chain.push(winner.reverted);
                }
            }
        };

        DepthOutcome {
            chain,
            reason,
            stats: scratch.release(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn score(
        &self,
        original: &str,
        current: &str,
        text: String,
        reverted: String,
        profile: &AggressivenessProfile,
        ctx: &SentenceContext<'_>,
        scratch: &mut SentenceScratch,
    ) -> CandidateResponse {
        let grade = self.grade(&reverted, ctx, scratch).await;
        let evaluator = &self.collaborators.evaluator;
        let sub = SubScores {
            semantic: evaluator.semantic_score(original, &reverted),
            paraphrase: evaluator.paraphrase_score(current, &text),
            length: evaluator.length_score(current, &reverted, profile.target_length_ratio),
        };
        let composite = composite_score(
            grade,
            &sub,
            profile.aggressiveness,
            length_reduction(current, &reverted),
            &self.config.scoring,
        );
        CandidateResponse {
            text,
            reverted,
            grade,
            grammar_score: grade.score(),
            composite_score: composite,
        }
    }

    async fn grade(
        &self,
        text: &str,
        ctx: &SentenceContext<'_>,
        scratch: &mut SentenceScratch,
    ) -> GrammarGrade {
        if let Some(grade) = scratch.cached_grade(text) {
            return grade;
        }
        let grade = match self.collaborators.grammar.classify(text, ctx.credentials).await {
            Ok(grade) => grade,
            Err(err) => {
                self.log(
                    LogLevel::Warn,
                    "simplify.sentence.grammar_failed",
                    json!({ "sentence": ctx.index, "error": err.to_string() }),
                );
                GrammarGrade::C
            }
        };
        scratch.store_grade(text, grade);
        grade
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}

/// Removes one leading and one trailing double quote.
#[must_use]
pub fn strip_wrapping_quotes(text: &str) -> &str {
    let text = text.strip_prefix('"').unwrap_or(text);
    text.strip_suffix('"').unwrap_or(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::{
        adapters::DeletionReverter,
        error::OracleError,
        oracle::{Evaluator, GenerationOracle, GrammarClassifier, PromptVariant, RewriteReverter},
    };

    /// Parameters of one generation request as the oracle received them.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct SeenRequest {
        pub(crate) variant: PromptVariant,
        pub(crate) n: usize,
        pub(crate) temperature: f64,
        pub(crate) system_message: Option<String>,
    }

    /// Oracle replaying a fixed script; falls back to echoing the input.
    pub(crate) struct ScriptedOracle {
        pub(crate) script: Mutex<VecDeque<Result<Vec<String>, OracleError>>>,
        pub(crate) calls: Mutex<usize>,
        pub(crate) seen: Mutex<Vec<SeenRequest>>,
    }

    impl ScriptedOracle {
        pub(crate) fn new(script: Vec<Result<Vec<String>, OracleError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerationOracle for ScriptedOracle {
        async fn generate(
            &self,
            request: GenerationRequest<'_>,
        ) -> Result<Vec<String>, OracleError> {
            *self.calls.lock() += 1;
            self.seen.lock().push(SeenRequest {
                variant: request.variant,
                n: request.n,
                temperature: request.temperature,
                system_message: request.system_message.map(str::to_string),
            });
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![request.text.to_string(); request.n]))
        }
    }

    /// Reverter returning the candidate unchanged.
    pub(crate) struct Identity;

    impl RewriteReverter for Identity {
        fn revert(&self, _original: &str, candidate: &str) -> String {
            candidate.to_string()
        }
    }

    /// Evaluator returning constants.
    pub(crate) struct Flat;

    impl Evaluator for Flat {
        fn semantic_score(&self, _reference: &str, _candidate: &str) -> f64 {
            0.5
        }
        fn paraphrase_score(&self, _source: &str, _candidate: &str) -> f64 {
            0.5
        }
        fn length_score(&self, _source: &str, _candidate: &str, _target: f64) -> f64 {
            0.5
        }
    }

    /// Grades everything A except texts containing "ungrammatical".
    pub(crate) struct Picky;

    #[async_trait]
    impl GrammarClassifier for Picky {
        async fn classify(
            &self,
            text: &str,
            _credentials: &Credentials,
        ) -> Result<GrammarGrade, OracleError> {
            if text.contains("ungrammatical") {
                Ok(GrammarGrade::C)
            } else {
                Ok(GrammarGrade::A)
            }
        }
    }

    pub(crate) fn collaborators(oracle: Arc<ScriptedOracle>) -> Collaborators {
        Collaborators {
            oracle,
            reverter: Arc::new(Identity),
            evaluator: Arc::new(Flat),
            grammar: Arc::new(Picky),
        }
    }

    fn iterator(oracle: Arc<ScriptedOracle>) -> DepthIterator {
        DepthIterator::new(
            Arc::new(SimplifierConfig::default()),
            collaborators(oracle),
            None,
        )
    }

    fn ok(texts: &[&str]) -> Result<Vec<String>, OracleError> {
        Ok(texts.iter().map(ToString::to_string).collect())
    }

    async fn run(oracle: Arc<ScriptedOracle>, sentence: &str) -> DepthOutcome {
        run_with(iterator(oracle), sentence, None).await
    }

    async fn run_with(
        iterator: DepthIterator,
        sentence: &str,
        system_message: Option<&str>,
    ) -> DepthOutcome {
        let credentials = Credentials::new("sk-test").unwrap();
        let ctx = SentenceContext {
            index: 0,
            credentials: &credentials,
            system_message,
        };
        iterator.run(sentence, &ctx).await
    }

    fn deleting_iterator(oracle: Arc<ScriptedOracle>) -> DepthIterator {
        DepthIterator::new(
            Arc::new(SimplifierConfig::default()),
            Collaborators {
                oracle,
                reverter: Arc::new(DeletionReverter),
                evaluator: Arc::new(Flat),
                grammar: Arc::new(Picky),
            },
            None,
        )
    }

    #[tokio::test]
    async fn chain_never_exceeds_max_depth() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            ok(&["a b c d e f"]),
            ok(&["a b c d e"]),
            ok(&["a b c d"]),
            ok(&["a b c"]),
            ok(&["a b"]),
            ok(&["a"]),
        ]));
        let outcome = run(oracle.clone(), "a b c d e f g").await;
        assert_eq!(outcome.chain.len(), 5);
        assert_eq!(outcome.reason, StopReason::MaxDepth);
        assert_eq!(outcome.chain.last(), "a b c");
        assert_eq!(*oracle.calls.lock(), 4);
    }

    #[tokio::test]
    async fn unchanged_rewrites_halt_after_second_round() {
        let sentence = "The court dismissed the appeal.";
        let oracle = Arc::new(ScriptedOracle::new(Vec::new()));
        let outcome = run(oracle.clone(), sentence).await;
        assert_eq!(outcome.reason, StopReason::NoProgress);
        assert_eq!(outcome.chain.levels(), &[sentence, sentence]);
        assert_eq!(*oracle.calls.lock(), 2);
        assert_eq!(outcome.stats.memo_hits, 3);
    }

    #[tokio::test]
    async fn oracle_failure_keeps_partial_chain() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            ok(&["\"The court dismissed it.\""]),
            Err(OracleError::Transport("connection reset".into())),
        ]));
        let outcome = run(oracle, "The court dismissed the appeal today.").await;
        assert_eq!(outcome.reason, StopReason::OracleFailed);
        assert_eq!(
            outcome.chain.levels(),
            &["The court dismissed the appeal today.", "The court dismissed it."]
        );
    }

    #[tokio::test]
    async fn empty_round_ends_chain() {
        let oracle = Arc::new(ScriptedOracle::new(vec![ok(&[])]));
        let outcome = run(oracle, "Costs follow the event.").await;
        assert_eq!(outcome.reason, StopReason::Exhausted);
        assert_eq!(outcome.chain.len(), 1);
    }

    #[tokio::test]
    async fn blank_sentence_is_returned_as_is() {
        let oracle = Arc::new(ScriptedOracle::new(Vec::new()));
        let outcome = run(oracle.clone(), "   ").await;
        assert_eq!(outcome.reason, StopReason::EmptySentence);
        assert_eq!(outcome.chain.levels(), &[""]);
        assert_eq!(*oracle.calls.lock(), 0);
    }

    #[tokio::test]
    async fn grammatical_candidate_beats_ungrammatical_one() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            ok(&["court ungrammatical the", "The court ruled."]),
            Err(OracleError::Malformed("stop".into())),
        ]));
        let outcome = run(oracle, "The court ruled on the matter.").await;
        assert_eq!(outcome.chain.last(), "The court ruled.");
    }

    #[tokio::test]
    async fn paraphrases_that_revert_to_nothing_are_discarded() {
        let sentence = "The court dismissed the appeal.";
        let oracle = Arc::new(ScriptedOracle::new(vec![ok(&[
            "Totally different words here.",
            "Another paraphrase entirely.",
        ])]));
        let outcome = run_with(deleting_iterator(oracle.clone()), sentence, None).await;
        assert_eq!(outcome.reason, StopReason::Exhausted);
        assert_eq!(outcome.chain.levels(), &[sentence]);
        assert_eq!(*oracle.calls.lock(), 1);
        assert_eq!(outcome.stats.classifications, 0);
    }

    #[tokio::test]
    async fn deletion_survives_next_to_a_paraphrase() {
        let sentence = "The court dismissed the appeal.";
        let oracle = Arc::new(ScriptedOracle::new(vec![ok(&[
            "Totally different words here.",
            "The court dismissed it.",
        ])]));
        let outcome = run_with(deleting_iterator(oracle), sentence, None).await;
        assert_eq!(outcome.reason, StopReason::NoProgress);
        assert_eq!(outcome.chain.levels(), &[sentence, "The court dismissed."]);
        assert!(outcome.chain.levels().iter().all(|level| !level.is_empty()));
    }

    #[tokio::test]
    async fn short_sentence_uses_standard_prompt_and_system_message() {
        let oracle = Arc::new(ScriptedOracle::new(Vec::new()));
        run_with(
            iterator(oracle.clone()),
            "The court dismissed the appeal.",
            Some("Be brief."),
        )
        .await;
        let config = SimplifierConfig::default();
        let seen = oracle.seen.lock().clone();
        assert_eq!(seen.len(), 2);
        for request in seen {
            assert_eq!(request.variant, PromptVariant::Standard);
            assert_eq!(request.n, config.candidate_count);
            assert!((request.temperature - config.temperature).abs() < 1e-12);
            assert_eq!(request.system_message.as_deref(), Some("Be brief."));
        }
    }

    #[tokio::test]
    async fn long_sentence_uses_aggressive_prompt_and_stops_on_small_reduction() {
        let sentence = format!("{}.", ["clause"; 90].join(" "));
        let oracle = Arc::new(ScriptedOracle::new(Vec::new()));
        let outcome = run_with(iterator(oracle.clone()), &sentence, None).await;
        assert_eq!(outcome.reason, StopReason::InsufficientReduction);
        assert_eq!(outcome.chain.levels(), &[sentence.clone(), sentence]);
        let seen = oracle.seen.lock().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|request| request.variant == PromptVariant::Aggressive));
        assert!(seen
            .iter()
            .all(|request| request.n == SimplifierConfig::default().candidate_count));
        assert!(seen.iter().all(|request| request.system_message.is_none()));
    }

    #[test]
    fn strips_one_quote_each_side() {
        assert_eq!(strip_wrapping_quotes("\"x\""), "x");
        assert_eq!(strip_wrapping_quotes("\"\"x\"\""), "\"x\"");
        assert_eq!(strip_wrapping_quotes("x\""), "x");
        assert_eq!(strip_wrapping_quotes(""), "");
    }
}
