use std::sync::Arc;

use serde_json::json;
use tokio::{sync::Semaphore, task::JoinSet};
use tsm_logging::LogLevel;
use uuid::Uuid;

use crate::{
    config::SimplifierConfig,
    depth::{DepthIterator, SentenceContext},
    error::SimplifyResult,
    ladder::{DepthChain, Ladder},
    oracle::{Collaborators, Credentials},
    splitter::split_sentences,
    telemetry::SimplifierTelemetry,
};

/// Builder for [`Simplifier`].
#[derive(Debug)]
pub struct SimplifierBuilder {
    collaborators: Collaborators,
    config: SimplifierConfig,
    telemetry: Option<SimplifierTelemetry>,
}

impl SimplifierBuilder {
    /// Starts from default configuration.
    #[must_use]
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            config: SimplifierConfig::default(),
            telemetry: None,
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn config(mut self, config: SimplifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn telemetry(mut self, telemetry: SimplifierTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Validates the configuration and builds the simplifier.
    pub fn build(self) -> SimplifyResult<Simplifier> {
        self.config.validate()?;
        let workers = self.config.worker_count;
        Ok(Simplifier {
            config: Arc::new(self.config),
            collaborators: self.collaborators,
            telemetry: self.telemetry,
            semaphore: Arc::new(Semaphore::new(workers)),
        })
    }
}

/// Turns paragraphs into ladders, shortening sentences concurrently.
#[derive(Debug, Clone)]
pub struct Simplifier {
    config: Arc<SimplifierConfig>,
    collaborators: Collaborators,
    telemetry: Option<SimplifierTelemetry>,
    semaphore: Arc<Semaphore>,
}

impl Simplifier {
    /// Returns a builder.
    #[must_use]
    pub fn builder(collaborators: Collaborators) -> SimplifierBuilder {
        SimplifierBuilder::new(collaborators)
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SimplifierConfig {
        &self.config
    }

    /// Simplifies `paragraph` into a ladder.
    ///
    /// Blank `api_key` fails with
    /// [`MissingCredentials`](crate::error::SimplifyError::MissingCredentials)
    /// before the oracle is called. Nothing else fails: sentence-level
    /// problems degrade that sentence only.
    pub async fn simplify(
        &self,
        paragraph: &str,
        api_key: &str,
        system_message: Option<&str>,
    ) -> SimplifyResult<Ladder> {
        let credentials = Credentials::new(api_key)?;
        Ok(self
            .simplify_with(paragraph, &credentials, system_message)
            .await)
    }

    /// Like [`simplify`](Self::simplify) with already validated credentials.
    pub async fn simplify_with(
        &self,
        paragraph: &str,
        credentials: &Credentials,
        system_message: Option<&str>,
    ) -> Ladder {
        self.ladder_for(paragraph, credentials, system_message, Uuid::new_v4())
            .await
    }

    /// Depth chains of every sentence, in paragraph order.
    pub async fn simplify_chains(
        &self,
        paragraph: &str,
        credentials: &Credentials,
        system_message: Option<&str>,
    ) -> Vec<DepthChain> {
        self.chains_for(paragraph, credentials, system_message, Uuid::new_v4())
            .await
    }

    pub(crate) async fn ladder_for(
        &self,
        paragraph: &str,
        credentials: &Credentials,
        system_message: Option<&str>,
        request_id: Uuid,
    ) -> Ladder {
        let chains = self
            .chains_for(paragraph, credentials, system_message, request_id)
            .await;
        let ladder = Ladder::recombine(&chains, self.config.ladder_levels);
        let telemetry = self.scoped(request_id);
        log(
            telemetry.as_ref(),
            LogLevel::Info,
            "simplify.paragraph.complete",
            json!({
                "sentences": chains.len(),
                "produced_depth": ladder.produced_depth(),
                "levels": ladder.levels().len(),
            }),
        );
        event(
            telemetry.as_ref(),
            "simplify.paragraph.completed",
            json!({ "sentences": chains.len(), "produced_depth": ladder.produced_depth() }),
        )
        .await;
        ladder
    }

    async fn chains_for(
        &self,
        paragraph: &str,
        credentials: &Credentials,
        system_message: Option<&str>,
        request_id: Uuid,
    ) -> Vec<DepthChain> {
        let telemetry = self.scoped(request_id);
        let sentences = split_sentences(paragraph);
        log(
            telemetry.as_ref(),
            LogLevel::Info,
            "simplify.paragraph.start",
            json!({ "sentences": sentences.len(), "workers": self.config.worker_count }),
        );

        let iterator = DepthIterator::new(
            Arc::clone(&self.config),
            self.collaborators.clone(),
            telemetry.clone(),
        );
        let mut set = JoinSet::new();
        for (index, sentence) in sentences.iter().cloned().enumerate() {
            let iterator = iterator.clone();
            let semaphore = Arc::clone(&self.semaphore);
            let credentials = credentials.clone();
            let system_message = system_message.map(str::to_string);
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let ctx = SentenceContext {
                    index,
                    credentials: &credentials,
                    system_message: system_message.as_deref(),
                };
                (index, iterator.run(&sentence, &ctx).await)
            });
        }

        let mut chains: Vec<Option<DepthChain>> = vec![None; sentences.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    event(
                        telemetry.as_ref(),
                        "simplify.sentence.completed",
                        json!({
                            "index": index,
                            "depth": outcome.chain.len() - 1,
                            "reason": outcome.reason,
                            "stats": outcome.stats,
                        }),
                    )
                    .await;
                    if let Some(slot) = chains.get_mut(index) {
                        *slot = Some(outcome.chain);
                    }
                }
                Err(err) => log(
                    telemetry.as_ref(),
                    LogLevel::Error,
                    "simplify.sentence.task_failed",
                    json!({ "error": err.to_string() }),
                ),
            }
        }

        chains
            .into_iter()
            .zip(sentences)
            .enumerate()
            .map(|(index, (chain, sentence))| {
                chain.unwrap_or_else(|| {
                    log(
                        telemetry.as_ref(),
                        LogLevel::Warn,
                        "simplify.sentence.task_failed",
                        json!({ "sentence": index, "fallback": "original" }),
                    );
                    DepthChain::new(sentence.trim())
                })
            })
            .collect()
    }

    fn scoped(&self, request_id: Uuid) -> Option<SimplifierTelemetry> {
        self.telemetry.as_ref().map(|tel| tel.scoped(request_id))
    }
}

fn log(
    telemetry: Option<&SimplifierTelemetry>,
    level: LogLevel,
    message: &str,
    metadata: serde_json::Value,
) {
    if let Some(tel) = telemetry {
        let _ = tel.log(level, message, metadata);
    }
}

async fn event(
    telemetry: Option<&SimplifierTelemetry>,
    event_type: &str,
    payload: serde_json::Value,
) {
    if let Some(tel) = telemetry {
        let _ = tel.event(event_type, payload).await;
    }
}
