use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::OracleConfig,
    error::OracleError,
    oracle::{GenerationOracle, GenerationRequest},
};

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    n: usize,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: std::borrow::Cow<'a, str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client (`POST {endpoint}` with bearer auth).
#[derive(Debug, Clone)]
pub struct ChatCompletionsOracle {
    client: Client,
    config: OracleConfig,
}

impl ChatCompletionsOracle {
    /// Creates the client with the configured request timeout.
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| OracleError::Transport(err.to_string()))?;
        Ok(Self { client, config })
    }

    /// Endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

fn request_body<'a>(model: &'a str, request: &GenerationRequest<'a>) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = request.system_message {
        messages.push(ChatMessage {
            role: "system",
            content: system.into(),
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: request.variant.render(request.text).into(),
    });
    ChatRequest {
        model,
        messages,
        n: request.n,
        temperature: request.temperature,
    }
}

fn parse_choices(body: &str) -> Result<Vec<String>, OracleError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|err| OracleError::Malformed(err.to_string()))?;
    Ok(response
        .choices
        .into_iter()
        .filter_map(|choice| choice.message.content)
        .collect())
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[async_trait]
impl GenerationOracle for ChatCompletionsOracle {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Vec<String>, OracleError> {
        let body = request_body(&self.config.model, &request);
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(request.credentials.expose())
            .json(&body)
            .send()
            .await
            .map_err(|err| OracleError::Transport(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| OracleError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: truncate(text),
            });
        }
        parse_choices(&text)
    }
}
