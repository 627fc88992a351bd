use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::config::CoachConfig;
use crate::conversation::{ChatMessage, Turn};
use crate::error::CompletionError;

/// Everything one stateless completion call needs.
///
/// `turns` holds the whole conversation so far, ending with the new user
/// message; the endpoint keeps no memory between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub instruction: String,
    pub turns: Vec<Turn>,
    pub temperature: f32,
}

impl CompletionRequest {
    /// System instruction first, then every turn in order.
    pub fn messages(&self) -> Vec<ChatMessage<'_>> {
        let mut messages = Vec::with_capacity(self.turns.len() + 1);
        messages.push(ChatMessage {
            role: "system",
            content: &self.instruction,
        });
        messages.extend(self.turns.iter().map(ChatMessage::from));
        messages
    }
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

// OpenAI-compatible /chat/completions body
#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct CompletionClient {
    client: Client,
    config: CoachConfig,
}

impl CompletionClient {
    pub fn new(config: CoachConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    #[instrument(skip(self, request), fields(model = %self.config.model, messages = request.turns.len() + 1))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatCompletionBody {
            model: &self.config.model,
            messages: request.messages(),
            temperature: request.temperature,
        };

        debug!(url = %self.config.api_url, temperature = request.temperature, "Sending completion request");

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        // Only 200 carries a completion.
        if status != StatusCode::OK {
            error!(%status, body = %text, "Completion API request failed");
            return Err(CompletionError::Remote {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, "Completion response was not valid JSON");
            CompletionError::Transport(format!("failed to decode completion response: {}", e))
        })?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                CompletionError::Transport("completion response contained no message content".to_string())
            })?;

        debug!(chars = reply.len(), "Received completion");
        Ok(reply)
    }
}
