//! Chat-completion collaborator.
//!
//! The relay calls this against the configured LLM endpoint; the voice worker
//! calls the same client against the relay's derived callback address, which
//! speaks the identical wire shape.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::SibylError;
use crate::http::{bearer_headers, shared_client, status_to_error, trim_trailing_slash};
use crate::types::Turn;
use crate::util::timeout::with_timeout;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Bounded wait for a single completion call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Trait for chat-completion collaborators: full ordered transcript in, one
/// text reply out, within a bounded wait.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, transcript: &[Turn]) -> Result<String, SibylError>;
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiCompatClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn new_with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn validate_transcript(&self, transcript: &[Turn]) -> Result<(), SibylError> {
        if transcript.is_empty() {
            return Err(SibylError::InvalidArgument(
                "Transcript cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatCompletion for OpenAiCompatClient {
    async fn complete(&self, transcript: &[Turn]) -> Result<String, SibylError> {
        self.validate_transcript(transcript)?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": transcript,
        });
        let url = format!("{}/chat/completions", trim_trailing_slash(&self.base_url));

        debug!(turns = transcript.len(), model = %self.model, "chat completion request");

        with_timeout(self.timeout, async {
            let response = shared_client()
                .post(url)
                .headers(bearer_headers(&self.api_key))
                .json(&body)
                .send()
                .await?;

            let status = response.status().as_u16();
            if status != 200 {
                let body_text = response.text().await.unwrap_or_default();
                return Err(status_to_error(status, &body_text));
            }

            let data: ChatCompletionResponse = response.json().await?;
            let choice = data
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| SibylError::Completion("No choices in response".to_string()))?;

            Ok(choice.message.content.unwrap_or_default())
        })
        .await
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
