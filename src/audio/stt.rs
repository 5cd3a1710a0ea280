//! Speech-to-text collaborator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::Deserialize;

use crate::error::SibylError;
use crate::http::{shared_client, status_to_error, token_headers, trim_trailing_slash};
use crate::util::timeout::with_timeout;

const DEFAULT_BASE_URL: &str = "https://api.deepgram.com";
const DEFAULT_MODEL: &str = "nova-2";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for speech-to-text providers. Input is raw s16le mono PCM.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8], sample_rate: u32) -> Result<String, SibylError>;
}

/// Deepgram pre-recorded transcription client (`/v1/listen`).
#[derive(Debug, Clone)]
pub struct DeepgramStt {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl DeepgramStt {
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

    fn validate_inputs(&self, audio: &[u8], sample_rate: u32) -> Result<(), SibylError> {
        if self.api_key.trim().is_empty() {
            return Err(SibylError::Authentication(
                "Missing speech-to-text API key".to_string(),
            ));
        }
        if audio.is_empty() {
            return Err(SibylError::InvalidArgument(
                "Audio payload cannot be empty".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(SibylError::InvalidArgument(
                "Sample rate must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechToText for DeepgramStt {
    async fn transcribe(&self, audio: &[u8], sample_rate: u32) -> Result<String, SibylError> {
        self.validate_inputs(audio, sample_rate)?;

        let url = format!(
            "{}/v1/listen?model={}&encoding=linear16&sample_rate={}",
            trim_trailing_slash(&self.base_url),
            self.model,
            sample_rate
        );

        let mut headers = token_headers(&self.api_key);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );

        let payload = audio.to_vec();

        with_timeout(self.timeout, async {
            let response = shared_client()
                .post(url)
                .headers(headers)
                .body(payload)
                .send()
                .await?;

            let status = response.status().as_u16();
            if status != 200 {
                let body = response.text().await.unwrap_or_default();
                return Err(status_to_error(status, &body));
            }

            let parsed: ListenResponse = response.json().await?;
            let transcript = parsed
                .results
                .channels
                .into_iter()
                .next()
                .and_then(|channel| channel.alternatives.into_iter().next())
                .map(|alternative| alternative.transcript)
                .ok_or_else(|| {
                    SibylError::Stt("Transcription response missing alternatives".to_string())
                })?;

            // Silence legitimately transcribes to an empty string.
            Ok(transcript)
        })
        .await
    }
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    channels: Vec<ListenChannel>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    #[serde(default)]
    transcript: String,
}
