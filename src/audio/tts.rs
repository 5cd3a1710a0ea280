//! Text-to-speech collaborator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::error::SibylError;
use crate::http::{shared_client, status_to_error, trim_trailing_slash};
use crate::util::timeout::with_timeout;

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const DEFAULT_MODEL: &str = "eleven_turbo_v2";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for text-to-speech providers. Output is encoded audio bytes.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SibylError>;
}

/// ElevenLabs synthesis client (`/v1/text-to-speech/{voice_id}`).
#[derive(Debug, Clone)]
pub struct ElevenLabsTts {
    api_key: String,
    voice_id: String,
    base_url: String,
    model_id: String,
    timeout: Duration,
}

impl ElevenLabsTts {
    pub fn new(api_key: String, voice_id: String) -> Self {
        Self {
            api_key,
            voice_id,
            base_url: DEFAULT_BASE_URL.to_string(),
            model_id: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn new_with_base_url(
        api_key: String,
        voice_id: String,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key,
            voice_id,
            base_url: base_url.into(),
            model_id: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn validate_request(&self, text: &str) -> Result<(), SibylError> {
        if self.api_key.trim().is_empty() {
            return Err(SibylError::Authentication(
                "Missing text-to-speech API key".to_string(),
            ));
        }
        if self.voice_id.trim().is_empty() {
            return Err(SibylError::InvalidArgument(
                "Voice id cannot be empty".to_string(),
            ));
        }
        if text.trim().is_empty() {
            return Err(SibylError::InvalidArgument(
                "Speech text cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(val) = HeaderValue::from_str(&self.api_key) {
            headers.insert("xi-api-key", val);
        }
        headers
    }
}

#[async_trait]
impl TextToSpeech for ElevenLabsTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SibylError> {
        self.validate_request(text)?;

        let url = format!(
            "{}/v1/text-to-speech/{}",
            trim_trailing_slash(&self.base_url),
            self.voice_id
        );
        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
        });

        with_timeout(self.timeout, async {
            let response = shared_client()
                .post(url)
                .headers(self.headers())
                .json(&body)
                .send()
                .await?;

            let status = response.status().as_u16();
            if status != 200 {
                let body_text = response.text().await.unwrap_or_default();
                return Err(status_to_error(status, &body_text));
            }

            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Err(SibylError::Tts(
                    "Synthesis response contained empty audio payload".to_string(),
                ));
            }

            Ok(bytes.to_vec())
        })
        .await
    }
}
