//! Environment-derived configuration.
//!
//! Built once at process start (`SibylConfig::from_env`) and passed by
//! reference into whichever component needs it; business logic never reads
//! ambient environment state on its own.

use std::fmt;
use std::time::Duration;

/// Default auto-end duration for a voice session, in minutes.
const DEFAULT_SESSION_TIMEOUT_MINUTES: u64 = 5;

/// Default bind address for the session host.
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5233";

/// Process configuration for the relay host and the voice worker.
#[derive(Clone)]
pub struct SibylConfig {
    /// Backend engine address the worker derives its callback URL from.
    pub engine_address: Option<String>,
    /// Room platform server API URL (`LIVEKIT_API_URL`, falling back to
    /// `LIVEKIT_URL`).
    pub livekit_api_url: Option<String>,
    pub livekit_api_key: Option<String>,
    pub livekit_api_secret: Option<String>,
    /// Chat-completion endpoint credentials for the relay's outbound call.
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    /// Speech-to-text provider key.
    pub deepgram_api_key: Option<String>,
    /// Text-to-speech provider key and voice selector.
    pub eleven_api_key: Option<String>,
    pub elevenlabs_voice_id: Option<String>,
    /// Auto-end duration for a session once dispatch has succeeded. Zero
    /// disables the timer and leaves termination purely signal-driven.
    pub session_timeout: Duration,
    /// Bind address for `sibyl serve`.
    pub bind_address: String,
}

impl fmt::Debug for SibylConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SibylConfig")
            .field("engine_address", &self.engine_address)
            .field("livekit_api_url", &self.livekit_api_url)
            .field("livekit_api_key", &self.livekit_api_key)
            .field("livekit_api_secret", &self.livekit_api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("openai_base_url", &self.openai_base_url)
            .field("deepgram_api_key", &self.deepgram_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("eleven_api_key", &self.eleven_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("elevenlabs_voice_id", &self.elevenlabs_voice_id)
            .field("session_timeout", &self.session_timeout)
            .field("bind_address", &self.bind_address)
            .finish()
    }
}

impl SibylConfig {
    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            engine_address: env("SIBYL_ENGINE_ADDRESS"),
            livekit_api_url: env("LIVEKIT_API_URL").or_else(|| env("LIVEKIT_URL")),
            livekit_api_key: env("LIVEKIT_API_KEY"),
            livekit_api_secret: env("LIVEKIT_API_SECRET"),
            openai_api_key: env("OPENAI_API_KEY"),
            openai_base_url: env("OPENAI_BASE_URL"),
            deepgram_api_key: env("DEEPGRAM_API_KEY"),
            eleven_api_key: env("ELEVEN_API_KEY"),
            elevenlabs_voice_id: env("ELEVENLABS_VOICE_ID"),
            session_timeout: session_timeout_from(env("SIBYL_SESSION_TIMEOUT_MINUTES")),
            bind_address: env("SIBYL_BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
        }
    }

    /// Warn about unset options. Never fails: a missing credential surfaces
    /// later as a failure of the collaborator call that needed it.
    pub fn validate(&self) {
        let required = [
            ("SIBYL_ENGINE_ADDRESS", "backend engine address", self.engine_address.is_some()),
            ("LIVEKIT_API_URL", "room platform server API URL", self.livekit_api_url.is_some()),
            ("LIVEKIT_API_KEY", "API key for the room platform", self.livekit_api_key.is_some()),
            ("LIVEKIT_API_SECRET", "API secret for the room platform", self.livekit_api_secret.is_some()),
            ("OPENAI_API_KEY", "API key for chat completion", self.openai_api_key.is_some()),
            ("DEEPGRAM_API_KEY", "API key for speech-to-text", self.deepgram_api_key.is_some()),
            ("ELEVEN_API_KEY", "API key for text-to-speech", self.eleven_api_key.is_some()),
        ];
        for (name, description, set) in required {
            if !set {
                tracing::warn!("Environment variable {name} ({description}) is not set");
            }
        }
    }
}

impl Default for SibylConfig {
    fn default() -> Self {
        Self {
            engine_address: None,
            livekit_api_url: None,
            livekit_api_key: None,
            livekit_api_secret: None,
            openai_api_key: None,
            openai_base_url: None,
            deepgram_api_key: None,
            eleven_api_key: None,
            elevenlabs_voice_id: None,
            session_timeout: Duration::from_secs(DEFAULT_SESSION_TIMEOUT_MINUTES * 60),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

fn session_timeout_from(value: Option<String>) -> Duration {
    let minutes = value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_SESSION_TIMEOUT_MINUTES);
    Duration::from_secs(minutes * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_timeout_defaults_to_five_minutes() {
        assert_eq!(session_timeout_from(None), Duration::from_secs(300));
    }

    #[test]
    fn session_timeout_parses_minutes() {
        assert_eq!(
            session_timeout_from(Some("2".to_string())),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn session_timeout_ignores_garbage() {
        assert_eq!(
            session_timeout_from(Some("soon".to_string())),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn session_timeout_zero_disables_timer() {
        assert_eq!(
            session_timeout_from(Some("0".to_string())),
            Duration::ZERO
        );
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = SibylConfig {
            livekit_api_secret: Some("hush".to_string()),
            ..SibylConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hush"));
        assert!(rendered.contains("REDACTED"));
    }
}
