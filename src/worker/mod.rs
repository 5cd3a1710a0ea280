//! Voice worker entrypoint.
//!
//! Runs in a separate process from the session relay. On being dispatched
//! into a room it recovers the session identity from the dispatch metadata,
//! derives the relay's callback address, connects to the room, waits for the
//! first participant, and runs the speech pipeline against that address.

pub mod metadata;
pub mod pipeline;

pub use metadata::DispatchMetadata;
pub use pipeline::VoicePipeline;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::audio::{SpeechToText, TextToSpeech};
use crate::completion::OpenAiCompatClient;
use crate::error::Result;
use crate::http::trim_trailing_slash;
use crate::room::RoomConnector;

/// Bounded wait for one callback completion call.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_INSTRUCTIONS: &str = "You are a friendly voice assistant. Keep your replies short \
     and conversational; you are speaking out loud, not writing.";

const DEFAULT_GREETING: &str = "Hello! I'm your voice assistant. How can I help you today?";

/// The job handed to a dispatched worker: the room to join and the metadata
/// text attached to the dispatch.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub room: String,
    pub metadata: String,
}

/// Behavior knobs for a worker session.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub instructions: String,
    pub greeting: String,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

/// Compose the relay callback address from the backend host and the session
/// identity. A host without an explicit scheme defaults to secure transport.
pub fn agent_stream_url(engine_address: &str, metadata: &DispatchMetadata) -> String {
    let trimmed = trim_trailing_slash(engine_address.trim());
    let base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    format!(
        "{base}/stream/agents/{}/{}/{}",
        metadata.agent_name.as_deref().unwrap_or_default(),
        metadata.agent_id.as_deref().unwrap_or_default(),
        metadata.run_id.as_deref().unwrap_or_default(),
    )
}

/// Entrypoint for one dispatched job: parse metadata, derive the callback
/// address, join the room, wait for the first participant, run the pipeline.
pub async fn run_session(
    ctx: JobContext,
    options: WorkerOptions,
    engine_address: &str,
    connector: Arc<dyn RoomConnector>,
    stt: Arc<dyn SpeechToText>,
    tts: Arc<dyn TextToSpeech>,
) -> Result<()> {
    info!(room = %ctx.room, metadata = %ctx.metadata, "worker received job");

    let metadata = DispatchMetadata::parse(&ctx.metadata);
    let agent_url = agent_stream_url(engine_address, &metadata);
    info!(%agent_url, "derived agent callback address");

    // The relay callback speaks the chat-completions wire shape, so the
    // stock client points at it unchanged. The key is a correlation marker,
    // not a credential.
    let api_key = format!(
        "{}-livekit",
        metadata.agent_id.as_deref().unwrap_or_default()
    );
    let completion = OpenAiCompatClient::new_with_base_url(api_key, agent_url)
        .with_timeout(CALLBACK_TIMEOUT);

    let room = connector.connect(&ctx.room).await?;
    let participant = room.wait_for_participant().await?;
    info!(identity = %participant.identity, "starting voice assistant for participant");

    VoicePipeline::new(
        room,
        stt,
        Arc::new(completion),
        tts,
        options.instructions,
        options.greeting,
    )
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> DispatchMetadata {
        DispatchMetadata {
            agent_name: Some("AgentVoice".to_string()),
            agent_id: Some("123".to_string()),
            run_id: Some("456".to_string()),
        }
    }

    #[test]
    fn derives_url_with_explicit_scheme() {
        let url = agent_stream_url("http://localhost:5233", &identity());
        assert_eq!(url, "http://localhost:5233/stream/agents/AgentVoice/123/456");
    }

    #[test]
    fn bare_host_defaults_to_https() {
        let url = agent_stream_url("engine.example.com", &identity());
        assert_eq!(
            url,
            "https://engine.example.com/stream/agents/AgentVoice/123/456"
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let url = agent_stream_url("https://engine.example.com/", &identity());
        assert_eq!(
            url,
            "https://engine.example.com/stream/agents/AgentVoice/123/456"
        );
    }

    #[test]
    fn missing_identity_fields_leave_empty_segments() {
        let url = agent_stream_url("engine.example.com", &DispatchMetadata::default());
        assert_eq!(url, "https://engine.example.com/stream/agents///");
    }
}
