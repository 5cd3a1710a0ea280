//! HTTP surface for hosted sessions.
//!
//! Stands where the hosting runtime would: creates voice sessions, routes
//! the worker's callback (an OpenAI-compatible completions request) to the
//! owning relay's `submit_turns`, and accepts end signals. The stream path
//! shape matches what the worker derives from dispatch metadata.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::completion::ChatCompletion;
use crate::dispatch::RoomDispatcher;
use crate::error::SibylError;
use crate::session::{SessionHost, SessionIdentity, SessionRelay, VoiceSessionInput};
use crate::types::{Role, Turn};

/// Shared state behind the router.
#[derive(Clone)]
pub struct AppState {
    pub host: Arc<SessionHost>,
    pub completion: Arc<dyn ChatCompletion>,
    pub dispatcher: Arc<dyn RoomDispatcher>,
    /// Worker/agent type name stamped on every session this host creates.
    pub agent_name: String,
    /// Auto-end duration for new sessions; zero leaves them signal-driven.
    pub auto_end: Duration,
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/agents/voice", post(create_voice_session))
        .route(
            "/stream/agents/{agent_name}/{agent_id}/{run_id}/chat/completions",
            post(stream_chat),
        )
        .route("/agents/{agent_name}/{agent_id}/{run_id}/end", post(end_session))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn create_voice_session(
    State(state): State<AppState>,
    Json(input): Json<VoiceSessionInput>,
) -> (StatusCode, Json<Value>) {
    let identity = SessionIdentity::new(
        state.agent_name.clone(),
        Uuid::new_v4().to_string(),
        Uuid::new_v4().to_string(),
    );
    info!(
        agent_id = %identity.agent_id,
        run_id = %identity.run_id,
        room_id = input.room_id.as_deref().unwrap_or("<run id>"),
        "creating voice session"
    );

    let relay = Arc::new(
        SessionRelay::new(
            identity.clone(),
            state.completion.clone(),
            state.dispatcher.clone(),
        )
        .with_auto_end(state.auto_end),
    );
    state.host.launch(relay, input);

    (
        StatusCode::CREATED,
        Json(json!({
            "agent_name": identity.agent_name,
            "agent_id": identity.agent_id,
            "run_id": identity.run_id,
        })),
    )
}

/// OpenAI-compatible completion request as the worker's client sends it.
#[derive(Debug, Deserialize)]
struct StreamChatRequest {
    #[serde(default)]
    model: Option<String>,
    messages: Vec<Turn>,
}

async fn stream_chat(
    State(state): State<AppState>,
    Path((agent_name, _agent_id, run_id)): Path<(String, String, String)>,
    Json(request): Json<StreamChatRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if agent_name != state.agent_name {
        warn!(%agent_name, "stream request for unexpected agent name");
    }

    let relay = state
        .host
        .get(&run_id)
        .ok_or_else(|| not_found(&run_id))?;

    // The caller sends its full context every turn; the relay owns the
    // transcript, so only the user turns after the last assistant reply are
    // new to it.
    let new_turns = new_user_turns(&request.messages);
    let transcript = relay
        .submit_turns(new_turns)
        .await
        .map_err(error_response)?;

    let reply = transcript
        .last()
        .map(|turn| turn.content.clone())
        .unwrap_or_default();

    Ok(Json(json!({
        "id": format!("chatcmpl-{}", Uuid::new_v4().simple()),
        "object": "chat.completion",
        "model": request.model.unwrap_or_else(|| "sibyl-relay".to_string()),
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": reply},
            "finish_reason": "stop",
        }],
    })))
}

async fn end_session(
    State(state): State<AppState>,
    Path((_agent_name, _agent_id, run_id)): Path<(String, String, String)>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let relay = state
        .host
        .get(&run_id)
        .ok_or_else(|| not_found(&run_id))?;
    relay.signal_end();
    Ok(Json(json!({"ended": true})))
}

fn new_user_turns(messages: &[Turn]) -> Vec<Turn> {
    let start = messages
        .iter()
        .rposition(|turn| turn.role == Role::Assistant)
        .map(|index| index + 1)
        .unwrap_or(0);
    messages[start..]
        .iter()
        .filter(|turn| turn.role == Role::User)
        .cloned()
        .collect()
}

fn not_found(run_id: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": {"message": format!("No live session for run id {run_id}")}})),
    )
}

fn error_response(error: SibylError) -> (StatusCode, Json<Value>) {
    let status = match &error {
        SibylError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        SibylError::InvalidState(_) => StatusCode::CONFLICT,
        SibylError::Completion(_) | SibylError::Dispatch(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({"error": {"message": error.to_string()}})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_turns_takes_tail_after_last_assistant() {
        let messages = vec![
            Turn::system("instructions"),
            Turn::user("hi"),
            Turn::assistant("hello"),
            Turn::user("what's the weather"),
        ];
        let turns = new_user_turns(&messages);
        assert_eq!(turns, vec![Turn::user("what's the weather")]);
    }

    #[test]
    fn new_user_turns_skips_system_prefix_on_first_call() {
        let messages = vec![Turn::system("instructions"), Turn::user("hi")];
        assert_eq!(new_user_turns(&messages), vec![Turn::user("hi")]);
    }

    #[test]
    fn new_user_turns_empty_when_nothing_new() {
        let messages = vec![Turn::user("hi"), Turn::assistant("hello")];
        assert!(new_user_turns(&messages).is_empty());
    }
}
