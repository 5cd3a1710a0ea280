//! The session relay.
//!
//! One relay per conversation/room. It owns the transcript, forwards each
//! batch of user turns to the chat-completion collaborator, and runs the
//! dispatch-then-await lifecycle:
//! `Created → DispatchPending → AwaitingEnd → Ended`.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{error, info};

use crate::completion::ChatCompletion;
use crate::dispatch::{DispatchRequest, RoomDispatcher};
use crate::error::{Result, SibylError};
use crate::types::Turn;

/// Identity triple attached to every dispatch so the voice worker can
/// correlate back to this session. Supplied externally; the relay never
/// invents identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub agent_name: String,
    pub agent_id: String,
    pub run_id: String,
}

impl SessionIdentity {
    pub fn new(
        agent_name: impl Into<String>,
        agent_id: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            agent_id: agent_id.into(),
            run_id: run_id.into(),
        }
    }

    /// Wire form carried in dispatch metadata.
    pub fn metadata_json(&self) -> String {
        serde_json::json!({
            "agent_name": self.agent_name,
            "agent_id": self.agent_id,
            "run_id": self.run_id,
        })
        .to_string()
    }
}

/// Input for starting a voice session. A missing room id falls back to the
/// session's own run id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceSessionInput {
    pub room_id: Option<String>,
}

/// Lifecycle state of a session relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    DispatchPending,
    AwaitingEnd,
    Ended,
}

/// A long-lived, addressable unit of conversation state.
pub struct SessionRelay {
    identity: SessionIdentity,
    completion: Arc<dyn ChatCompletion>,
    dispatcher: Arc<dyn RoomDispatcher>,
    /// Auto-end duration armed once dispatch succeeds; zero disables the
    /// timer and leaves termination purely signal-driven.
    auto_end: Duration,
    transcript: Mutex<Vec<Turn>>,
    ended_tx: watch::Sender<bool>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionRelay {
    pub fn new(
        identity: SessionIdentity,
        completion: Arc<dyn ChatCompletion>,
        dispatcher: Arc<dyn RoomDispatcher>,
    ) -> Self {
        let (ended_tx, _) = watch::channel(false);
        let (state_tx, _) = watch::channel(SessionState::Created);
        Self {
            identity,
            completion,
            dispatcher,
            auto_end: Duration::ZERO,
            transcript: Mutex::new(Vec::new()),
            ended_tx,
            state_tx,
        }
    }

    /// Arm the auto-end timer (racing `signal_end` after dispatch succeeds).
    pub fn with_auto_end(mut self, timeout: Duration) -> Self {
        self.auto_end = timeout;
        self
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Subscribe to lifecycle transitions.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn ended(&self) -> bool {
        *self.ended_tx.borrow()
    }

    /// Snapshot of the transcript.
    pub async fn transcript(&self) -> Vec<Turn> {
        self.transcript.lock().await.clone()
    }

    /// Append user turns, forward the whole transcript to the completion
    /// collaborator, and append its reply. Returns the updated transcript.
    ///
    /// On completion failure the user turns stay appended and no assistant
    /// turn is committed; the error is terminal for this call and nothing is
    /// retried here.
    pub async fn submit_turns(&self, new_turns: Vec<Turn>) -> Result<Vec<Turn>> {
        if new_turns.is_empty() {
            return Err(SibylError::InvalidArgument(
                "submit_turns requires at least one turn".to_string(),
            ));
        }
        if self.ended() {
            return Err(SibylError::InvalidState(
                "Session has ended; no further turns are accepted".to_string(),
            ));
        }

        info!(
            run_id = %self.identity.run_id,
            count = new_turns.len(),
            "received turns"
        );

        // The lock spans the completion call: events against one session are
        // processed strictly one at a time, in arrival order.
        let mut transcript = self.transcript.lock().await;
        transcript.extend(new_turns);

        let reply = self
            .completion
            .complete(&transcript)
            .await
            .map_err(|e| SibylError::Completion(format!("Error during chat completion: {e}")))?;

        transcript.push(Turn::assistant(reply));
        Ok(transcript.clone())
    }

    /// Mark the session as ended. Idempotent: repeated signals are no-ops.
    pub fn signal_end(&self) {
        let already = self.ended_tx.send_replace(true);
        if !already {
            info!(run_id = %self.identity.run_id, "received end");
        }
    }

    /// The session's main behavior, run once per session: dispatch a voice
    /// worker into the room, then suspend until ended.
    pub async fn run(&self, input: VoiceSessionInput) -> Result<()> {
        self.set_state(SessionState::DispatchPending);

        let room = input
            .room_id
            .unwrap_or_else(|| self.identity.run_id.clone());
        let request = DispatchRequest {
            agent_name: self.identity.agent_name.clone(),
            room: room.clone(),
            metadata: self.identity.metadata_json(),
        };

        match self.dispatcher.create_dispatch(request).await {
            Ok(confirmation) => {
                info!(
                    run_id = %self.identity.run_id,
                    room = %room,
                    dispatch_id = %confirmation.id,
                    "voice worker dispatched"
                );
            }
            Err(e) => {
                self.ended_tx.send_replace(true);
                self.set_state(SessionState::Ended);
                let message = format!("Livekit dispatch failed: {e}");
                error!(run_id = %self.identity.run_id, room = %room, "{message}");
                return Err(SibylError::Dispatch(message));
            }
        }

        self.set_state(SessionState::AwaitingEnd);
        self.await_end().await;
        self.set_state(SessionState::Ended);
        Ok(())
    }

    async fn await_end(&self) {
        let mut ended = self.ended_tx.subscribe();
        if self.auto_end.is_zero() {
            wait_for_end(&mut ended).await;
            return;
        }

        tokio::select! {
            _ = wait_for_end(&mut ended) => {}
            _ = tokio::time::sleep(self.auto_end) => {
                info!(
                    run_id = %self.identity.run_id,
                    minutes = self.auto_end.as_secs() / 60,
                    "session auto-ended after timeout"
                );
                self.ended_tx.send_replace(true);
            }
        }
    }

    fn set_state(&self, state: SessionState) {
        self.state_tx.send_replace(state);
    }
}

async fn wait_for_end(ended: &mut watch::Receiver<bool>) {
    loop {
        if *ended.borrow_and_update() {
            return;
        }
        if ended.changed().await.is_err() {
            return;
        }
    }
}
