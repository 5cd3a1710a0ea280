//! In-memory registry of live session relays.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::relay::{SessionRelay, VoiceSessionInput};

/// Holds the live relays of one process, keyed by run id. A relay is
/// registered when its session is launched and reclaimed once its run loop
/// exits; nothing survives a restart.
#[derive(Default)]
pub struct SessionHost {
    sessions: Mutex<HashMap<String, Arc<SessionRelay>>>,
}

impl SessionHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live session.
    pub fn get(&self, run_id: &str) -> Option<Arc<SessionRelay>> {
        self.sessions.lock().unwrap().get(run_id).cloned()
    }

    /// Remove a session, returning it if it was live.
    pub fn remove(&self, run_id: &str) -> Option<Arc<SessionRelay>> {
        self.sessions.lock().unwrap().remove(run_id)
    }

    /// Run ids of all live sessions.
    pub fn run_ids(&self) -> Vec<String> {
        self.sessions.lock().unwrap().keys().cloned().collect()
    }

    /// Register a relay and spawn its run loop. The relay stays addressable
    /// until the loop exits, then it is reclaimed.
    pub fn launch(self: &Arc<Self>, relay: Arc<SessionRelay>, input: VoiceSessionInput) {
        let run_id = relay.identity().run_id.clone();
        self.sessions
            .lock()
            .unwrap()
            .insert(run_id.clone(), relay.clone());

        let host = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(error) = relay.run(input).await {
                tracing::error!(%error, run_id, "voice session terminated with failure");
            }
            host.remove(&run_id);
        });
    }
}
