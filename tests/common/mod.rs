//! Shared test helpers: canned collaborators.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;

use sibyl::audio::{SpeechToText, TextToSpeech};
use sibyl::completion::ChatCompletion;
use sibyl::dispatch::{DispatchConfirmation, DispatchRequest, RoomDispatcher};
use sibyl::error::SibylError;
use sibyl::types::Turn;

/// A chat-completion collaborator that returns canned replies and records
/// every transcript it was shown.
pub struct MockCompletion {
    replies: Mutex<Vec<Result<String, String>>>,
    seen: Mutex<Vec<Vec<Turn>>>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply.
    pub fn queue_reply(&self, text: &str) {
        self.replies.lock().unwrap().push(Ok(text.to_string()));
    }

    /// Queue a failure.
    pub fn queue_failure(&self, message: &str) {
        self.replies.lock().unwrap().push(Err(message.to_string()));
    }

    /// Every transcript this collaborator has been called with, in order.
    pub fn transcripts(&self) -> Vec<Vec<Turn>> {
        self.seen.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatCompletion for MockCompletion {
    async fn complete(&self, transcript: &[Turn]) -> Result<String, SibylError> {
        self.seen.lock().unwrap().push(transcript.to_vec());
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            let n = self.seen.lock().unwrap().len();
            return Ok(format!("reply {n}"));
        }
        match replies.remove(0) {
            Ok(text) => Ok(text),
            Err(message) => Err(SibylError::api(500, message)),
        }
    }
}

/// A room dispatcher that records requests and can be told to fail.
pub struct MockDispatcher {
    requests: Mutex<Vec<DispatchRequest>>,
    failure: Mutex<Option<String>>,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn failing(message: &str) -> Self {
        let dispatcher = Self::new();
        *dispatcher.failure.lock().unwrap() = Some(message.to_string());
        dispatcher
    }

    pub fn requests(&self) -> Vec<DispatchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoomDispatcher for MockDispatcher {
    async fn create_dispatch(
        &self,
        request: DispatchRequest,
    ) -> Result<DispatchConfirmation, SibylError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(SibylError::api(503, message));
        }
        Ok(DispatchConfirmation {
            id: "dispatch-1".to_string(),
            agent_name: request.agent_name,
            room: request.room,
        })
    }
}

/// A speech-to-text collaborator returning queued transcripts.
pub struct MockStt {
    transcripts: Mutex<Vec<Result<String, String>>>,
}

impl MockStt {
    pub fn new() -> Self {
        Self {
            transcripts: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_transcript(&self, text: &str) {
        self.transcripts.lock().unwrap().push(Ok(text.to_string()));
    }

    pub fn queue_failure(&self, message: &str) {
        self.transcripts
            .lock()
            .unwrap()
            .push(Err(message.to_string()));
    }
}

#[async_trait]
impl SpeechToText for MockStt {
    async fn transcribe(&self, _audio: &[u8], _sample_rate: u32) -> Result<String, SibylError> {
        let mut transcripts = self.transcripts.lock().unwrap();
        if transcripts.is_empty() {
            return Ok(String::new());
        }
        match transcripts.remove(0) {
            Ok(text) => Ok(text),
            Err(message) => Err(SibylError::Stt(message)),
        }
    }
}

/// A text-to-speech collaborator that encodes the text itself as "audio",
/// so tests can assert on what was spoken.
pub struct MockTts;

#[async_trait]
impl TextToSpeech for MockTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SibylError> {
        Ok(text.as_bytes().to_vec())
    }
}
