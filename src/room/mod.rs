//! Real-time room seam.
//!
//! The concrete RTC transport belongs to the room platform; this crate
//! consumes it through the [`RoomSession`] trait. [`LoopbackRoom`] is an
//! in-process implementation used by tests and demos.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use livekit_api::access_token::{AccessToken, VideoGrants};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::SibylError;

/// One chunk of mono PCM audio.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// A remote participant in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub identity: String,
    pub name: Option<String>,
}

/// A live connection to one room.
#[async_trait]
pub trait RoomSession: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Suspend until the first remote participant has joined.
    async fn wait_for_participant(&self) -> Result<Participant, SibylError>;

    /// Inbound participant audio. Yields until the room session ends.
    fn audio_input(&self) -> BoxStream<'static, AudioFrame>;

    /// Play synthesized audio into the room.
    async fn publish_audio(&self, audio: &[u8]) -> Result<(), SibylError>;
}

/// Connects a worker to a named room.
#[async_trait]
pub trait RoomConnector: Send + Sync {
    async fn connect(&self, room: &str) -> Result<Arc<dyn RoomSession>, SibylError>;
}

/// Mint a join token for a room participant.
pub fn join_token(
    api_key: &str,
    api_secret: &str,
    room: &str,
    identity: &str,
    ttl: std::time::Duration,
) -> Result<String, SibylError> {
    if api_key.trim().is_empty() || api_secret.trim().is_empty() {
        return Err(SibylError::Authentication(
            "Missing room platform API key/secret for join token".to_string(),
        ));
    }
    AccessToken::with_api_key(api_key, api_secret)
        .with_identity(identity)
        .with_name(identity)
        .with_grants(VideoGrants {
            room_join: true,
            room: room.to_string(),
            can_publish: true,
            can_subscribe: true,
            can_publish_data: true,
            ..Default::default()
        })
        .with_ttl(ttl)
        .to_jwt()
        .map_err(|e| SibylError::Authentication(format!("Failed to mint join token: {e}")))
}

/// In-process room: audio in via a channel, published audio collected for
/// inspection. Stands in for the platform transport in tests and demos.
#[derive(Debug)]
pub struct LoopbackRoom {
    name: String,
    participant_tx: watch::Sender<Option<Participant>>,
    audio_tx: Mutex<Option<mpsc::UnboundedSender<AudioFrame>>>,
    audio_rx: Mutex<Option<mpsc::UnboundedReceiver<AudioFrame>>>,
    published: Mutex<Vec<Vec<u8>>>,
}

impl LoopbackRoom {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let (participant_tx, _) = watch::channel(None);
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            name: name.into(),
            participant_tx,
            audio_tx: Mutex::new(Some(audio_tx)),
            audio_rx: Mutex::new(Some(audio_rx)),
            published: Mutex::new(Vec::new()),
        })
    }

    /// Simulate a participant joining the room.
    pub fn join(&self, identity: impl Into<String>) {
        let participant = Participant {
            identity: identity.into(),
            name: None,
        };
        self.participant_tx.send_replace(Some(participant));
    }

    /// Feed participant audio into the room.
    pub fn speak(&self, frame: AudioFrame) {
        if let Some(tx) = self.audio_tx.lock().unwrap().as_ref() {
            let _ = tx.send(frame);
        }
    }

    /// Close the inbound audio stream (participant left).
    pub fn end_audio(&self) {
        // dropping the only sender closes the channel
        self.audio_tx.lock().unwrap().take();
    }

    /// Audio published into the room so far, in playback order.
    pub fn published(&self) -> Vec<Vec<u8>> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoomSession for LoopbackRoom {
    fn name(&self) -> &str {
        &self.name
    }

    async fn wait_for_participant(&self) -> Result<Participant, SibylError> {
        let mut rx = self.participant_tx.subscribe();
        loop {
            if let Some(participant) = rx.borrow_and_update().clone() {
                return Ok(participant);
            }
            if rx.changed().await.is_err() {
                return Err(SibylError::InvalidState(
                    "Room closed before a participant joined".to_string(),
                ));
            }
        }
    }

    fn audio_input(&self) -> BoxStream<'static, AudioFrame> {
        match self.audio_rx.lock().unwrap().take() {
            Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
            None => futures::stream::empty().boxed(),
        }
    }

    async fn publish_audio(&self, audio: &[u8]) -> Result<(), SibylError> {
        self.published.lock().unwrap().push(audio.to_vec());
        Ok(())
    }
}

/// Connector handing out pre-built loopback rooms.
#[derive(Default)]
pub struct LoopbackConnector {
    rooms: Mutex<std::collections::HashMap<String, Arc<LoopbackRoom>>>,
}

impl LoopbackConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, room: Arc<LoopbackRoom>) {
        self.rooms
            .lock()
            .unwrap()
            .insert(room.name().to_string(), room);
    }
}

#[async_trait]
impl RoomConnector for LoopbackConnector {
    async fn connect(&self, room: &str) -> Result<Arc<dyn RoomSession>, SibylError> {
        self.rooms
            .lock()
            .unwrap()
            .get(room)
            .cloned()
            .map(|session| session as Arc<dyn RoomSession>)
            .ok_or_else(|| SibylError::InvalidState(format!("Unknown room: {room}")))
    }
}
