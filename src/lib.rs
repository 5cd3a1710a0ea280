//! Sibyl — voice agent session relay.
//!
//! Wires a room-dispatched voice worker to a chat-completion endpoint through
//! a long-lived session object. The relay owns the conversation transcript,
//! forwards each batch of user turns to the completion collaborator, and
//! places a voice worker into a real-time room when the session starts. The
//! worker side assembles the speech pipeline (voice-activity segmentation →
//! speech-to-text → completion → text-to-speech) against the room seam.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sibyl::prelude::*;
//!
//! # async fn example(
//! #     completion: Arc<dyn sibyl::completion::ChatCompletion>,
//! #     dispatcher: Arc<dyn sibyl::dispatch::RoomDispatcher>,
//! # ) -> sibyl::error::Result<()> {
//! let identity = SessionIdentity::new("AgentVoice", "agent-1", "run-1");
//! let relay = SessionRelay::new(identity, completion, dispatcher);
//! let transcript = relay.submit_turns(vec![Turn::user("hi")]).await?;
//! println!("{} turns", transcript.len());
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod completion;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod prelude;
pub mod room;
pub mod server;
pub mod session;
pub mod types;
pub mod util;
pub mod worker;
