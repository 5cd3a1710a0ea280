//! Convenience re-exports for common use.

pub use crate::completion::{ChatCompletion, OpenAiCompatClient};
pub use crate::config::SibylConfig;
pub use crate::dispatch::{DispatchRequest, LiveKitDispatcher, RoomDispatcher};
pub use crate::error::{Result, SibylError};
pub use crate::session::{SessionHost, SessionIdentity, SessionRelay, SessionState, VoiceSessionInput};
pub use crate::types::{Role, Turn};
pub use crate::worker::{DispatchMetadata, JobContext, VoicePipeline, WorkerOptions};
