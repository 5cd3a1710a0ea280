//! Session relay: transcript ownership, turn events, and lifecycle.

pub mod host;
pub mod relay;

pub use host::SessionHost;
pub use relay::{SessionIdentity, SessionRelay, SessionState, VoiceSessionInput};
