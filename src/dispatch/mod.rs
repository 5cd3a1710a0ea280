//! Room-dispatch collaborator.
//!
//! Asks the real-time room platform to place a voice worker into a room. Any
//! failure here is terminal from the relay's point of view; there is no
//! retry at this level.

use std::time::Duration;

use async_trait::async_trait;
use livekit_api::access_token::{AccessToken, VideoGrants};
use serde::Deserialize;
use tracing::debug;

use crate::error::SibylError;
use crate::http::{bearer_headers, shared_client, status_to_error, trim_trailing_slash};
use crate::util::timeout::with_timeout;

const CREATE_DISPATCH_PATH: &str = "/twirp/livekit.AgentDispatchService/CreateDispatch";

/// Lifetime of the admin token minted per dispatch call.
const DISPATCH_TOKEN_TTL: Duration = Duration::from_secs(60);

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound dispatch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    /// Worker/agent type name the platform routes the job to.
    pub agent_name: String,
    pub room: String,
    /// Session identity triple serialized as text, handed to the worker.
    pub metadata: String,
}

/// Confirmation returned by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfirmation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub room: String,
}

/// Trait for room-dispatch collaborators.
#[async_trait]
pub trait RoomDispatcher: Send + Sync {
    async fn create_dispatch(
        &self,
        request: DispatchRequest,
    ) -> Result<DispatchConfirmation, SibylError>;
}

/// HTTP client for the platform's agent-dispatch service, authenticated with
/// a short-lived admin token minted from the configured API key/secret.
#[derive(Debug, Clone)]
pub struct LiveKitDispatcher {
    api_url: String,
    api_key: String,
    api_secret: String,
    timeout: Duration,
}

impl LiveKitDispatcher {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn admin_token(&self, room: &str) -> Result<String, SibylError> {
        if self.api_key.trim().is_empty() || self.api_secret.trim().is_empty() {
            return Err(SibylError::Authentication(
                "Missing room platform API key/secret for dispatch".to_string(),
            ));
        }
        AccessToken::with_api_key(&self.api_key, &self.api_secret)
            .with_grants(VideoGrants {
                room_admin: true,
                room: room.to_string(),
                ..Default::default()
            })
            .with_ttl(DISPATCH_TOKEN_TTL)
            .to_jwt()
            .map_err(|e| SibylError::Authentication(format!("Failed to mint dispatch token: {e}")))
    }
}

#[async_trait]
impl RoomDispatcher for LiveKitDispatcher {
    async fn create_dispatch(
        &self,
        request: DispatchRequest,
    ) -> Result<DispatchConfirmation, SibylError> {
        if self.api_url.trim().is_empty() {
            return Err(SibylError::Configuration(
                "Room platform API URL is not configured".to_string(),
            ));
        }

        let token = self.admin_token(&request.room)?;
        let url = format!(
            "{}{CREATE_DISPATCH_PATH}",
            trim_trailing_slash(&self.api_url)
        );
        let body = serde_json::json!({
            "agent_name": request.agent_name,
            "room": request.room,
            "metadata": request.metadata,
        });

        debug!(room = %request.room, agent_name = %request.agent_name, "creating dispatch");

        with_timeout(self.timeout, async {
            let response = shared_client()
                .post(url)
                .headers(bearer_headers(&token))
                .json(&body)
                .send()
                .await?;

            let status = response.status().as_u16();
            if status != 200 {
                let body_text = response.text().await.unwrap_or_default();
                return Err(status_to_error(status, &body_text));
            }

            let confirmation: DispatchConfirmation = response.json().await?;
            Ok(confirmation)
        })
        .await
    }
}
