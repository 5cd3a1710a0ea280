//! Dispatch metadata parsing.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Identity triple attached to a dispatch. Every field is optional: the
/// worker proceeds with whatever it can recover.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchMetadata {
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
}

impl DispatchMetadata {
    /// Parse metadata text through an ordered fallback chain: strict JSON,
    /// then single-quote-normalized JSON, then empty metadata. Never fails.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(metadata) => metadata,
            Err(_) => {
                let normalized = raw.replace('\'', "\"");
                match serde_json::from_str(&normalized) {
                    Ok(metadata) => {
                        debug!("metadata parsed after quote normalization");
                        metadata
                    }
                    Err(err) => {
                        warn!(%err, "Normalization failed, using default values");
                        Self::default()
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strict_json() {
        let metadata = DispatchMetadata::parse(
            r#"{"agent_name": "AgentVoice", "agent_id": "123", "run_id": "456"}"#,
        );
        assert_eq!(metadata.agent_name.as_deref(), Some("AgentVoice"));
        assert_eq!(metadata.agent_id.as_deref(), Some("123"));
        assert_eq!(metadata.run_id.as_deref(), Some("456"));
    }

    #[test]
    fn parses_single_quoted_fallback() {
        let metadata = DispatchMetadata::parse("{'agent_name': 'AgentVoice'}");
        assert_eq!(metadata.agent_name.as_deref(), Some("AgentVoice"));
        assert_eq!(metadata.agent_id, None);
        assert_eq!(metadata.run_id, None);
    }

    #[test]
    fn garbage_degrades_to_empty() {
        let metadata = DispatchMetadata::parse("not json at all");
        assert_eq!(metadata, DispatchMetadata::default());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let metadata =
            DispatchMetadata::parse(r#"{"agent_name": "AgentVoice", "extra": [1, 2, 3]}"#);
        assert_eq!(metadata.agent_name.as_deref(), Some("AgentVoice"));
    }
}
