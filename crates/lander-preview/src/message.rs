//! Messages exchanged between the editor and rendering contexts.

use serde::{Deserialize, Serialize};

use lander_config::ConfigSnapshot;

/// Version stamped on every outgoing message.
///
/// Receivers drop messages carrying any other version instead of guessing at
/// a configuration shape they may not understand.
pub const PROTOCOL_VERSION: u32 = 1;

/// Errors that can occur in the preview protocol.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("Failed to encode preview message: {0}")]
    EncodeError(String),

    #[error("Failed to decode preview message: {0}")]
    DecodeError(String),

    #[error("Unsupported protocol version {found} (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Message from unexpected origin: {0}")]
    OriginRejected(String),

    #[error("Rendering context is gone")]
    Closed,
}

/// Payload variants. `CONFIG_UPDATE` is the only kind defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PreviewPayload {
    /// Full replacement of the rendered configuration. Always a complete
    /// snapshot so the receiver shows exactly what the editor holds.
    #[serde(rename = "CONFIG_UPDATE")]
    ConfigUpdate { config: ConfigSnapshot },
}

/// A versioned preview message.
///
/// On the wire: `{"version":1,"kind":"CONFIG_UPDATE","config":{...}}`.
/// Messages without a version field count as version 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewMessage {
    #[serde(default)]
    pub version: u32,
    #[serde(flatten)]
    pub payload: PreviewPayload,
}

impl PreviewMessage {
    /// A `CONFIG_UPDATE` carrying the complete `config`.
    pub fn config_update(config: &ConfigSnapshot) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            payload: PreviewPayload::ConfigUpdate {
                config: config.clone(),
            },
        }
    }

    pub fn encode(&self) -> Result<String, PreviewError> {
        serde_json::to_string(self).map_err(|e| PreviewError::EncodeError(e.to_string()))
    }

    /// Check the protocol version, then decode.
    ///
    /// The version is read before the payload so a message from a newer
    /// editor is reported as a version mismatch rather than a shape error.
    pub fn decode(data: &str) -> Result<Self, PreviewError> {
        let value: serde_json::Value =
            serde_json::from_str(data).map_err(|e| PreviewError::DecodeError(e.to_string()))?;

        let found = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0);
        if found != PROTOCOL_VERSION {
            return Err(PreviewError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                found,
            });
        }

        serde_json::from_value(value).map_err(|e| PreviewError::DecodeError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_tagged_versioned_message() {
        let msg = PreviewMessage::config_update(&ConfigSnapshot::default());
        let json: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();

        assert_eq!(json["kind"], "CONFIG_UPDATE");
        assert_eq!(json["version"], PROTOCOL_VERSION);
        assert_eq!(json["config"]["header"]["brandName"], "LandingBuilder");
    }

    #[test]
    fn decodes_what_it_encodes() {
        let msg = PreviewMessage::config_update(&ConfigSnapshot::default());
        let decoded = PreviewMessage::decode(&msg.encode().unwrap()).unwrap();

        assert_eq!(decoded, msg);
    }

    #[test]
    fn unversioned_messages_are_rejected() {
        let result = PreviewMessage::decode(r#"{"kind":"CONFIG_UPDATE","config":{}}"#);

        assert!(matches!(
            result,
            Err(PreviewError::VersionMismatch { found: 0, .. })
        ));
    }

    #[test]
    fn cleared_optional_fields_survive_the_wire() {
        let mut config = ConfigSnapshot::default();
        config.header.cta_href = None;
        config.header.show_editor_link = None;

        let msg = PreviewMessage::config_update(&config);
        let PreviewPayload::ConfigUpdate { config: received } =
            PreviewMessage::decode(&msg.encode().unwrap()).unwrap().payload;

        assert_eq!(received, config);
    }

    #[test]
    fn partial_payloads_fail_to_decode() {
        let result =
            PreviewMessage::decode(r#"{"version":1,"kind":"CONFIG_UPDATE","config":{"hero":{}}}"#);
        assert!(matches!(result, Err(PreviewError::DecodeError(_))));
    }

    #[test]
    fn unknown_kinds_fail_to_decode() {
        let result = PreviewMessage::decode(r#"{"version":1,"kind":"RELOAD"}"#);
        assert!(matches!(result, Err(PreviewError::DecodeError(_))));
    }
}
