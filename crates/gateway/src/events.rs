use serde::{Deserialize, Serialize};

/// Wire format for both directions: `{ "event": ..., "payload": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFrame {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl EventFrame {
    pub fn new(event: &str, payload: serde_json::Value) -> Self {
        Self {
            event: event.to_string(),
            payload,
        }
    }

    /// Serialized frame, or None if the payload cannot be encoded.
    pub fn encode(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}

/// First client frame on a fresh connection: the handshake credential.
#[derive(Debug, Deserialize)]
pub struct HandshakePayload {
    pub token: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips() {
        let frame = EventFrame::new("messageReceived", serde_json::json!({"id": "m1"}));
        let encoded = frame.encode().unwrap();
        let decoded: EventFrame = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.event, "messageReceived");
        assert_eq!(decoded.payload["id"], "m1");
    }

    #[test]
    fn missing_payload_defaults_to_null() {
        let decoded: EventFrame = serde_json::from_str(r#"{"event":"typing"}"#).unwrap();
        assert!(decoded.payload.is_null());
    }
}
