//! # Wire Envelope
//!
//! The JSON form of a signal as it travels between agents:
//!
//! ```json
//! {
//!   "id": "0b6f1c9e-...",
//!   "schema_name": "belief_update",
//!   "schema_version": "1.0",
//!   "payload": { ... },
//!   "sender": "agent-a",
//!   "recipient": null,
//!   "timestamp": "2026-01-15T12:00:00.000Z",
//!   "topic": null,
//!   "metadata": {}
//! }
//! ```
//!
//! Members are plain strings here. Turning them back into typed values
//! (and re-validating the payload) is [`Signal::from_envelope`]'s job, so
//! an envelope can be inspected or forwarded without a registry at hand.
//!
//! [`Signal::from_envelope`]: crate::Signal::from_envelope

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The serialized form of a [`Signal`](crate::Signal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEnvelope {
    pub id: String,
    pub schema_name: String,
    pub schema_version: String,
    pub payload: Value,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    pub timestamp: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_members_default() {
        let env: SignalEnvelope = serde_json::from_value(json!({
            "id": "abc",
            "schema_name": "ping",
            "schema_version": "1.0",
            "payload": {},
            "timestamp": "2026-01-15T12:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(env.sender, None);
        assert_eq!(env.topic, None);
        assert!(env.metadata.is_empty());
    }

    #[test]
    fn test_absent_members_serialize_as_null() {
        let env = SignalEnvelope {
            id: "abc".to_string(),
            schema_name: "ping".to_string(),
            schema_version: "1.0".to_string(),
            payload: json!({}),
            sender: None,
            recipient: None,
            timestamp: "2026-01-15T12:00:00.000Z".to_string(),
            topic: None,
            metadata: Map::new(),
        };
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["sender"], Value::Null);
        assert_eq!(value["metadata"], json!({}));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(
            keys,
            [
                "id",
                "schema_name",
                "schema_version",
                "payload",
                "sender",
                "recipient",
                "timestamp",
                "topic",
                "metadata"
            ]
        );
    }

    #[test]
    fn test_missing_required_member() {
        let err = serde_json::from_value::<SignalEnvelope>(json!({
            "id": "abc",
            "schema_name": "ping",
            "payload": {},
            "timestamp": "2026-01-15T12:00:00.000Z"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("schema_version"));
    }
}
