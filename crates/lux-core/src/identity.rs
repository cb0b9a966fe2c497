//! # Identifier Newtypes
//!
//! Signals carry two kinds of identifiers: their own unique id and the
//! addresses of the agents exchanging them. Wrapping both keeps a sender
//! address from being passed where a signal id is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Unique identifier of a signal.
///
/// Fresh ids are random UUIDs. Ids received from other agents are kept
/// verbatim, since peers are not required to use UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(String);

impl SignalId {
    /// Generate a new random signal identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIdentifier`] if `id` is empty or blank.
    pub fn parse(id: impl Into<String>) -> Result<Self, CoreError> {
        non_blank("signal", id.into()).map(Self)
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SignalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of an agent sending or receiving signals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Wrap an agent address.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIdentifier`] if `id` is empty or blank.
    pub fn parse(id: impl Into<String>) -> Result<Self, CoreError> {
        non_blank("agent", id.into()).map(Self)
    }

    /// Borrow the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn non_blank(kind: &'static str, id: String) -> Result<String, CoreError> {
    if id.trim().is_empty() {
        return Err(CoreError::InvalidIdentifier {
            kind,
            input: id,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_ids_are_unique() {
        assert_ne!(SignalId::new(), SignalId::new());
    }

    #[test]
    fn test_signal_id_is_uuid() {
        let id = SignalId::new();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_custom_signal_id_kept_verbatim() {
        let id = SignalId::parse("custom-id").unwrap();
        assert_eq!(id.as_str(), "custom-id");
    }

    #[test]
    fn test_blank_identifiers_rejected() {
        assert!(SignalId::parse("").is_err());
        assert!(AgentId::parse("   ").is_err());
        match AgentId::parse("") {
            Err(CoreError::InvalidIdentifier { kind, .. }) => assert_eq!(kind, "agent"),
            other => panic!("expected InvalidIdentifier, got {other:?}"),
        }
    }

    #[test]
    fn test_serde_transparent() {
        let agent = AgentId::parse("agent-1").unwrap();
        assert_eq!(serde_json::to_string(&agent).unwrap(), "\"agent-1\"");
    }
}
