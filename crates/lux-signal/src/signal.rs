//! # Signals
//!
//! A [`Signal`] is a payload that has been checked against a registered
//! schema, stamped with an id and a creation time, and frozen. There is no
//! way to obtain a `Signal` whose payload did not validate: both
//! [`Signal::create`] and [`SignalBuilder::build`] validate first, and
//! [`Signal::from_json`] re-validates whatever arrives on the wire.
//!
//! The payload is copied at construction, so later changes to the caller's
//! value never reach the signal. All accessors are read-only.

use lux_core::{AgentId, SchemaVersion, SignalId, Timestamp};
use lux_schema::{SchemaDocument, SchemaRef, SchemaRegistry, SchemaSelector};
use serde_json::{Map, Value};

use crate::envelope::SignalEnvelope;
use crate::error::{SignalError, SignalValidationError};

/// An immutable, schema-validated signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    id: SignalId,
    schema: SchemaRef,
    payload: Value,
    created_at: Timestamp,
    sender: Option<AgentId>,
    recipient: Option<AgentId>,
    topic: Option<String>,
    metadata: Map<String, Value>,
}

impl Signal {
    /// Resolve a schema, validate `payload` against it, and wrap a copy.
    ///
    /// A selector without a version resolves to the latest registered one.
    ///
    /// # Errors
    ///
    /// - [`SignalError::Schema`] if the schema is not registered.
    /// - [`SignalError::Validation`] with every violation if the payload
    ///   does not conform.
    pub fn create(
        registry: &SchemaRegistry,
        selector: impl Into<SchemaSelector>,
        payload: &Value,
    ) -> Result<Self, SignalError> {
        Self::builder(selector, payload.clone()).build(registry)
    }

    /// Start building a signal with routing metadata.
    pub fn builder(selector: impl Into<SchemaSelector>, payload: Value) -> SignalBuilder {
        SignalBuilder {
            selector: selector.into(),
            payload,
            id: None,
            sender: None,
            recipient: None,
            topic: None,
            metadata: Map::new(),
            created_at: None,
        }
    }

    /// Unique id of this signal.
    pub fn id(&self) -> &SignalId {
        &self.id
    }

    /// The exact schema the payload was validated against.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The validated payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// When the signal was built, in UTC.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Emitting agent, if set.
    pub fn sender(&self) -> Option<&AgentId> {
        self.sender.as_ref()
    }

    /// Addressed agent, if set.
    pub fn recipient(&self) -> Option<&AgentId> {
        self.recipient.as_ref()
    }

    /// Routing topic, if any.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Free-form metadata. Not validated against the schema.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// The wire envelope for this signal.
    pub fn to_envelope(&self) -> SignalEnvelope {
        SignalEnvelope {
            id: self.id.to_string(),
            schema_name: self.schema.name.clone(),
            schema_version: self.schema.version.to_string(),
            payload: self.payload.clone(),
            sender: self.sender.as_ref().map(ToString::to_string),
            recipient: self.recipient.as_ref().map(ToString::to_string),
            timestamp: self.created_at.to_rfc3339(),
            topic: self.topic.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// The envelope as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Serialization`] if serialization fails.
    pub fn to_value(&self) -> Result<Value, SignalError> {
        Ok(serde_json::to_value(self.to_envelope())?)
    }

    /// The envelope as a compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SignalError> {
        Ok(serde_json::to_string(&self.to_envelope())?)
    }

    /// Parse a received envelope and re-validate its payload.
    ///
    /// The exact schema version named in the envelope is used; a receiver
    /// that only has other versions registered rejects the signal.
    ///
    /// # Errors
    ///
    /// - [`SignalError::Envelope`] if `json` is not a well-formed envelope.
    /// - [`SignalError::Core`] if a member fails to parse (version, id,
    ///   agent id, timestamp).
    /// - [`SignalError::Schema`] if the named schema is not registered.
    /// - [`SignalError::Validation`] if the payload no longer conforms.
    pub fn from_json(registry: &SchemaRegistry, json: &str) -> Result<Self, SignalError> {
        let envelope: SignalEnvelope =
            serde_json::from_str(json).map_err(|e| SignalError::Envelope {
                reason: e.to_string(),
            })?;
        Self::from_envelope(registry, envelope)
    }

    /// Restore a signal from an already-parsed envelope.
    ///
    /// # Errors
    ///
    /// As for [`Signal::from_json`], minus the JSON parsing step.
    pub fn from_envelope(
        registry: &SchemaRegistry,
        envelope: SignalEnvelope,
    ) -> Result<Self, SignalError> {
        let version = SchemaVersion::parse(&envelope.schema_version)?;
        let id = SignalId::parse(envelope.id)?;
        let created_at = Timestamp::parse(&envelope.timestamp)?;
        let sender = envelope.sender.map(AgentId::parse).transpose()?;
        let recipient = envelope.recipient.map(AgentId::parse).transpose()?;

        let doc = registry.lookup(&envelope.schema_name, &version)?;
        check_payload(&doc, &envelope.payload)?;

        Ok(Self {
            id,
            schema: doc.reference().clone(),
            payload: envelope.payload,
            created_at,
            sender,
            recipient,
            topic: envelope.topic,
            metadata: envelope.metadata,
        })
    }
}

/// Builder for a [`Signal`] with optional routing metadata.
///
/// Unset fields default to a fresh id, the current time, and no routing.
#[derive(Debug, Clone)]
pub struct SignalBuilder {
    selector: SchemaSelector,
    payload: Value,
    id: Option<SignalId>,
    sender: Option<AgentId>,
    recipient: Option<AgentId>,
    topic: Option<String>,
    metadata: Map<String, Value>,
    created_at: Option<Timestamp>,
}

impl SignalBuilder {
    /// Use a specific id instead of a fresh one.
    pub fn id(mut self, id: SignalId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the emitting agent.
    pub fn sender(mut self, sender: AgentId) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Address the signal to one agent.
    pub fn recipient(mut self, recipient: AgentId) -> Self {
        self.recipient = Some(recipient);
        self
    }

    /// Set the routing topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Replace the metadata map.
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add one metadata entry.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Use a specific creation time instead of now.
    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Resolve the schema, validate, and freeze the signal.
    ///
    /// # Errors
    ///
    /// See [`Signal::create`].
    pub fn build(self, registry: &SchemaRegistry) -> Result<Signal, SignalError> {
        let doc = registry.resolve(&self.selector)?;
        check_payload(&doc, &self.payload)?;

        let signal = Signal {
            id: self.id.unwrap_or_default(),
            schema: doc.reference().clone(),
            payload: self.payload,
            created_at: self.created_at.unwrap_or_else(Timestamp::now),
            sender: self.sender,
            recipient: self.recipient,
            topic: self.topic,
            metadata: self.metadata,
        };
        tracing::debug!(id = %signal.id, schema = %signal.schema, "created signal");
        Ok(signal)
    }
}

fn check_payload(doc: &SchemaDocument, payload: &Value) -> Result<(), SignalValidationError> {
    doc.validate(payload).into_result().map_err(|result| {
        tracing::debug!(
            schema = %doc.reference(),
            errors = result.len(),
            "signal payload rejected"
        );
        SignalValidationError::new(doc.reference().clone(), result)
    })
}
