//! # Signal Errors

use lux_core::CoreError;
use lux_schema::{SchemaError, SchemaRef, ValidationResult};
use thiserror::Error;

/// Error constructing, serializing, or receiving a signal.
#[derive(Error, Debug)]
pub enum SignalError {
    /// The schema could not be resolved. Lookup misses pass through
    /// unchanged as [`SchemaError::SchemaNotFound`].
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The payload does not conform to its schema.
    #[error(transparent)]
    Validation(#[from] SignalValidationError),

    /// A received envelope is not JSON or lacks required members.
    #[error("malformed signal envelope: {reason}")]
    Envelope {
        /// What was wrong with it.
        reason: String,
    },

    /// JSON serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An envelope member failed to parse as a core value type.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// A payload failed validation against a resolved schema.
///
/// Carries the complete [`ValidationResult`], never just the first error.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("payload does not conform to schema '{schema}' ({} error(s)):\n{result}", result.len())]
pub struct SignalValidationError {
    schema: SchemaRef,
    result: ValidationResult,
}

impl SignalValidationError {
    pub(crate) fn new(schema: SchemaRef, result: ValidationResult) -> Self {
        Self { schema, result }
    }

    /// The schema the payload was checked against.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Every violation found.
    pub fn result(&self) -> &ValidationResult {
        &self.result
    }

    /// Consume the error, returning the full result.
    pub fn into_result(self) -> ValidationResult {
        self.result
    }
}

impl SignalError {
    /// The validation result, if this is a validation failure.
    pub fn validation_result(&self) -> Option<&ValidationResult> {
        match self {
            Self::Validation(e) => Some(e.result()),
            _ => None,
        }
    }
}
