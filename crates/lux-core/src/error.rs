//! # Error Types
//!
//! Errors raised while constructing the core value types. Each variant
//! carries the rejected input so callers can report it verbatim.

use thiserror::Error;

/// Error constructing a core value type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A schema version string was not of the form `major.minor`.
    #[error("invalid schema version {input:?}: {reason}")]
    InvalidVersion {
        /// The rejected version string.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A timestamp string was not valid RFC 3339.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected timestamp string.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An identifier was empty or otherwise malformed.
    #[error("invalid {kind} identifier {input:?}: {reason}")]
    InvalidIdentifier {
        /// Identifier namespace (e.g. "signal", "agent").
        kind: &'static str,
        /// The rejected identifier.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}
