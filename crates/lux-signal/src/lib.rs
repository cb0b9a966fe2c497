//! # lux-signal: Validated Signals Between Agents
//!
//! A signal is the unit of communication between Lux agents: a JSON payload
//! bound to a versioned schema, plus routing metadata. This crate builds
//! signals through a [`SchemaRegistry`](lux_schema::SchemaRegistry) so that
//! every [`Signal`] in existence has a payload that conforms to its schema.
//!
//! ```ignore
//! let registry = SchemaRegistry::new();
//! registry.load_dir("schemas/")?;
//! let signal = Signal::builder("belief_update", payload)
//!     .sender(AgentId::parse("analyst")?)
//!     .build(&registry)?;
//! let wire = signal.to_json()?;
//! ```
//!
//! ## Crate Policy
//!
//! - Depends on `lux-core` and `lux-schema` only.
//! - Signals are immutable once built.
//! - Received envelopes are re-validated; a payload is never trusted
//!   because it once validated somewhere else.

pub mod envelope;
pub mod error;
pub mod signal;

pub use envelope::SignalEnvelope;
pub use error::{SignalError, SignalValidationError};
pub use signal::{Signal, SignalBuilder};
