//! # lux-core: Foundational Types for Lux Signals
//!
//! The leaf crate of the workspace. It defines the small value types that
//! both the schema registry (`lux-schema`) and the signal envelope
//! (`lux-signal`) agree on.
//!
//! ## Key Types
//!
//! 1. **`SchemaVersion`**: a `major.minor` pair ordered numerically, so
//!    `1.10` outranks `1.9`. Version strings are parsed once at the edge
//!    and never compared as text afterwards.
//!
//! 2. **`Timestamp`**: UTC-only, millisecond precision, rendered with a
//!    `Z` suffix. Inputs with other offsets are normalized on parse.
//!
//! 3. **Identifier newtypes**: `SignalId` and `AgentId` keep signal
//!    identifiers and agent addresses from being mixed up as bare strings.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lux-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod temporal;
pub mod version;

pub use error::CoreError;
pub use identity::{AgentId, SignalId};
pub use temporal::Timestamp;
pub use version::SchemaVersion;
