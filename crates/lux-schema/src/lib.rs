//! # lux-schema: Signal Schemas, Registry & Validation
//!
//! Defines the schema documents that describe agent signal payloads, the
//! registry that stores them, and the validator that checks payloads
//! against them.
//!
//! ## Schema Documents (`document`, `node`)
//!
//! A declaration `{name, version, description, schema}` is parsed once into
//! a [`SchemaDocument`] whose root is a typed [`SchemaNode`] tree. Parsing
//! is also checking: unknown keywords, unsupported formats, invalid
//! patterns, inverted bounds and undeclared `required` names are all
//! rejected up front with a [`SchemaDefinitionError`] listing every defect.
//!
//! ## Registry (`registry`, `loader`)
//!
//! [`SchemaRegistry`] is an explicitly owned, cloneable, thread-safe store
//! keyed by `(name, version)`. Duplicate keys are rejected; "latest" means
//! the numerically highest version. Declarations can be loaded from JSON or
//! YAML files with [`load_declaration`] and [`SchemaRegistry::load_dir`].
//!
//! ## Validation (`validate`)
//!
//! [`validate`] walks a payload against a node and collects every
//! violation into a [`ValidationResult`]. It never stops at the first
//! error, and results are deterministic: object keys are visited in the
//! order the schema declares them.
//!
//! ## Crate Policy
//!
//! - Depends only on `lux-core` internally.
//! - Schema problems are programmer errors ([`SchemaError`]); payload
//!   problems are data ([`ValidationResult`]). The two never mix.

pub mod document;
pub mod error;
pub mod format;
pub mod loader;
pub mod node;
pub mod registry;
pub mod validate;

pub use document::{SchemaDeclaration, SchemaDocument, SchemaRef, SchemaSelector};
pub use error::{DefinitionIssue, SchemaDefinitionError, SchemaError};
pub use format::StringFormat;
pub use loader::load_declaration;
pub use node::{
    AdditionalProperties, ArraySchema, NodeKind, NumericBounds, ObjectSchema, Pattern,
    SchemaNode, StringSchema,
};
pub use registry::SchemaRegistry;
pub use validate::{validate, validate_at, ErrorKind, ValidationError, ValidationResult};

pub use lux_core::SchemaVersion;
