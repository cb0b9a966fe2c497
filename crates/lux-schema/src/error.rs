//! # Schema Errors
//!
//! Registry and definition errors. These are programmer errors: they are
//! fatal to the call that raised them and are never retried. Data-level
//! validation failures are not errors in this sense; they are collected
//! into a [`ValidationResult`](crate::ValidationResult) instead.

use std::fmt;

use lux_core::SchemaVersion;
use thiserror::Error;

/// Error raised by the schema registry or the document loader.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A document with the same name and version is already registered.
    #[error("schema '{name}' version {version} is already registered")]
    DuplicateSchema {
        /// Schema name.
        name: String,
        /// Schema version.
        version: SchemaVersion,
    },

    /// No registered document matches the requested name (and version).
    #[error("schema not found: {}", describe_lookup(.name, .version))]
    SchemaNotFound {
        /// Requested schema name.
        name: String,
        /// Requested version, or `None` when the latest was requested.
        version: Option<SchemaVersion>,
    },

    /// The document is internally inconsistent and was not registered.
    #[error(transparent)]
    Definition(#[from] SchemaDefinitionError),

    /// A declaration file could not be read or parsed.
    #[error("schema load error for '{path}': {reason}")]
    Load {
        /// Path of the offending file.
        path: String,
        /// Why it could not be loaded.
        reason: String,
    },

    /// IO error while scanning a declaration directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_lookup(name: &str, version: &Option<SchemaVersion>) -> String {
    match version {
        Some(v) => format!("'{name}' version {v}"),
        None => format!("'{name}' (any version)"),
    }
}

/// A schema document failed its registration-time consistency checks.
///
/// Carries every defect found, not just the first.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid schema definition '{schema}':\n{}", render_issues(.issues))]
pub struct SchemaDefinitionError {
    schema: String,
    issues: Vec<DefinitionIssue>,
}

impl SchemaDefinitionError {
    pub(crate) fn new(schema: impl Into<String>, issues: Vec<DefinitionIssue>) -> Self {
        Self {
            schema: schema.into(),
            issues,
        }
    }

    /// Identifies the offending document (`name@version`, or `(inline)`).
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Every defect found, in discovery order.
    pub fn issues(&self) -> &[DefinitionIssue] {
        &self.issues
    }
}

/// A single defect in a schema definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionIssue {
    /// JSON Pointer into the schema (`#/properties/a/format`), or the
    /// declaration field name (`name`, `version`, `description`).
    pub path: String,
    /// Human-readable description of the defect.
    pub message: String,
}

impl DefinitionIssue {
    pub(crate) fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}: {}", self.path, self.message)
    }
}

fn render_issues(issues: &[DefinitionIssue]) -> String {
    issues
        .iter()
        .map(DefinitionIssue::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let exact = SchemaError::SchemaNotFound {
            name: "belief_update".to_string(),
            version: Some(SchemaVersion::new(1, 2)),
        };
        assert_eq!(exact.to_string(), "schema not found: 'belief_update' version 1.2");

        let latest = SchemaError::SchemaNotFound {
            name: "belief_update".to_string(),
            version: None,
        };
        assert!(latest.to_string().contains("any version"));
    }

    #[test]
    fn test_definition_error_lists_all_issues() {
        let err = SchemaDefinitionError::new(
            "wallet_state@1.0",
            vec![
                DefinitionIssue::new("#/required", "required property 'x' is not declared"),
                DefinitionIssue::new("#/properties/y/format", "unsupported format \"json\""),
            ],
        );
        let rendered = err.to_string();
        assert!(rendered.starts_with("invalid schema definition 'wallet_state@1.0'"));
        assert!(rendered.contains("  #/required: required property 'x'"));
        assert!(rendered.contains("  #/properties/y/format: unsupported format"));
        assert_eq!(err.issues().len(), 2);
    }
}
