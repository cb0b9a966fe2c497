//! # Schema Documents
//!
//! A [`SchemaDocument`] is the unit the registry stores: a name, a
//! `major.minor` version, a description, and the parsed root node.
//!
//! Documents are only constructed through [`SchemaDocument::new`] (or the
//! declaration helpers that delegate to it), which runs every
//! registration-time check. A `SchemaDocument` value is therefore always
//! internally consistent, and the validator can assume so.

use std::fmt;
use std::str::FromStr;

use lux_core::SchemaVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DefinitionIssue, SchemaDefinitionError};
use crate::node::{parse_node, NodeKind, SchemaNode};
use crate::validate::{validate, ValidationResult};

/// The registry key of a document: name plus exact version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaRef {
    /// Schema name, e.g. `belief_update`.
    pub name: String,
    /// Schema version.
    pub version: SchemaVersion,
}

impl SchemaRef {
    /// Build a reference from its parts.
    pub fn new(name: impl Into<String>, version: SchemaVersion) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A request for a document: a name and, optionally, an exact version.
///
/// Without a version the registry resolves the highest registered one.
/// Parses from `name` or `name@major.minor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaSelector {
    /// Schema name.
    pub name: String,
    /// Exact version, or `None` for the latest.
    pub version: Option<SchemaVersion>,
}

impl SchemaSelector {
    /// Select the highest registered version of `name`.
    pub fn latest(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Select exactly `name` at `version`.
    pub fn exact(name: impl Into<String>, version: SchemaVersion) -> Self {
        Self {
            name: name.into(),
            version: Some(version),
        }
    }
}

impl From<SchemaRef> for SchemaSelector {
    fn from(r: SchemaRef) -> Self {
        Self::exact(r.name, r.version)
    }
}

impl From<&SchemaRef> for SchemaSelector {
    fn from(r: &SchemaRef) -> Self {
        Self::exact(r.name.clone(), r.version)
    }
}

impl From<&str> for SchemaSelector {
    /// A bare name, selecting the latest version.
    fn from(name: &str) -> Self {
        Self::latest(name)
    }
}

impl FromStr for SchemaSelector {
    type Err = lux_core::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('@') {
            Some((name, version)) => Ok(Self::exact(name, version.parse()?)),
            None => Ok(Self::latest(s)),
        }
    }
}

impl fmt::Display for SchemaSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{v}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// The wire shape of a schema declaration: `{name, version, description, schema}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDeclaration {
    /// Schema name.
    pub name: String,
    /// Version string, `major.minor`.
    pub version: String,
    /// Human-readable description.
    pub description: String,
    /// The JSON schema body.
    pub schema: Value,
}

/// A parsed, checked, versioned schema.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    reference: SchemaRef,
    description: String,
    root: SchemaNode,
    source: Value,
}

impl SchemaDocument {
    /// Parse and check a schema document.
    ///
    /// Every defect is reported, not just the first: blank name or
    /// description, a malformed version, a root that is not an object
    /// schema, and every node-level defect (see [`crate::node`]).
    ///
    /// # Errors
    ///
    /// Returns [`SchemaDefinitionError`] if any check fails.
    pub fn new(
        name: &str,
        version: &str,
        description: &str,
        schema: &Value,
    ) -> Result<Self, SchemaDefinitionError> {
        let mut issues = Vec::new();

        if name.trim().is_empty() {
            issues.push(DefinitionIssue::new("name", "schema name must be a non-empty string"));
        }
        if description.trim().is_empty() {
            issues.push(DefinitionIssue::new(
                "description",
                "schema description must be a non-empty string",
            ));
        }
        let parsed_version = match SchemaVersion::parse(version) {
            Ok(v) => Some(v),
            Err(e) => {
                issues.push(DefinitionIssue::new("version", e.to_string()));
                None
            }
        };

        let root = parse_node(schema, "#", &mut issues);
        if let Some(root) = &root {
            if !matches!(root.kind, NodeKind::Object(_)) {
                issues.push(DefinitionIssue::new(
                    "#",
                    format!("schema root must define an object type, found '{}'", root.kind),
                ));
            }
        }

        match (root, parsed_version) {
            (Some(root), Some(version)) if issues.is_empty() => Ok(Self {
                reference: SchemaRef::new(name, version),
                description: description.to_string(),
                root,
                source: schema.clone(),
            }),
            _ => Err(SchemaDefinitionError::new(format!("{name}@{version}"), issues)),
        }
    }

    /// Build a document from a parsed declaration.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaDefinitionError`] if any check fails.
    pub fn from_declaration(decl: &SchemaDeclaration) -> Result<Self, SchemaDefinitionError> {
        Self::new(&decl.name, &decl.version, &decl.description, &decl.schema)
    }

    /// Build a document from a raw JSON declaration value.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaDefinitionError`] if the value is not a declaration
    /// or if any check fails.
    pub fn from_value(value: &Value) -> Result<Self, SchemaDefinitionError> {
        let decl: SchemaDeclaration = serde_json::from_value(value.clone()).map_err(|e| {
            let name = value.get("name").and_then(Value::as_str).unwrap_or("(unnamed)");
            SchemaDefinitionError::new(
                name,
                vec![DefinitionIssue::new("", format!("malformed declaration: {e}"))],
            )
        })?;
        Self::from_declaration(&decl)
    }

    /// The registry key.
    pub fn reference(&self) -> &SchemaRef {
        &self.reference
    }

    /// The schema name.
    pub fn name(&self) -> &str {
        &self.reference.name
    }

    /// The schema version.
    pub fn version(&self) -> SchemaVersion {
        self.reference.version
    }

    /// The human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The parsed root node.
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// The schema body exactly as declared.
    pub fn schema(&self) -> &Value {
        &self.source
    }

    /// Names listed in the root `required`, in declaration order.
    pub fn required_fields(&self) -> &[String] {
        match &self.root.kind {
            NodeKind::Object(object) => object.required.as_slice(),
            _ => &[],
        }
    }

    /// Validate a payload against the root node.
    pub fn validate(&self, payload: &Value) -> ValidationResult {
        validate(&self.root, payload)
    }

    /// Whether a payload is valid.
    pub fn is_valid(&self, payload: &Value) -> bool {
        self.validate(payload).is_ok()
    }

    /// The declaration this document was built from.
    pub fn to_declaration(&self) -> SchemaDeclaration {
        SchemaDeclaration {
            name: self.reference.name.clone(),
            version: self.reference.version.to_string(),
            description: self.description.clone(),
            schema: self.source.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn basic_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "string"},
                "priority": {"type": "integer", "minimum": 1, "maximum": 5},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["message", "priority"],
            "additionalProperties": false
        })
    }

    #[test]
    fn test_new_document() {
        let doc = SchemaDocument::new("test", "1.0", "Test schema", &basic_schema()).unwrap();
        assert_eq!(doc.name(), "test");
        assert_eq!(doc.version(), SchemaVersion::new(1, 0));
        assert_eq!(doc.description(), "Test schema");
        assert_eq!(doc.schema(), &basic_schema());
        assert_eq!(doc.required_fields(), ["message", "priority"]);
        assert_eq!(doc.reference().to_string(), "test@1.0");
    }

    #[test]
    fn test_blank_fields_rejected_together() {
        let err = SchemaDocument::new("", "", " ", &basic_schema()).unwrap_err();
        let paths: Vec<&str> = err.issues().iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, ["name", "description", "version"]);
    }

    #[test]
    fn test_root_must_be_object() {
        let err = SchemaDocument::new("test", "1.0", "d", &json!({"type": "string"})).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert!(err.issues()[0].message.contains("must define an object type"));
        assert_eq!(err.schema(), "test@1.0");
    }

    #[test]
    fn test_root_must_be_a_json_object() {
        let err = SchemaDocument::new("test", "1.0", "d", &json!("not a dict")).unwrap_err();
        assert!(err.issues()[0].message.contains("must be a JSON object"));
    }

    #[test]
    fn test_validate_helpers() {
        let doc = SchemaDocument::new("test", "1.0", "d", &basic_schema()).unwrap();
        assert!(doc.is_valid(&json!({"message": "test", "priority": 3})));
        let result = doc.validate(&json!({"message": "test"}));
        assert_eq!(result.errors()[0].message, "Required property 'priority' was not present");
    }

    #[test]
    fn test_declaration_roundtrip() {
        let value = json!({
            "name": "wallet_state",
            "version": "1.2",
            "description": "Wallet snapshot",
            "schema": basic_schema()
        });
        let doc = SchemaDocument::from_value(&value).unwrap();
        assert_eq!(serde_json::to_value(doc.to_declaration()).unwrap(), value);
    }

    #[test]
    fn test_malformed_declaration() {
        let err = SchemaDocument::from_value(&json!({
            "name": "x",
            "version": "1.0",
            "schema": {"type": "object"}
        }))
        .unwrap_err();
        assert_eq!(err.schema(), "x");
        assert!(err.issues()[0].message.contains("malformed declaration"));

        let err = SchemaDocument::from_value(&json!({
            "name": "x",
            "version": "1.0",
            "description": "d",
            "schema": {"type": "object"},
            "owner": "someone"
        }))
        .unwrap_err();
        assert!(err.issues()[0].message.contains("unknown field"));
    }

    #[test]
    fn test_selector_parsing() {
        let exact: SchemaSelector = "vital_signs@2.10".parse().unwrap();
        assert_eq!(exact, SchemaSelector::exact("vital_signs", SchemaVersion::new(2, 10)));
        let latest: SchemaSelector = "vital_signs".parse().unwrap();
        assert_eq!(latest, SchemaSelector::latest("vital_signs"));
        assert!("vital_signs@two".parse::<SchemaSelector>().is_err());
        assert_eq!(exact.to_string(), "vital_signs@2.10");
    }
}
