//! # Schema Registry
//!
//! The explicitly owned store of known schema documents, keyed by name and
//! version. The application creates one at startup and hands clones of it
//! to whatever needs to register or resolve schemas. There is no global
//! instance.
//!
//! ## Concurrency
//!
//! Clones share one map behind a `parking_lot::RwLock`. Registration takes
//! the write lock for the check-and-insert, so two threads registering the
//! same key produce exactly one success. Lookups take the read lock only
//! long enough to clone an `Arc<SchemaDocument>`; validation then runs
//! without holding any lock.
//!
//! The map is append-only: documents are never replaced or removed.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use lux_core::SchemaVersion;
use parking_lot::RwLock;
use serde_json::Value;

use crate::document::{SchemaDocument, SchemaRef, SchemaSelector};
use crate::error::SchemaError;

type VersionMap = BTreeMap<SchemaVersion, Arc<SchemaDocument>>;

/// Thread-safe, cloneable store of schema documents.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Arc<RwLock<BTreeMap<String, VersionMap>>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a checked document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateSchema`] if a document with the same
    /// name and version is already present, even if it is identical.
    pub fn register(&self, doc: SchemaDocument) -> Result<Arc<SchemaDocument>, SchemaError> {
        let mut schemas = self.schemas.write();
        let versions = schemas.entry(doc.name().to_string()).or_default();
        match versions.entry(doc.version()) {
            Entry::Occupied(_) => {
                tracing::warn!(
                    schema = doc.name(),
                    version = %doc.version(),
                    "rejected duplicate schema registration"
                );
                Err(SchemaError::DuplicateSchema {
                    name: doc.name().to_string(),
                    version: doc.version(),
                })
            }
            Entry::Vacant(slot) => {
                let doc = Arc::new(doc);
                slot.insert(Arc::clone(&doc));
                tracing::debug!(
                    schema = doc.name(),
                    version = %doc.version(),
                    "registered schema"
                );
                Ok(doc)
            }
        }
    }

    /// Parse, check, and register a schema in one step.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Definition`] if the document fails its checks,
    /// or [`SchemaError::DuplicateSchema`] if the key is taken.
    pub fn define(
        &self,
        name: &str,
        version: &str,
        description: &str,
        schema: &Value,
    ) -> Result<Arc<SchemaDocument>, SchemaError> {
        let doc = SchemaDocument::new(name, version, description, schema).map_err(|e| {
            tracing::warn!(schema = name, version, issues = e.issues().len(), "rejected schema definition");
            e
        })?;
        self.register(doc)
    }

    /// Look up an exact name and version.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::SchemaNotFound`] on a miss.
    pub fn lookup(
        &self,
        name: &str,
        version: &SchemaVersion,
    ) -> Result<Arc<SchemaDocument>, SchemaError> {
        self.schemas
            .read()
            .get(name)
            .and_then(|versions| versions.get(version))
            .cloned()
            .ok_or_else(|| SchemaError::SchemaNotFound {
                name: name.to_string(),
                version: Some(*version),
            })
    }

    /// Look up the highest registered version of `name`.
    ///
    /// Versions compare numerically, so `1.10` wins over `1.9`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::SchemaNotFound`] if no version is registered.
    pub fn lookup_latest(&self, name: &str) -> Result<Arc<SchemaDocument>, SchemaError> {
        self.schemas
            .read()
            .get(name)
            .and_then(|versions| versions.values().next_back())
            .cloned()
            .ok_or_else(|| SchemaError::SchemaNotFound {
                name: name.to_string(),
                version: None,
            })
    }

    /// Resolve a selector: exact when it names a version, latest otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::SchemaNotFound`] on a miss.
    pub fn resolve(&self, selector: &SchemaSelector) -> Result<Arc<SchemaDocument>, SchemaError> {
        match &selector.version {
            Some(version) => self.lookup(&selector.name, version),
            None => self.lookup_latest(&selector.name),
        }
    }

    /// Whether an exact key is registered.
    pub fn contains(&self, reference: &SchemaRef) -> bool {
        self.schemas
            .read()
            .get(&reference.name)
            .is_some_and(|versions| versions.contains_key(&reference.version))
    }

    /// Total number of registered documents across all names and versions.
    pub fn len(&self) -> usize {
        self.schemas.read().values().map(BTreeMap::len).sum()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered schema names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.schemas.read().keys().cloned().collect()
    }

    /// Registered versions of `name`, ascending. Empty if unknown.
    pub fn versions(&self, name: &str) -> Vec<SchemaVersion> {
        self.schemas
            .read()
            .get(name)
            .map(|versions| versions.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every registered document, sorted by name then version.
    pub fn documents(&self) -> Vec<Arc<SchemaDocument>> {
        self.schemas
            .read()
            .values()
            .flat_map(|versions| versions.values().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {"value": {"type": "number"}},
            "required": ["value"]
        })
    }

    fn define(registry: &SchemaRegistry, name: &str, version: &str) -> Arc<SchemaDocument> {
        registry.define(name, version, "test schema", &schema()).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = SchemaRegistry::new();
        assert!(registry.is_empty());
        let doc = define(&registry, "vital_signs", "1.0");
        let found = registry.lookup("vital_signs", &SchemaVersion::new(1, 0)).unwrap();
        assert!(Arc::ptr_eq(&doc, &found));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(doc.reference()));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = SchemaRegistry::new();
        define(&registry, "vital_signs", "1.0");
        let err = registry
            .define("vital_signs", "1.0", "test schema", &schema())
            .unwrap_err();
        match err {
            SchemaError::DuplicateSchema { name, version } => {
                assert_eq!(name, "vital_signs");
                assert_eq!(version, SchemaVersion::new(1, 0));
            }
            other => panic!("expected DuplicateSchema, got {other}"),
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_miss() {
        let registry = SchemaRegistry::new();
        define(&registry, "vital_signs", "1.0");
        assert!(matches!(
            registry.lookup("vital_signs", &SchemaVersion::new(2, 0)),
            Err(SchemaError::SchemaNotFound { version: Some(_), .. })
        ));
        assert!(matches!(
            registry.lookup("unknown", &SchemaVersion::new(1, 0)),
            Err(SchemaError::SchemaNotFound { .. })
        ));
        assert!(matches!(
            registry.lookup_latest("unknown"),
            Err(SchemaError::SchemaNotFound { version: None, .. })
        ));
    }

    #[test]
    fn test_latest_is_numeric() {
        let registry = SchemaRegistry::new();
        define(&registry, "belief_update", "1.9");
        define(&registry, "belief_update", "1.10");
        define(&registry, "belief_update", "1.2");
        let latest = registry.lookup_latest("belief_update").unwrap();
        assert_eq!(latest.version(), SchemaVersion::new(1, 10));
        assert_eq!(
            registry.versions("belief_update"),
            [SchemaVersion::new(1, 2), SchemaVersion::new(1, 9), SchemaVersion::new(1, 10)]
        );
    }

    #[test]
    fn test_resolve_selector() {
        let registry = SchemaRegistry::new();
        define(&registry, "task", "1.0");
        define(&registry, "task", "2.0");
        let exact = registry
            .resolve(&SchemaSelector::exact("task", SchemaVersion::new(1, 0)))
            .unwrap();
        assert_eq!(exact.version(), SchemaVersion::new(1, 0));
        let latest = registry.resolve(&"task".into()).unwrap();
        assert_eq!(latest.version(), SchemaVersion::new(2, 0));
    }

    #[test]
    fn test_definition_errors_surface_through_define() {
        let registry = SchemaRegistry::new();
        let err = registry
            .define("broken", "1.0", "d", &json!({"type": "object", "required": ["x"]}))
            .unwrap_err();
        assert!(matches!(err, SchemaError::Definition(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_listing_is_sorted() {
        let registry = SchemaRegistry::new();
        define(&registry, "zeta", "1.0");
        define(&registry, "alpha", "2.0");
        define(&registry, "alpha", "1.0");
        assert_eq!(registry.names(), ["alpha", "zeta"]);
        let keys: Vec<String> = registry
            .documents()
            .iter()
            .map(|d| d.reference().to_string())
            .collect();
        assert_eq!(keys, ["alpha@1.0", "alpha@2.0", "zeta@1.0"]);
    }

    #[test]
    fn test_clones_share_storage() {
        let registry = SchemaRegistry::new();
        let handle = registry.clone();
        define(&handle, "shared", "1.0");
        assert!(registry.lookup_latest("shared").is_ok());
    }

    #[test]
    fn test_separate_registries_are_isolated() {
        let a = SchemaRegistry::new();
        let b = SchemaRegistry::new();
        define(&a, "only_in_a", "1.0");
        assert!(b.lookup_latest("only_in_a").is_err());
    }

    #[test]
    fn test_concurrent_duplicate_registration_has_one_winner() {
        let registry = SchemaRegistry::new();
        let successes: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let registry = registry.clone();
                    scope.spawn(move || {
                        registry
                            .define("race", "1.0", "contended key", &schema())
                            .is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });
        assert_eq!(successes, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_lookups_and_validation() {
        let registry = SchemaRegistry::new();
        define(&registry, "reading", "1.0");
        std::thread::scope(|scope| {
            for i in 0..8 {
                let registry = registry.clone();
                scope.spawn(move || {
                    let doc = registry.lookup_latest("reading").unwrap();
                    let ok = doc.validate(&json!({"value": i}));
                    let bad = doc.validate(&json!({"value": "nope"}));
                    assert!(ok.is_ok());
                    assert_eq!(bad.len(), 1);
                });
            }
        });
    }
}
