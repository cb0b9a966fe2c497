//! # Declaration Loader
//!
//! Reads schema declarations (`{name, version, description, schema}`) from
//! disk. `.yaml`/`.yml` files are parsed as YAML and converted to JSON
//! values; `.json` files are parsed directly. Either way the result goes
//! through [`SchemaDocument::from_value`], so file-loaded documents get the
//! same checks as ones defined in code.
//!
//! YAML declarations should quote the version (`version: "1.0"`): an
//! unquoted `1.10` is a float and would silently become `1.1`.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::document::SchemaDocument;
use crate::error::SchemaError;
use crate::registry::SchemaRegistry;

/// Read and check one declaration file.
///
/// # Errors
///
/// Returns [`SchemaError::Load`] if the file cannot be read or parsed, and
/// [`SchemaError::Definition`] if the declaration fails its checks.
pub fn load_declaration(path: impl AsRef<Path>) -> Result<SchemaDocument, SchemaError> {
    let path = path.as_ref();
    let load_error = |reason: String| SchemaError::Load {
        path: path.display().to_string(),
        reason,
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| load_error(format!("cannot read file: {e}")))?;

    let value = if is_yaml(path) {
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
            .map_err(|e| load_error(format!("invalid YAML: {e}")))?;
        yaml_to_json_value(&yaml)
            .map_err(|e| load_error(format!("YAML-to-JSON conversion failed: {e}")))?
    } else {
        serde_json::from_str(&content).map_err(|e| load_error(format!("invalid JSON: {e}")))?
    };

    Ok(SchemaDocument::from_value(&value)?)
}

impl SchemaRegistry {
    /// Register every declaration file in `dir`.
    ///
    /// Only `.json`, `.yaml` and `.yml` files directly inside `dir` are
    /// considered; subdirectories are not descended into. Files are loaded
    /// in filename order and the first failure aborts the load, leaving the
    /// documents registered before it in place.
    ///
    /// Returns the number of documents registered.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Load`] if the directory or a file cannot be
    /// read, [`SchemaError::Definition`] for a bad declaration, and
    /// [`SchemaError::DuplicateSchema`] if a key is already taken.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<usize, SchemaError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| SchemaError::Load {
            path: dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_declaration(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let doc = load_declaration(path)?;
            self.register(doc)?;
        }

        tracing::info!(dir = %dir.display(), count = paths.len(), "loaded schema declarations");
        Ok(paths.len())
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

fn is_yaml(path: &Path) -> bool {
    matches!(extension(path), "yaml" | "yml")
}

fn is_declaration(path: &Path) -> bool {
    is_yaml(path) || extension(path) == "json"
}

/// Convert a parsed YAML declaration to the equivalent JSON value.
///
/// Numeric and boolean map keys are stringified. Anything without a JSON
/// counterpart, YAML tags included, is rejected with the path of the
/// offending node (`$.schema.properties.due`).
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    let mut path = String::from("$");
    convert(yaml, &mut path)
}

fn convert(yaml: &serde_yaml::Value, path: &mut String) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;

    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Bool(b) => Ok(Value::Bool(*b)),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| format!("{path}: {n} has no JSON representation"))
            }
        }
        Yaml::String(s) => Ok(Value::String(s.clone())),
        Yaml::Sequence(seq) => {
            let mut items = Vec::with_capacity(seq.len());
            for (i, item) in seq.iter().enumerate() {
                let mark = path.len();
                path.push_str(&format!("[{i}]"));
                items.push(convert(item, path)?);
                path.truncate(mark);
            }
            Ok(Value::Array(items))
        }
        Yaml::Mapping(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    Yaml::String(s) => s.clone(),
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    _ => return Err(format!("{path}: map keys must be scalars")),
                };
                let mark = path.len();
                path.push('.');
                path.push_str(&key);
                let value = convert(v, path)?;
                path.truncate(mark);
                object.insert(key, value);
            }
            Ok(Value::Object(object))
        }
        Yaml::Tagged(tagged) => Err(format!(
            "{path}: YAML tag {} is not allowed in declarations",
            tagged.tag
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lux_core::SchemaVersion;
    use serde_json::json;

    const YAML_DECL: &str = r#"
name: task_assignment
version: "1.1"
description: Assigns a task to an agent
schema:
  type: object
  properties:
    task_id:
      type: string
    priority:
      type: integer
      minimum: 1
      maximum: 5
    due:
      type: string
      format: date-time
  required: [task_id, priority]
  additionalProperties: false
"#;

    fn json_decl(name: &str, version: &str) -> String {
        json!({
            "name": name,
            "version": version,
            "description": "Test declaration",
            "schema": {
                "type": "object",
                "properties": {"value": {"type": "number"}},
                "required": ["value"]
            }
        })
        .to_string()
    }

    #[test]
    fn test_load_yaml_declaration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.yaml");
        std::fs::write(&path, YAML_DECL).unwrap();

        let doc = load_declaration(&path).unwrap();
        assert_eq!(doc.name(), "task_assignment");
        assert_eq!(doc.version(), SchemaVersion::new(1, 1));
        assert_eq!(doc.required_fields(), ["task_id", "priority"]);
        assert!(doc.is_valid(&json!({"task_id": "t-1", "priority": 2})));
        assert!(!doc.is_valid(&json!({"task_id": "t-1", "priority": 9})));
    }

    #[test]
    fn test_yaml_preserves_property_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.yml");
        std::fs::write(&path, YAML_DECL).unwrap();

        let doc = load_declaration(&path).unwrap();
        let keys: Vec<&String> = doc.schema()["properties"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, ["task_id", "priority", "due"]);
    }

    #[test]
    fn test_load_json_declaration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reading.json");
        std::fs::write(&path, json_decl("reading", "2.0")).unwrap();
        let doc = load_declaration(&path).unwrap();
        assert_eq!(doc.reference().to_string(), "reading@2.0");
    }

    #[test]
    fn test_unreadable_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_declaration(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, SchemaError::Load { .. }));

        let bad_json = dir.path().join("bad.json");
        std::fs::write(&bad_json, "{ not json").unwrap();
        match load_declaration(&bad_json).unwrap_err() {
            SchemaError::Load { reason, .. } => assert!(reason.contains("invalid JSON")),
            other => panic!("expected Load, got {other}"),
        }

        let bad_yaml = dir.path().join("bad.yaml");
        std::fs::write(&bad_yaml, "name: [unclosed").unwrap();
        match load_declaration(&bad_yaml).unwrap_err() {
            SchemaError::Load { reason, .. } => assert!(reason.contains("invalid YAML")),
            other => panic!("expected Load, got {other}"),
        }
    }

    #[test]
    fn test_bad_declaration_is_definition_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad_schema.json");
        std::fs::write(
            &path,
            json!({
                "name": "broken",
                "version": "1.0",
                "description": "d",
                "schema": {"type": "object", "required": ["ghost"]}
            })
            .to_string(),
        )
        .unwrap();
        assert!(matches!(
            load_declaration(&path).unwrap_err(),
            SchemaError::Definition(_)
        ));
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), json_decl("reading", "1.0")).unwrap();
        std::fs::write(dir.path().join("b.json"), json_decl("reading", "1.1")).unwrap();
        std::fs::write(dir.path().join("c.yaml"), YAML_DECL).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/d.json"), json_decl("nested", "1.0")).unwrap();

        let registry = SchemaRegistry::new();
        assert_eq!(registry.load_dir(dir.path()).unwrap(), 3);
        assert_eq!(registry.names(), ["reading", "task_assignment"]);
        assert_eq!(
            registry.lookup_latest("reading").unwrap().version(),
            SchemaVersion::new(1, 1)
        );
    }

    #[test]
    fn test_load_dir_stops_at_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), json_decl("reading", "1.0")).unwrap();
        std::fs::write(dir.path().join("b.json"), json_decl("reading", "1.0")).unwrap();

        let registry = SchemaRegistry::new();
        let err = registry.load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateSchema { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.load_dir(dir.path().join("nope")),
            Err(SchemaError::Load { .. })
        ));
    }

    #[test]
    fn test_yaml_conversion_stringifies_scalar_keys() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: one\ntrue: yes\nt: [3, 4.5]").unwrap();
        let json = yaml_to_json_value(&yaml).unwrap();
        assert_eq!(json, json!({"1": "one", "true": "yes", "t": [3, 4.5]}));
    }

    #[test]
    fn test_yaml_tags_rejected_with_path() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("schema:\n  enum: [a, !custom b]").unwrap();
        let reason = yaml_to_json_value(&yaml).unwrap_err();
        assert!(reason.starts_with("$.schema.enum[1]:"), "{reason}");
        assert!(reason.contains("!custom"), "{reason}");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tagged.yaml");
        std::fs::write(&path, YAML_DECL.replace("type: integer", "type: !kind integer")).unwrap();
        match load_declaration(&path).unwrap_err() {
            SchemaError::Load { reason, .. } => {
                assert!(reason.contains("$.schema.properties.priority.type"), "{reason}");
            }
            other => panic!("expected Load, got {other}"),
        }
    }

    #[test]
    fn test_yaml_non_scalar_key_rejected() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("a:\n  [x, y]: 1").unwrap();
        let reason = yaml_to_json_value(&yaml).unwrap_err();
        assert_eq!(reason, "$.a: map keys must be scalars");
    }
}
