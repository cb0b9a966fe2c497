//! # Payload Validation
//!
//! Recursive validation of JSON payloads against a parsed [`SchemaNode`].
//!
//! ## Error Collection
//!
//! Validation never stops at the first violation. Every node of the
//! payload is visited and every violation is recorded with the path of
//! the offending value (`$.criteria[2].weight`), so a single call reports
//! everything a producer has to fix.
//!
//! ## Determinism
//!
//! Errors come out in a fixed order: at each object, missing `required`
//! names (declaration order), then declared properties (declaration
//! order), then undeclared keys (payload order); array elements in index
//! order. Validating the same pair twice yields identical results.
//!
//! ## Purity
//!
//! `validate` reads the schema and payload and writes only to its own
//! accumulator. It is safe to call from any number of threads at once.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::node::{
    compare_numbers, AdditionalProperties, ArraySchema, NodeKind, NumericBounds, ObjectSchema,
    SchemaNode, StringSchema,
};

/// Path of the payload root.
pub const ROOT_PATH: &str = "$";

/// Category of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The value's runtime type does not match the declared type.
    TypeMismatch,
    /// A `required` property is absent.
    MissingRequiredField,
    /// A property not in `properties` under `additionalProperties: false`.
    UnexpectedProperty,
    /// The value is not one of the `enum` literals.
    EnumViolation,
    /// A number lies outside `minimum`/`maximum`.
    RangeViolation,
    /// An array length lies outside `minItems`/`maxItems`.
    LengthViolation,
    /// A string does not match `pattern`.
    PatternMismatch,
    /// A string does not conform to `format`.
    FormatViolation,
}

impl ErrorKind {
    /// Stable name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::MissingRequiredField => "MissingRequiredField",
            ErrorKind::UnexpectedProperty => "UnexpectedProperty",
            ErrorKind::EnumViolation => "EnumViolation",
            ErrorKind::RangeViolation => "RangeViolation",
            ErrorKind::LengthViolation => "LengthViolation",
            ErrorKind::PatternMismatch => "PatternMismatch",
            ErrorKind::FormatViolation => "FormatViolation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single violation found in a payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Location of the offending value (`$`, `$.a`, `$.items[3].id`).
    pub path: String,
    /// Category of the violation.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// The offending value, when there is one. Absent for missing fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {} [{}]: {}", self.path, self.kind, self.message)
    }
}

/// The outcome of validating one payload: every violation, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// True when no violation was found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// All violations, in deterministic order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True when there are no violations.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Violations of a single kind.
    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// Consume the result, returning the inner list.
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// `Ok(())` when valid, otherwise the result itself as the error.
    pub fn into_result(self) -> Result<(), ValidationResult> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

/// Validate `value` against `node`, reporting paths from the root `$`.
pub fn validate(node: &SchemaNode, value: &Value) -> ValidationResult {
    validate_at(node, value, ROOT_PATH)
}

/// Validate `value` against `node`, reporting paths relative to `path`.
pub fn validate_at(node: &SchemaNode, value: &Value, path: &str) -> ValidationResult {
    let mut walker = Walker {
        path: path.to_string(),
        errors: Vec::new(),
    };
    walker.visit(node, value);
    ValidationResult {
        errors: walker.errors,
    }
}

/// Recursion state: the current path and the error accumulator.
struct Walker {
    path: String,
    errors: Vec<ValidationError>,
}

impl Walker {
    fn visit(&mut self, node: &SchemaNode, value: &Value) {
        let type_ok = node.kind.accepts_type(value);
        if !type_ok {
            self.emit(
                ErrorKind::TypeMismatch,
                format!("'{}' is not of type '{}'", render(value), node.kind.name()),
                Some(value.clone()),
            );
        }

        if let Some(allowed) = &node.enum_values {
            if !allowed.iter().any(|literal| json_equal(literal, value)) {
                self.emit(
                    ErrorKind::EnumViolation,
                    format!(
                        "'{}' is not one of {}",
                        render(value),
                        Value::Array(allowed.clone())
                    ),
                    Some(value.clone()),
                );
            }
        }

        if !type_ok {
            return;
        }

        match (&node.kind, value) {
            (NodeKind::Object(object), Value::Object(map)) => self.visit_object(object, map),
            (NodeKind::Array(array), Value::Array(items)) => self.visit_array(array, items),
            (NodeKind::String(string), Value::String(s)) => self.visit_string(string, s),
            (NodeKind::Number(bounds) | NodeKind::Integer(bounds), Value::Number(n)) => {
                self.visit_number(bounds, n)
            }
            _ => {}
        }
    }

    fn visit_object(&mut self, object: &ObjectSchema, map: &Map<String, Value>) {
        for name in &object.required {
            if !map.contains_key(name) {
                let mark = self.enter_key(name);
                self.emit(
                    ErrorKind::MissingRequiredField,
                    format!("Required property '{name}' was not present"),
                    None,
                );
                self.leave(mark);
            }
        }

        for (name, sub) in &object.properties {
            if let Some(child) = map.get(name) {
                let mark = self.enter_key(name);
                self.visit(sub, child);
                self.leave(mark);
            }
        }

        for (key, child) in map {
            if object.property(key).is_some() {
                continue;
            }
            match &object.additional {
                AdditionalProperties::Allow => {}
                AdditionalProperties::Deny => {
                    let mark = self.enter_key(key);
                    self.emit(
                        ErrorKind::UnexpectedProperty,
                        format!("Additional properties are not allowed ('{key}' was unexpected)"),
                        Some(child.clone()),
                    );
                    self.leave(mark);
                }
                AdditionalProperties::Schema(sub) => {
                    let mark = self.enter_key(key);
                    self.visit(sub, child);
                    self.leave(mark);
                }
            }
        }
    }

    fn visit_array(&mut self, array: &ArraySchema, items: &[Value]) {
        if let Some(sub) = &array.items {
            for (i, item) in items.iter().enumerate() {
                let mark = self.path.len();
                self.path.push_str(&format!("[{i}]"));
                self.visit(sub, item);
                self.leave(mark);
            }
        }

        let count = items.len() as u64;
        if let Some(min) = array.min_items {
            if count < min {
                self.emit(
                    ErrorKind::LengthViolation,
                    format!(
                        "array has {count} {}, fewer than the minimum of {min}",
                        plural(count)
                    ),
                    Some(Value::from(count)),
                );
            }
        }
        if let Some(max) = array.max_items {
            if count > max {
                self.emit(
                    ErrorKind::LengthViolation,
                    format!(
                        "array has {count} {}, more than the maximum of {max}",
                        plural(count)
                    ),
                    Some(Value::from(count)),
                );
            }
        }
    }

    fn visit_string(&mut self, string: &StringSchema, s: &str) {
        if let Some(pattern) = &string.pattern {
            if !pattern.is_match(s) {
                self.emit(
                    ErrorKind::PatternMismatch,
                    format!("'{s}' does not match pattern '{}'", pattern.as_str()),
                    Some(Value::String(s.to_string())),
                );
            }
        }
        if let Some(format) = &string.format {
            if !format.matches(s) {
                self.emit(
                    ErrorKind::FormatViolation,
                    format!("'{s}' is not a valid '{format}'"),
                    Some(Value::String(s.to_string())),
                );
            }
        }
    }

    fn visit_number(&mut self, bounds: &NumericBounds, n: &Number) {
        if let Some(min) = &bounds.minimum {
            if compare_numbers(n, min) == Some(Ordering::Less) {
                self.emit(
                    ErrorKind::RangeViolation,
                    format!("'{n}' is less than the minimum of {min}"),
                    Some(Value::Number(n.clone())),
                );
            }
        }
        if let Some(max) = &bounds.maximum {
            if compare_numbers(n, max) == Some(Ordering::Greater) {
                self.emit(
                    ErrorKind::RangeViolation,
                    format!("'{n}' is greater than the maximum of {max}"),
                    Some(Value::Number(n.clone())),
                );
            }
        }
    }

    /// Append an object key to the path, returning the length to restore.
    fn enter_key(&mut self, key: &str) -> usize {
        let mark = self.path.len();
        push_key(&mut self.path, key);
        mark
    }

    fn leave(&mut self, mark: usize) {
        self.path.truncate(mark);
    }

    fn emit(&mut self, kind: ErrorKind, message: String, value: Option<Value>) {
        self.errors.push(ValidationError {
            path: self.path.clone(),
            kind,
            message,
            value,
        });
    }
}

/// Append `key` to `path` as `.key`, or as `["key"]` when it is not a
/// plain identifier.
fn push_key(path: &mut String, key: &str) {
    let plain = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        path.push('.');
        path.push_str(key);
    } else {
        path.push('[');
        path.push_str(&Value::String(key.to_string()).to_string());
        path.push(']');
    }
}

/// Deep equality where numbers compare by value, so `1` equals `1.0`.
fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Render a value for an error message: strings unquoted, everything
/// else as compact JSON, long renderings shortened.
fn render(value: &Value) -> String {
    const LIMIT: usize = 80;
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() <= LIMIT {
        return text;
    }
    let mut short: String = text.chars().take(LIMIT).collect();
    short.push('…');
    short
}

fn plural(count: u64) -> &'static str {
    if count == 1 {
        "item"
    } else {
        "items"
    }
}
