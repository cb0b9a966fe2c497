//! # Schema Nodes
//!
//! A schema document is parsed once into a tree of [`SchemaNode`]s. Each
//! node is a tagged variant over the seven JSON kinds, so the validator
//! matches on a closed enum instead of re-reading raw JSON keywords on
//! every call.
//!
//! ## Accepted Keywords
//!
//! Exactly `type`, `properties`, `required`, `items`, `enum`, `minimum`,
//! `maximum`, `minItems`, `maxItems`, `pattern`, `format` and
//! `additionalProperties`, plus the annotations `description` and `title`
//! which are read past. Anything else is a definition defect.
//!
//! ## Definition Checks
//!
//! The parser is the registration-time gate. It reports every defect it
//! finds, each tagged with a JSON Pointer into the schema (`#/properties/a`):
//!
//! - unknown keywords, and keywords that do not apply to the declared type;
//! - `required` names missing from the sibling `properties`;
//! - unsupported `format` values and patterns that do not compile;
//! - `minimum > maximum` and `minItems > maxItems`.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::error::{DefinitionIssue, SchemaDefinitionError};
use crate::format::StringFormat;

const KEYWORDS: &[&str] = &[
    "type",
    "properties",
    "required",
    "items",
    "enum",
    "minimum",
    "maximum",
    "minItems",
    "maxItems",
    "pattern",
    "format",
    "additionalProperties",
];

const ANNOTATIONS: &[&str] = &["description", "title"];

/// One node of a parsed schema.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    /// The declared kind and its kind-specific constraints.
    pub kind: NodeKind,
    /// Allowed literals. When present a value must equal one of them,
    /// independently of the kind checks.
    pub enum_values: Option<Vec<Value>>,
}

/// The declared `type` of a node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// `"object"`
    Object(ObjectSchema),
    /// `"array"`
    Array(ArraySchema),
    /// `"string"`
    String(StringSchema),
    /// `"number"`, accepts integral and fractional values.
    Number(NumericBounds),
    /// `"integer"`, rejects values with a fractional part.
    Integer(NumericBounds),
    /// `"boolean"`
    Boolean,
    /// `"null"`
    Null,
}

/// Constraints of an `object` node.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    /// Declared properties, in declaration order.
    pub properties: Vec<(String, SchemaNode)>,
    /// Required property names, in declaration order.
    pub required: Vec<String>,
    /// Policy for keys not listed in `properties`.
    pub additional: AdditionalProperties,
}

impl ObjectSchema {
    /// Look up a declared property by name.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, node)| node)
    }
}

/// The `additionalProperties` policy of an object node.
#[derive(Debug, Clone, Default)]
pub enum AdditionalProperties {
    /// `true` or absent: undeclared keys are accepted unchecked.
    #[default]
    Allow,
    /// `false`: undeclared keys are violations.
    Deny,
    /// A schema every undeclared value must satisfy.
    Schema(Box<SchemaNode>),
}

/// Constraints of an `array` node.
#[derive(Debug, Clone, Default)]
pub struct ArraySchema {
    /// Schema applied to every element.
    pub items: Option<Box<SchemaNode>>,
    /// Inclusive lower bound on the element count.
    pub min_items: Option<u64>,
    /// Inclusive upper bound on the element count.
    pub max_items: Option<u64>,
}

/// Constraints of a `string` node.
#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    /// Regex the whole string must match.
    pub pattern: Option<Pattern>,
    /// Required string format.
    pub format: Option<StringFormat>,
}

/// Inclusive bounds of a `number` or `integer` node.
///
/// Bounds keep the JSON number as written so integer bounds beyond 2^53
/// compare exactly (see [`compare_numbers`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericBounds {
    /// Inclusive minimum.
    pub minimum: Option<Number>,
    /// Inclusive maximum.
    pub maximum: Option<Number>,
}

/// A compiled `pattern`, matched against the whole string.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile `source` for full-string matching.
    ///
    /// # Errors
    ///
    /// Returns the regex compiler's error if `source` is not a valid pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as written in the schema.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the whole of `s` matches.
    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

impl NodeKind {
    /// The `type` keyword value for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Object(_) => "object",
            NodeKind::Array(_) => "array",
            NodeKind::String(_) => "string",
            NodeKind::Number(_) => "number",
            NodeKind::Integer(_) => "integer",
            NodeKind::Boolean => "boolean",
            NodeKind::Null => "null",
        }
    }

    /// Whether `value` has the runtime type this kind requires.
    pub fn accepts_type(&self, value: &Value) -> bool {
        match (self, value) {
            (NodeKind::Object(_), Value::Object(_))
            | (NodeKind::Array(_), Value::Array(_))
            | (NodeKind::String(_), Value::String(_))
            | (NodeKind::Number(_), Value::Number(_))
            | (NodeKind::Boolean, Value::Bool(_))
            | (NodeKind::Null, Value::Null) => true,
            (NodeKind::Integer(_), Value::Number(n)) => is_integral(n),
            _ => false,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl SchemaNode {
    /// Parse a standalone schema node, reporting every definition defect.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaDefinitionError`] listing all defects found in the tree.
    pub fn parse(schema: &Value) -> Result<Self, SchemaDefinitionError> {
        let mut issues = Vec::new();
        let node = parse_node(schema, "#", &mut issues);
        match node {
            Some(node) if issues.is_empty() => Ok(node),
            _ => Err(SchemaDefinitionError::new("(inline)", issues)),
        }
    }

    /// A node of the given kind with no enum restriction.
    pub fn of(kind: NodeKind) -> Self {
        Self {
            kind,
            enum_values: None,
        }
    }
}

/// Whether a JSON number has no fractional part.
///
/// Integral floats such as `3.0` count as integers, matching JSON Schema.
pub(crate) fn is_integral(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// Order two JSON numbers by value.
///
/// Two integers compare exactly, whatever their magnitude or sign. Only
/// when one side has a fractional part are both widened to `f64`.
pub fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    let exact = |n: &Number| {
        n.as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
    };
    if let (Some(x), Some(y)) = (exact(a), exact(b)) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Parse the node at `path`, appending defects to `issues`.
///
/// Returns `None` only when the node is too malformed to have a kind.
pub(crate) fn parse_node(
    value: &Value,
    path: &str,
    issues: &mut Vec<DefinitionIssue>,
) -> Option<SchemaNode> {
    let Value::Object(map) = value else {
        issues.push(DefinitionIssue::new(path, "schema node must be a JSON object"));
        return None;
    };

    for key in map.keys() {
        if !KEYWORDS.contains(&key.as_str()) && !ANNOTATIONS.contains(&key.as_str()) {
            issues.push(DefinitionIssue::new(
                path,
                format!("unsupported keyword '{key}'"),
            ));
        }
    }

    let type_name = match map.get("type") {
        Some(Value::String(t)) => t.as_str(),
        Some(other) => {
            issues.push(DefinitionIssue::new(
                path,
                format!("'type' must be a string, found {other}"),
            ));
            return None;
        }
        None => {
            issues.push(DefinitionIssue::new(path, "missing required keyword 'type'"));
            return None;
        }
    };

    let applicable: &[&str] = match type_name {
        "object" => &["properties", "required", "additionalProperties"],
        "array" => &["items", "minItems", "maxItems"],
        "string" => &["pattern", "format"],
        "number" | "integer" => &["minimum", "maximum"],
        "boolean" | "null" => &[],
        other => {
            issues.push(DefinitionIssue::new(
                path,
                format!(
                    "unsupported type '{other}' (expected one of object, array, string, \
                     number, integer, boolean, null)"
                ),
            ));
            return None;
        }
    };

    for key in map.keys() {
        let key = key.as_str();
        let kind_specific = KEYWORDS.contains(&key) && key != "type" && key != "enum";
        if kind_specific && !applicable.contains(&key) {
            issues.push(DefinitionIssue::new(
                path,
                format!("keyword '{key}' does not apply to type '{type_name}'"),
            ));
        }
    }

    let enum_values = match map.get("enum") {
        None => None,
        Some(Value::Array(values)) if !values.is_empty() => Some(values.clone()),
        Some(_) => {
            issues.push(DefinitionIssue::new(
                &format!("{path}/enum"),
                "'enum' must be a non-empty array",
            ));
            None
        }
    };

    let kind = match type_name {
        "object" => NodeKind::Object(parse_object(map, path, issues)),
        "array" => NodeKind::Array(parse_array(map, path, issues)),
        "string" => NodeKind::String(parse_string(map, path, issues)),
        "number" => NodeKind::Number(parse_bounds(map, path, issues)),
        "integer" => NodeKind::Integer(parse_bounds(map, path, issues)),
        "boolean" => NodeKind::Boolean,
        _ => NodeKind::Null,
    };

    Some(SchemaNode { kind, enum_values })
}

fn parse_object(
    map: &Map<String, Value>,
    path: &str,
    issues: &mut Vec<DefinitionIssue>,
) -> ObjectSchema {
    let mut object = ObjectSchema::default();

    match map.get("properties") {
        None => {}
        Some(Value::Object(props)) => {
            for (name, sub) in props {
                let sub_path = format!("{path}/properties/{}", escape_pointer(name));
                if let Some(node) = parse_node(sub, &sub_path, issues) {
                    object.properties.push((name.clone(), node));
                }
            }
        }
        Some(_) => issues.push(DefinitionIssue::new(
            &format!("{path}/properties"),
            "'properties' must be an object",
        )),
    }

    match map.get("required") {
        None => {}
        Some(Value::Array(names)) => {
            let required_path = format!("{path}/required");
            let declared: HashSet<&str> = match map.get("properties") {
                Some(Value::Object(props)) => props.keys().map(String::as_str).collect(),
                _ => HashSet::new(),
            };
            let mut seen = HashSet::new();
            for (i, name) in names.iter().enumerate() {
                let Value::String(name) = name else {
                    issues.push(DefinitionIssue::new(
                        &format!("{required_path}/{i}"),
                        "required entries must be strings",
                    ));
                    continue;
                };
                if !seen.insert(name.as_str()) {
                    issues.push(DefinitionIssue::new(
                        &required_path,
                        format!("'{name}' is listed more than once"),
                    ));
                    continue;
                }
                if !declared.contains(name.as_str()) {
                    issues.push(DefinitionIssue::new(
                        &required_path,
                        format!("required property '{name}' is not declared in 'properties'"),
                    ));
                }
                object.required.push(name.clone());
            }
        }
        Some(_) => issues.push(DefinitionIssue::new(
            &format!("{path}/required"),
            "'required' must be an array of strings",
        )),
    }

    object.additional = match map.get("additionalProperties") {
        None | Some(Value::Bool(true)) => AdditionalProperties::Allow,
        Some(Value::Bool(false)) => AdditionalProperties::Deny,
        Some(sub @ Value::Object(_)) => {
            let sub_path = format!("{path}/additionalProperties");
            parse_node(sub, &sub_path, issues)
                .map(|node| AdditionalProperties::Schema(Box::new(node)))
                .unwrap_or_default()
        }
        Some(_) => {
            issues.push(DefinitionIssue::new(
                &format!("{path}/additionalProperties"),
                "'additionalProperties' must be a boolean or a schema",
            ));
            AdditionalProperties::Allow
        }
    };

    object
}

fn parse_array(
    map: &Map<String, Value>,
    path: &str,
    issues: &mut Vec<DefinitionIssue>,
) -> ArraySchema {
    let items = map.get("items").and_then(|sub| {
        parse_node(sub, &format!("{path}/items"), issues).map(Box::new)
    });
    let min_items = count_keyword(map, "minItems", path, issues);
    let max_items = count_keyword(map, "maxItems", path, issues);

    if let (Some(min), Some(max)) = (min_items, max_items) {
        if min > max {
            issues.push(DefinitionIssue::new(
                path,
                format!("minItems ({min}) is greater than maxItems ({max})"),
            ));
        }
    }

    ArraySchema {
        items,
        min_items,
        max_items,
    }
}

fn parse_string(
    map: &Map<String, Value>,
    path: &str,
    issues: &mut Vec<DefinitionIssue>,
) -> StringSchema {
    let pattern = match map.get("pattern") {
        None => None,
        Some(Value::String(source)) => match Pattern::new(source) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                issues.push(DefinitionIssue::new(
                    &format!("{path}/pattern"),
                    format!("pattern {source:?} does not compile: {e}"),
                ));
                None
            }
        },
        Some(_) => {
            issues.push(DefinitionIssue::new(
                &format!("{path}/pattern"),
                "'pattern' must be a string",
            ));
            None
        }
    };

    let format = match map.get("format") {
        None => None,
        Some(Value::String(name)) => match name.parse::<StringFormat>() {
            Ok(format) => Some(format),
            Err(e) => {
                issues.push(DefinitionIssue::new(&format!("{path}/format"), e.to_string()));
                None
            }
        },
        Some(_) => {
            issues.push(DefinitionIssue::new(
                &format!("{path}/format"),
                "'format' must be a string",
            ));
            None
        }
    };

    StringSchema { pattern, format }
}

fn parse_bounds(
    map: &Map<String, Value>,
    path: &str,
    issues: &mut Vec<DefinitionIssue>,
) -> NumericBounds {
    let mut bound = |keyword: &str| match map.get(keyword) {
        None => None,
        Some(Value::Number(n)) => Some(n.clone()),
        Some(_) => {
            issues.push(DefinitionIssue::new(
                &format!("{path}/{keyword}"),
                format!("'{keyword}' must be a number"),
            ));
            None
        }
    };
    let bounds = NumericBounds {
        minimum: bound("minimum"),
        maximum: bound("maximum"),
    };

    if let (Some(min), Some(max)) = (&bounds.minimum, &bounds.maximum) {
        if compare_numbers(min, max) == Some(Ordering::Greater) {
            issues.push(DefinitionIssue::new(
                path,
                format!("minimum ({min}) is greater than maximum ({max})"),
            ));
        }
    }

    bounds
}

fn count_keyword(
    map: &Map<String, Value>,
    keyword: &str,
    path: &str,
    issues: &mut Vec<DefinitionIssue>,
) -> Option<u64> {
    let value = map.get(keyword)?;
    let count = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    });
    if count.is_none() {
        issues.push(DefinitionIssue::new(
            &format!("{path}/{keyword}"),
            format!("'{keyword}' must be a non-negative integer"),
        ));
    }
    count
}

/// Escape a property name for use in a JSON Pointer (RFC 6901).
fn escape_pointer(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}
