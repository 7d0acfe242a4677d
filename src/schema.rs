//! Declared output shapes for schema-constrained generation.
//!
//! A [`Shape`] serializes directly to Gemini's `responseSchema` format, so the
//! same value is used to build requests and to check decoded output locally.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Closed tree of shape nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Shape {
    String {
        /// Allowed values. Empty means unconstrained.
        #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
        values: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Boolean {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Object {
        properties: BTreeMap<String, Shape>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        required: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Array {
        items: Box<Shape>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl Shape {
    pub fn string() -> Self {
        Shape::String {
            values: Vec::new(),
            description: None,
        }
    }

    /// A string restricted to the given values.
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Shape::String {
            values: values.into_iter().map(Into::into).collect(),
            description: None,
        }
    }

    pub fn number() -> Self {
        Shape::Number { description: None }
    }

    pub fn integer() -> Self {
        Shape::Integer { description: None }
    }

    pub fn boolean() -> Self {
        Shape::Boolean { description: None }
    }

    pub fn array(items: Shape) -> Self {
        Shape::Array {
            items: Box::new(items),
            description: None,
        }
    }

    /// An object whose declared properties are all required.
    ///
    /// Use [`Shape::with_optional`] to relax individual fields.
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Shape)>,
        K: Into<String>,
    {
        let properties: BTreeMap<String, Shape> = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        let required = properties.keys().cloned().collect();
        Shape::Object {
            properties,
            required,
            description: None,
        }
    }

    /// Removes the named fields from an object's required set.
    ///
    /// Has no effect on non-object shapes.
    pub fn with_optional(mut self, fields: &[&str]) -> Self {
        if let Shape::Object { required, .. } = &mut self {
            required.retain(|name| !fields.contains(&name.as_str()));
        }
        self
    }

    /// Replaces an object's required set verbatim.
    ///
    /// Names are not checked here; [`Shape::validate`] rejects unknown ones.
    pub fn with_required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Shape::Object { required, .. } = &mut self {
            *required = fields.into_iter().map(Into::into).collect();
        }
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match &mut self {
            Shape::String { description, .. }
            | Shape::Number { description }
            | Shape::Integer { description }
            | Shape::Boolean { description }
            | Shape::Object { description, .. }
            | Shape::Array { description, .. } => *description = text,
        }
        self
    }

    /// Name of the node kind as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::String { .. } => "STRING",
            Shape::Number { .. } => "NUMBER",
            Shape::Integer { .. } => "INTEGER",
            Shape::Boolean { .. } => "BOOLEAN",
            Shape::Object { .. } => "OBJECT",
            Shape::Array { .. } => "ARRAY",
        }
    }

    /// Checks that the shape is well-formed: every object's required set
    /// names only declared properties. Array items are enforced by the type.
    pub fn validate(&self) -> Result<()> {
        self.validate_at("$")
    }

    fn validate_at(&self, path: &str) -> Result<()> {
        match self {
            Shape::Object {
                properties,
                required,
                ..
            } => {
                if let Some(unknown) = required.iter().find(|r| !properties.contains_key(*r)) {
                    return Err(Error::InvalidRequest(format!(
                        "shape at {} requires undeclared property '{}'",
                        path, unknown
                    )));
                }
                for (name, child) in properties {
                    child.validate_at(&format!("{}.{}", path, name))?;
                }
                Ok(())
            }
            Shape::Array { items, .. } => items.validate_at(&format!("{}[]", path)),
            _ => Ok(()),
        }
    }

    /// Structural conformance check of a decoded value against this shape.
    ///
    /// Verifies node types, required fields and enum membership. Undeclared
    /// properties are ignored, and optional properties may be `null`.
    pub fn check(&self, value: &Value) -> std::result::Result<(), Violation> {
        self.check_at(value, "$")
    }

    fn check_at(&self, value: &Value, path: &str) -> std::result::Result<(), Violation> {
        match (self, value) {
            (Shape::String { values, .. }, Value::String(s)) => {
                if values.is_empty() || values.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(Violation::new(
                        path,
                        format!("'{}' is not one of {:?}", s, values),
                    ))
                }
            }
            (Shape::Number { .. }, Value::Number(_)) => Ok(()),
            (Shape::Integer { .. }, Value::Number(n)) => {
                let integral =
                    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0);
                if integral {
                    Ok(())
                } else {
                    Err(Violation::new(path, format!("{} is not an integer", n)))
                }
            }
            (Shape::Boolean { .. }, Value::Bool(_)) => Ok(()),
            (
                Shape::Object {
                    properties,
                    required,
                    ..
                },
                Value::Object(map),
            ) => {
                for name in required {
                    match map.get(name) {
                        None | Some(Value::Null) => {
                            return Err(Violation::new(
                                path,
                                format!("missing required field '{}'", name),
                            ))
                        }
                        Some(_) => {}
                    }
                }
                for (name, child) in properties {
                    match map.get(name) {
                        None | Some(Value::Null) => {}
                        Some(v) => child.check_at(v, &format!("{}.{}", path, name))?,
                    }
                }
                Ok(())
            }
            (Shape::Array { items, .. }, Value::Array(elements)) => {
                for (i, element) in elements.iter().enumerate() {
                    items.check_at(element, &format!("{}[{}]", path, i))?;
                }
                Ok(())
            }
            (shape, other) => Err(Violation::new(
                path,
                format!("expected {}, found {}", shape.kind(), json_kind(other)),
            )),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A single place where a decoded value departs from its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    fn new(path: &str, message: String) -> Self {
        Self {
            path: path.to_string(),
            message,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
