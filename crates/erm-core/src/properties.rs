//! Property definitions and the property validator

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Property map carried by entities and edges
pub type Properties = HashMap<String, Value>;

/// Recognized property kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Integer,
    Float,
    Boolean,
    /// RFC 3339 timestamp string
    Datetime,
    /// Textual UUID
    Uuid,
    Array,
    Object,
}

impl PropertyType {
    pub const ALL: [PropertyType; 8] = [
        PropertyType::String,
        PropertyType::Integer,
        PropertyType::Float,
        PropertyType::Boolean,
        PropertyType::Datetime,
        PropertyType::Uuid,
        PropertyType::Array,
        PropertyType::Object,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Datetime => "datetime",
            Self::Uuid => "uuid",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Parse a declared kind name; `None` for unrecognized kinds
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Exact-kind check: an integer is not a float and `123` is not a string
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_f64(),
            Self::Boolean => value.is_boolean(),
            Self::Datetime => value
                .as_str()
                .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
            Self::Uuid => value
                .as_str()
                .is_some_and(|s| uuid::Uuid::parse_str(s).is_ok()),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared property of an entity or edge type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,

    #[serde(rename = "type")]
    pub property_type: PropertyType,

    #[serde(default)]
    pub required: bool,

    /// Closed set of permitted values (the `enum` constraint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            required: false,
            allowed_values: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_allowed_values(mut self, values: Vec<Value>) -> Self {
        self.allowed_values = Some(values);
        self
    }
}

/// Which rule a property broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Constraint {
    Required,
    Type,
    Enum,
}

/// A single failed property rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyViolation {
    pub field: String,
    pub constraint: Constraint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<PropertyType>,
}

impl std::fmt::Display for PropertyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.constraint, self.expected) {
            (Constraint::Required, _) => write!(f, "{} is required", self.field),
            (Constraint::Type, Some(expected)) => {
                write!(f, "{} must be of type {}", self.field, expected)
            }
            (Constraint::Type, None) => write!(f, "{} has the wrong type", self.field),
            (Constraint::Enum, _) => write!(f, "{} is not an allowed value", self.field),
        }
    }
}

/// Validate a property map against a type's declared properties
///
/// Every violation is collected; nothing short-circuits. Keys without a
/// matching definition pass through untouched.
pub fn validate(
    properties: &Properties,
    defs: &[PropertyDef],
) -> std::result::Result<(), Vec<PropertyViolation>> {
    let mut violations = Vec::new();

    for def in defs {
        match properties.get(&def.name) {
            None | Some(Value::Null) => {
                if def.required {
                    violations.push(PropertyViolation {
                        field: def.name.clone(),
                        constraint: Constraint::Required,
                        expected: None,
                    });
                }
            }
            Some(value) => {
                if !def.property_type.matches(value) {
                    violations.push(PropertyViolation {
                        field: def.name.clone(),
                        constraint: Constraint::Type,
                        expected: Some(def.property_type),
                    });
                } else if let Some(allowed) = &def.allowed_values {
                    if !allowed.contains(value) {
                        violations.push(PropertyViolation {
                            field: def.name.clone(),
                            constraint: Constraint::Enum,
                            expected: None,
                        });
                    }
                }
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
