//! Schema vocabulary: declared types, property options and descriptors
//!
//! A schema arrives at runtime as JSON. Declared type strings are resolved
//! once into [`DeclaredType`] and constraint maps are normalized to canonical
//! validator keys before any chain is built from them.

pub mod definition;
pub mod relations;
pub mod synthesizer;

pub use definition::{fetch_definition, TypeDefinition};
pub use relations::{AssociationDescriptor, AssociationKind, AssociationOptions, AssociationSpec};
pub use synthesizer::Synthesizer;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use crate::error::{Error, Result};
use crate::validation::canonical_key;

/// Keys of a property schema that describe the property itself
const RESERVED_KEYS: &[&str] = &["type", "required", "multi", "enumeration"];

/// Documentation keys carried by platform schemas, never constraints
const IGNORED_KEYS: &[&str] = &["description", "title"];

/// Declared type of a property, resolved once at declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    String,
    Integer,
    Real,
    Boolean,
    DateTime,
    Object,
    GeoJson,
    /// Values drawn from a named enumeration
    Enumerated(String),
    /// Instances of another synthesized type, looked up by name when used
    Embedded(String),
}

impl DeclaredType {
    /// Resolve a schema type string
    ///
    /// Any name that is not a primitive refers to another synthesized type.
    /// `"Enumerated"` needs the enumeration reference.
    pub fn parse(type_name: &str, enumeration: Option<&str>) -> Result<Self> {
        let type_name = type_name.trim();
        let declared = match type_name {
            "" => return Err(Error::configuration("property type must not be empty")),
            "String" => DeclaredType::String,
            "Integer" => DeclaredType::Integer,
            "Real" => DeclaredType::Real,
            "Boolean" => DeclaredType::Boolean,
            "DateTime" => DeclaredType::DateTime,
            "Object" => DeclaredType::Object,
            "GeoJSON" | "GeoJson" => DeclaredType::GeoJson,
            "Enumerated" => match enumeration.map(str::trim) {
                Some(reference) if !reference.is_empty() => {
                    DeclaredType::Enumerated(reference.to_string())
                }
                _ => {
                    return Err(Error::configuration(
                        "Enumerated properties need an enumeration reference",
                    ))
                }
            },
            other => DeclaredType::Embedded(other.to_string()),
        };
        Ok(declared)
    }

    pub fn name(&self) -> &str {
        match self {
            DeclaredType::String => "String",
            DeclaredType::Integer => "Integer",
            DeclaredType::Real => "Real",
            DeclaredType::Boolean => "Boolean",
            DeclaredType::DateTime => "DateTime",
            DeclaredType::Object => "Object",
            DeclaredType::GeoJson => "GeoJSON",
            DeclaredType::Enumerated(_) => "Enumerated",
            DeclaredType::Embedded(name) => name,
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, DeclaredType::Enumerated(_) | DeclaredType::Embedded(_))
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Enumerated(reference) => write!(f, "Enumerated({})", reference),
            other => f.write_str(other.name()),
        }
    }
}

/// Options passed to `property(name, options)`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyOptions {
    pub declared_type: DeclaredType,
    pub required: bool,
    pub multi: bool,
    pub constraints: Map<String, JsonValue>,
}

impl PropertyOptions {
    pub fn new(declared_type: DeclaredType) -> Self {
        Self { declared_type, required: false, multi: false, constraints: Map::new() }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    /// Add a constraint under its canonical key
    ///
    /// `null` and `false` arguments mean "not constrained" and are dropped.
    /// `min_length` / `max_length` fold into a single `length` range.
    pub fn constraint(mut self, key: &str, argument: impl Into<JsonValue>) -> Self {
        let argument = argument.into();
        if matches!(argument, JsonValue::Null | JsonValue::Bool(false)) {
            return self;
        }

        let key = canonical_key(key);
        match key.as_str() {
            "min_length" | "max_length" => {
                let bound = if key == "min_length" { "min" } else { "max" };
                let length = self
                    .constraints
                    .entry("length")
                    .or_insert_with(|| JsonValue::Object(Map::new()));
                if !length.is_object() {
                    *length = JsonValue::Object(Map::new());
                }
                if let JsonValue::Object(range) = length {
                    range.insert(bound.to_string(), argument);
                }
            }
            "required" => self.required = true,
            "multi" => self.multi = true,
            _ => {
                self.constraints.insert(key, argument);
            }
        }
        self
    }

    /// Read a property schema such as `{"type": "String", "required": true, "maxLength": 3}`
    pub fn from_schema(schema: &JsonValue) -> Result<Self> {
        let object = schema.as_object().ok_or_else(|| {
            Error::configuration(format!("property schema must be an object, got {}", schema))
        })?;

        let type_name = object
            .get("type")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::configuration("property schema is missing its type"))?;
        let enumeration = object.get("enumeration").and_then(JsonValue::as_str);

        let mut options = Self::new(DeclaredType::parse(type_name, enumeration)?);
        options.required = flag(object, "required")?;
        options.multi = flag(object, "multi")?;

        for (key, argument) in object {
            if RESERVED_KEYS.contains(&key.as_str()) || IGNORED_KEYS.contains(&key.as_str()) {
                continue;
            }
            options = options.constraint(key, argument.clone());
        }
        Ok(options)
    }
}

fn flag(object: &Map<String, JsonValue>, key: &str) -> Result<bool> {
    match object.get(key) {
        None | Some(JsonValue::Null) => Ok(false),
        Some(JsonValue::Bool(value)) => Ok(*value),
        Some(other) => Err(Error::configuration(format!("{} must be a boolean, got {}", key, other))),
    }
}

/// A registered property; immutable once its type is registered
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub declared_type: DeclaredType,
    pub required: bool,
    pub multi: bool,
    pub constraints: Map<String, JsonValue>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, options: PropertyOptions) -> Self {
        Self {
            name: name.into(),
            declared_type: options.declared_type,
            required: options.required,
            multi: options.multi,
            constraints: options.constraints,
        }
    }

    pub fn constraint(&self, key: &str) -> Option<&JsonValue> {
        self.constraints.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_declared_types() {
        assert_eq!(DeclaredType::parse("Integer", None).unwrap(), DeclaredType::Integer);
        assert_eq!(DeclaredType::parse("GeoJSON", None).unwrap(), DeclaredType::GeoJson);
        assert_eq!(
            DeclaredType::parse("Address", None).unwrap(),
            DeclaredType::Embedded("Address".into())
        );
        assert_eq!(
            DeclaredType::parse("Enumerated", Some("Color")).unwrap(),
            DeclaredType::Enumerated("Color".into())
        );
        assert!(DeclaredType::parse("Enumerated", None).unwrap_err().is_configuration());
        assert!(DeclaredType::parse("  ", None).is_err());
    }

    #[test]
    fn test_options_from_schema_normalize_constraints() {
        let options = PropertyOptions::from_schema(&json!({
            "type": "String",
            "required": true,
            "description": "Display label",
            "notBlank": true,
            "pattern": "^[a-z]+$",
            "minLength": 2,
            "maxLength": 8,
            "maximum": null
        }))
        .unwrap();

        assert!(options.required);
        assert!(!options.multi);
        assert_eq!(
            JsonValue::Object(options.constraints),
            json!({ "not_blank": true, "matches": "^[a-z]+$", "length": { "min": 2, "max": 8 } })
        );
    }

    #[test]
    fn test_options_reject_malformed_schema() {
        assert!(PropertyOptions::from_schema(&json!("String")).is_err());
        assert!(PropertyOptions::from_schema(&json!({ "required": true })).is_err());
        assert!(PropertyOptions::from_schema(&json!({ "type": "String", "multi": "yes" })).is_err());
    }

    #[test]
    fn test_builder_flags_and_false_constraints() {
        let options = PropertyOptions::new(DeclaredType::Integer)
            .multi()
            .constraint("minimum", 0)
            .constraint("isEmail", false);
        assert!(options.multi);
        assert_eq!(JsonValue::Object(options.constraints), json!({ "min": 0 }));
    }
}
