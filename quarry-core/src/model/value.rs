//! Coerced attribute values

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value as JsonValue};

use crate::model::Resource;

/// The value of one attribute after coercion
///
/// Values that could not be coerced to the declared type are kept as
/// [`Value::Raw`] so the type validator can report them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Object(Map<String, JsonValue>),
    GeoJson(JsonValue),
    Resource(Box<Resource>),
    List(Vec<Value>),
    Raw(JsonValue),
}

impl Value {
    /// Serializable form; nested resources expand to their attributes
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Integer(n) => JsonValue::Number((*n).into()),
            Value::Real(n) => Number::from_f64(*n).map(JsonValue::Number).unwrap_or(JsonValue::Null),
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::DateTime(at) => JsonValue::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Object(map) => JsonValue::Object(map.clone()),
            Value::GeoJson(geometry) => geometry.clone(),
            Value::Resource(resource) => JsonValue::Object(resource.attributes()),
            Value::List(items) => JsonValue::Array(
                items.iter().map(Value::to_json).filter(|item| !item.is_null()).collect(),
            ),
            Value::Raw(raw) => raw.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view of integers and reals
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Real(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::DateTime(at) => Some(at),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Value::Resource(resource) => Some(resource.as_ref()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Real(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(at: DateTime<Utc>) -> Self {
        Value::DateTime(at)
    }
}

impl From<Resource> for Value {
    fn from(resource: Resource) -> Self {
        Value::Resource(Box::new(resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_scalar_json_forms() {
        assert_eq!(Value::from("x").to_json(), json!("x"));
        assert_eq!(Value::from(3_i64).to_json(), json!(3));
        assert_eq!(Value::from(2.5).to_json(), json!(2.5));
        assert_eq!(Value::Real(f64::NAN).to_json(), JsonValue::Null);

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(Value::from(at).to_json(), json!("2024-05-01T12:30:00Z"));
    }

    #[test]
    fn test_list_drops_null_leaves() {
        let list = Value::List(vec![Value::Real(1.5), Value::Real(f64::INFINITY), Value::from("a")]);
        assert_eq!(list.to_json(), json!([1.5, "a"]));
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(Value::Integer(4).as_f64(), Some(4.0));
        assert_eq!(Value::from("4").as_f64(), None);
        assert!(Value::List(vec![]).is_list());
    }
}
