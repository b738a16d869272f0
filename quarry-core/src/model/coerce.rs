//! Raw JSON to attribute values, driven by the declared type

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::model::{Resource, TypeRegistry, Value};
use crate::schema::{DeclaredType, PropertyDescriptor};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]` (as UTC) or `YYYY-MM-DD`
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Coerce the raw value of a registered property
///
/// `null` is absence. Multi-valued properties coerce element-wise and drop
/// `null` elements; a scalar given to a multi-valued property is coerced as
/// is and left for the `multi` validator to report.
pub fn coerce(
    registry: &TypeRegistry,
    descriptor: &PropertyDescriptor,
    raw: JsonValue,
) -> Result<Option<Value>> {
    match raw {
        JsonValue::Null => Ok(None),
        JsonValue::Array(items) if descriptor.multi => {
            let mut values = Vec::with_capacity(items.len());
            for item in items.into_iter().filter(|item| !item.is_null()) {
                values.push(coerce_scalar(registry, &descriptor.declared_type, item)?);
            }
            Ok(Some(Value::List(values)))
        }
        JsonValue::Array(items) => Ok(Some(Value::Raw(JsonValue::Array(items)))),
        scalar => coerce_scalar(registry, &descriptor.declared_type, scalar).map(Some),
    }
}

/// Coerce a single (non-list) value
pub fn coerce_scalar(registry: &TypeRegistry, declared: &DeclaredType, raw: JsonValue) -> Result<Value> {
    let value = match (declared, raw) {
        (DeclaredType::String, JsonValue::String(s)) => Value::String(s),
        (DeclaredType::String, JsonValue::Number(n)) => Value::String(n.to_string()),
        (DeclaredType::String, JsonValue::Bool(b)) => Value::String(b.to_string()),

        (DeclaredType::Integer, JsonValue::Number(n)) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::Integer(f as i64),
                _ => Value::Raw(JsonValue::Number(n)),
            },
        },
        (DeclaredType::Integer, JsonValue::String(s)) => match s.trim().parse::<i64>() {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Raw(JsonValue::String(s)),
        },

        (DeclaredType::Real, JsonValue::Number(n)) => match n.as_f64() {
            Some(f) => Value::Real(f),
            None => Value::Raw(JsonValue::Number(n)),
        },
        (DeclaredType::Real, JsonValue::String(s)) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Real(f),
            _ => Value::Raw(JsonValue::String(s)),
        },

        (DeclaredType::Boolean, JsonValue::Bool(b)) => Value::Boolean(b),
        (DeclaredType::Boolean, JsonValue::String(s)) => match s.trim() {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => Value::Raw(JsonValue::String(s)),
        },

        (DeclaredType::DateTime, JsonValue::String(s)) => match parse_datetime(&s) {
            Some(at) => Value::DateTime(at),
            None => Value::Raw(JsonValue::String(s)),
        },

        (DeclaredType::Object, JsonValue::Object(map)) => Value::Object(map),
        (DeclaredType::GeoJson, geometry @ JsonValue::Object(_)) => Value::GeoJson(geometry),

        (DeclaredType::Enumerated(_), JsonValue::String(s)) => Value::String(s),
        (DeclaredType::Enumerated(_), JsonValue::Bool(b)) => Value::Boolean(b),
        (DeclaredType::Enumerated(_), JsonValue::Number(n)) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Real).unwrap_or(Value::Raw(JsonValue::Number(n))),
        },

        (DeclaredType::Embedded(type_name), raw @ JsonValue::Object(_)) => {
            let ty = registry.require(type_name)?;
            Value::Resource(Box::new(Resource::from_json(registry, ty, raw)?))
        }

        (_, raw) => Value::Raw(raw),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertyOptions;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn scalar(declared: DeclaredType, raw: JsonValue) -> Value {
        coerce_scalar(&TypeRegistry::new("t"), &declared, raw).unwrap()
    }

    #[test]
    fn test_parse_datetime_forms() {
        let rfc = parse_datetime("2024-03-01T10:15:00+02:00").unwrap();
        assert_eq!(rfc.hour(), 8);

        let naive = parse_datetime("2024-03-01T10:15:30.250").unwrap();
        assert_eq!((naive.hour(), naive.second()), (10, 30));

        let date = parse_datetime("2024-03-01").unwrap();
        assert_eq!((date.year(), date.month(), date.day(), date.hour()), (2024, 3, 1, 0));

        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn test_primitive_coercions() {
        assert_eq!(scalar(DeclaredType::String, json!(42)), Value::from("42"));
        assert_eq!(scalar(DeclaredType::Integer, json!("17")), Value::Integer(17));
        assert_eq!(scalar(DeclaredType::Integer, json!(4.0)), Value::Integer(4));
        assert_eq!(scalar(DeclaredType::Integer, json!(4.5)), Value::Raw(json!(4.5)));
        assert_eq!(scalar(DeclaredType::Real, json!("2.25")), Value::Real(2.25));
        assert_eq!(scalar(DeclaredType::Boolean, json!("true")), Value::Boolean(true));
        assert_eq!(scalar(DeclaredType::Object, json!([1])), Value::Raw(json!([1])));
        assert_eq!(scalar(DeclaredType::Integer, json!("many")), Value::Raw(json!("many")));
    }

    #[test]
    fn test_multi_and_null_handling() {
        let registry = TypeRegistry::new("t");
        let tags = PropertyDescriptor::new("tags", PropertyOptions::new(DeclaredType::String).multi());

        assert_eq!(coerce(&registry, &tags, JsonValue::Null).unwrap(), None);
        assert_eq!(
            coerce(&registry, &tags, json!(["a", null, 3])).unwrap(),
            Some(Value::List(vec![Value::from("a"), Value::from("3")]))
        );
        assert_eq!(coerce(&registry, &tags, json!("solo")).unwrap(), Some(Value::from("solo")));

        let single = PropertyDescriptor::new("label", PropertyOptions::new(DeclaredType::String));
        assert_eq!(coerce(&registry, &single, json!(["a"])).unwrap(), Some(Value::Raw(json!(["a"]))));
    }

    #[test]
    fn test_unregistered_embedded_type_is_configuration_error() {
        let registry = TypeRegistry::new("t");
        let err = coerce_scalar(&registry, &DeclaredType::Embedded("Ghost".into()), json!({}))
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
