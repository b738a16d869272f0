//! Default value generators driven by declared types and constraints

use chrono::{Duration, SecondsFormat, Utc};
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::factory::pattern;
use crate::model::{geo, TypeRegistry};
use crate::schema::{DeclaredType, PropertyDescriptor};
use crate::validation::rules::{
    LengthValidator, MatchesValidator, MaxValidator, MinValidator, PrecisionValidator,
};

/// Symmetric bound for numbers without `min`/`max`
pub const DEFAULT_NUMBER_BOUND: f64 = 1_000_000.0;

/// Largest element count of a generated list
pub const MAX_LIST_LEN: usize = 5;

/// Candidates tried against a pattern before falling back
const PATTERN_ATTEMPTS: usize = 64;

const DATE_SPAN_SECS: i64 = 5 * 365 * 24 * 60 * 60;

/// Generate a value for `descriptor`
///
/// `visiting` holds the embedded types being generated on the current path;
/// an embedded reference back into it yields `None`.
pub(crate) fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    registry: &TypeRegistry,
    descriptor: &PropertyDescriptor,
    visiting: &mut Vec<String>,
) -> Result<Option<JsonValue>> {
    if descriptor.multi {
        let count = rng.gen_range(0..=MAX_LIST_LEN);
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            if let Some(item) = scalar(rng, registry, descriptor, visiting)? {
                items.push(item);
            }
        }
        return Ok(Some(JsonValue::Array(items)));
    }
    scalar(rng, registry, descriptor, visiting)
}

fn scalar<R: Rng + ?Sized>(
    rng: &mut R,
    registry: &TypeRegistry,
    descriptor: &PropertyDescriptor,
    visiting: &mut Vec<String>,
) -> Result<Option<JsonValue>> {
    let value = match &descriptor.declared_type {
        DeclaredType::String => JsonValue::String(string(rng, descriptor)?),
        DeclaredType::Integer => json!(integer(rng, descriptor)?),
        DeclaredType::Real => json!(real(rng, descriptor)?),
        DeclaredType::Boolean => JsonValue::Bool(rng.gen()),
        DeclaredType::DateTime => {
            let offset = Duration::seconds(rng.gen_range(-DATE_SPAN_SECS..=DATE_SPAN_SECS));
            JsonValue::String((Utc::now() + offset).to_rfc3339_opts(SecondsFormat::Secs, true))
        }
        DeclaredType::Object => {
            let mut object = Map::new();
            for index in 0..rng.gen_range(1..=3) {
                object.insert(format!("key{}", index), JsonValue::String(alphanumeric(rng, 8)));
            }
            JsonValue::Object(object)
        }
        DeclaredType::GeoJson => geo::random_geometry(rng),
        DeclaredType::Enumerated(name) => {
            let values = registry.enumerations().get(name).ok_or_else(|| {
                Error::configuration(format!(
                    "cannot generate {}: enumeration {} is not cached",
                    descriptor.name, name
                ))
            })?;
            values.choose(rng).cloned().ok_or_else(|| {
                Error::configuration(format!(
                    "cannot generate {}: enumeration {} is empty",
                    descriptor.name, name
                ))
            })?
        }
        DeclaredType::Embedded(type_name) => {
            if visiting.iter().any(|visited| visited == type_name) {
                log::debug!("Skipping {}: {} is already being generated", descriptor.name, type_name);
                return Ok(None);
            }
            let factory = registry.factory(type_name)?;
            visiting.push(type_name.clone());
            let attributes = factory.generate(registry, &Map::new(), visiting);
            visiting.pop();
            JsonValue::Object(attributes?)
        }
    };
    Ok(Some(value))
}

fn alphanumeric<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn string<R: Rng + ?Sized>(rng: &mut R, descriptor: &PropertyDescriptor) -> Result<String> {
    let not_blank = descriptor.constraint("not_blank").is_some();
    let length = match descriptor.constraint("length") {
        Some(argument) => {
            let length = LengthValidator::from_argument(argument)?;
            let min = length.min().unwrap_or(0);
            Some((min, length.max().unwrap_or(min + 16)))
        }
        None => None,
    };
    let fits = |candidate: &str| {
        let len = candidate.chars().count();
        length.map_or(true, |(min, max)| len >= min && len <= max)
            && (!not_blank || !candidate.trim().is_empty())
    };

    if let Some(argument) = descriptor.constraint("matches") {
        let matcher = MatchesValidator::from_argument(argument)?;
        let found = pattern::generate_matching(rng, matcher.pattern(), PATTERN_ATTEMPTS, |candidate| {
            fits(candidate) && matcher.is_match(candidate)
        });
        match found {
            Some(candidate) => return Ok(candidate),
            None => log::warn!(
                "Could not generate {} from /{}/ after {} attempts; using an unconstrained string",
                descriptor.name,
                matcher.pattern(),
                PATTERN_ATTEMPTS
            ),
        }
    }

    let (min, max) = length.unwrap_or((8, 16));
    let min = if not_blank { min.max(1) } else { min };
    let len = rng.gen_range(min..=max.max(min));
    Ok(alphanumeric(rng, len))
}

fn bounds(descriptor: &PropertyDescriptor) -> Result<(f64, f64)> {
    let low = match descriptor.constraint("min") {
        Some(argument) => MinValidator::from_argument(argument)?.minimum(),
        None => -DEFAULT_NUMBER_BOUND,
    };
    let high = match descriptor.constraint("max") {
        Some(argument) => MaxValidator::from_argument(argument)?.maximum(),
        None => DEFAULT_NUMBER_BOUND,
    };
    // a single explicit bound keeps the default spread on the open side
    let (low, high) = match (descriptor.constraint("min"), descriptor.constraint("max")) {
        (Some(_), None) if low >= high => (low, low + 2.0 * DEFAULT_NUMBER_BOUND),
        (None, Some(_)) if low >= high => (high - 2.0 * DEFAULT_NUMBER_BOUND, high),
        _ => (low, high),
    };
    if low > high {
        return Err(Error::configuration(format!(
            "cannot generate {}: min {} exceeds max {}",
            descriptor.name, low, high
        )));
    }
    Ok((low, high))
}

fn integer<R: Rng + ?Sized>(rng: &mut R, descriptor: &PropertyDescriptor) -> Result<i64> {
    let (low, high) = bounds(descriptor)?;
    let (low, high) = (low.ceil() as i64, high.floor() as i64);
    if low > high {
        return Err(Error::configuration(format!(
            "cannot generate {}: no integer between the bounds",
            descriptor.name
        )));
    }
    Ok(rng.gen_range(low..=high))
}

fn real<R: Rng + ?Sized>(rng: &mut R, descriptor: &PropertyDescriptor) -> Result<f64> {
    let (low, high) = bounds(descriptor)?;
    let digits = match descriptor.constraint("precision") {
        Some(argument) => PrecisionValidator::from_argument(argument)?.digits(),
        None => 2,
    };
    let scale = 10f64.powi(digits as i32);
    let (scaled_low, scaled_high) = ((low * scale).ceil() as i64, (high * scale).floor() as i64);
    if scaled_low > scaled_high {
        return Err(Error::configuration(format!(
            "cannot generate {}: no value with {} decimal places between the bounds",
            descriptor.name, digits
        )));
    }
    let mut scaled = rng.gen_range(scaled_low..=scaled_high);
    // the last decimal must be non-zero to keep exactly `digits` places
    if digits > 0 && scaled % 10 == 0 {
        scaled = if scaled < scaled_high {
            scaled + 1
        } else if scaled > scaled_low {
            scaled - 1
        } else {
            return Err(Error::configuration(format!(
                "cannot generate {}: no value with exactly {} decimal places between the bounds",
                descriptor.name, digits
            )));
        };
    }
    Ok(scaled as f64 / scale)
}
