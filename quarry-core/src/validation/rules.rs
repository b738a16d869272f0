//! Validator catalog entries, one type per semantic constraint
//!
//! Absent values are valid for everything except [`RequiredValidator`] and
//! [`MultiValidator`]. A list value is checked element by element and
//! produces one pluralized message naming the attribute.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::enumeration::EnumerationCache;
use crate::error::{Error, Result};
use crate::model::{geo, Value};
use crate::schema::DeclaredType;
use crate::validation::{Errors, Validator};

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid");
}

/// Run `passes` on a scalar or on every element of a list
fn check<P, S, L>(
    attribute: &str,
    value: Option<&Value>,
    errors: &mut Errors,
    passes: P,
    singular: S,
    plural: L,
) where
    P: Fn(&Value) -> bool,
    S: FnOnce() -> String,
    L: FnOnce() -> String,
{
    match value {
        None => {}
        Some(Value::List(items)) => {
            if !items.iter().all(&passes) {
                errors.add(attribute, plural());
            }
        }
        Some(value) => {
            if !passes(value) {
                errors.add(attribute, singular());
            }
        }
    }
}

fn article(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

/// Render a bound without a trailing ".0" for whole numbers
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn number_argument(key: &str, argument: &JsonValue) -> Result<f64> {
    match argument {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::configuration(format!("{} expects a number, got {}", key, argument)))
}

fn count_argument(key: &str, argument: &JsonValue) -> Result<usize> {
    let n = number_argument(key, argument)?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(Error::configuration(format!(
            "{} expects a non-negative integer, got {}",
            key, argument
        )));
    }
    Ok(n as usize)
}

// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RequiredValidator;

impl Validator for RequiredValidator {
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        if value.is_none() {
            errors.add(attribute, "is required");
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MultiValidator;

impl Validator for MultiValidator {
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        match value {
            None | Some(Value::List(_)) => {}
            Some(_) => errors.add(attribute, "must be a list"),
        }
    }
}

/// Runtime type check for primitive declared types
#[derive(Debug, Clone)]
pub struct TypeValidator {
    expected: DeclaredType,
}

impl TypeValidator {
    pub fn new(expected: DeclaredType) -> Result<Self> {
        if !expected.is_primitive() {
            return Err(Error::configuration(format!(
                "type validator only checks primitive types, got {}",
                expected
            )));
        }
        Ok(Self { expected })
    }

    pub fn from_argument(argument: &JsonValue) -> Result<Self> {
        let name = argument.as_str().ok_or_else(|| {
            Error::configuration(format!("type expects a type name, got {}", argument))
        })?;
        Self::new(DeclaredType::parse(name, None)?)
    }

    fn matches(&self, value: &Value) -> bool {
        match (&self.expected, value) {
            (DeclaredType::String, Value::String(_)) => true,
            (DeclaredType::Integer, Value::Integer(_)) => true,
            (DeclaredType::Real, Value::Real(_) | Value::Integer(_)) => true,
            (DeclaredType::Boolean, Value::Boolean(_)) => true,
            (DeclaredType::DateTime, Value::DateTime(_)) => true,
            (DeclaredType::Object, Value::Object(_)) => true,
            (DeclaredType::GeoJson, Value::GeoJson(geometry)) => geo::is_valid_geometry(geometry),
            _ => false,
        }
    }
}

impl Validator for TypeValidator {
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        let name = self.expected.name();
        check(
            attribute,
            value,
            errors,
            |v| self.matches(v),
            || format!("must be {} {}", article(name), name),
            || format!("{} must all be {} values", attribute, name),
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotBlankValidator;

impl Validator for NotBlankValidator {
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        check(
            attribute,
            value,
            errors,
            |v| !matches!(v, Value::String(s) if s.is_empty()),
            || "must not be blank".to_string(),
            || format!("{} must not contain blank values", attribute),
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct IsEmailValidator;

impl Validator for IsEmailValidator {
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        check(
            attribute,
            value,
            errors,
            |v| matches!(v, Value::String(s) if EMAIL.is_match(s)),
            || "is not a valid email address".to_string(),
            || format!("{} must all be valid email addresses", attribute),
        );
    }
}

#[derive(Debug, Clone)]
pub struct MatchesValidator {
    pattern: Regex,
}

impl MatchesValidator {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::configuration(format!("invalid pattern {:?}: {}", pattern, e)))?;
        Ok(Self { pattern })
    }

    pub fn from_argument(argument: &JsonValue) -> Result<Self> {
        let pattern = argument.as_str().ok_or_else(|| {
            Error::configuration(format!("matches expects a pattern string, got {}", argument))
        })?;
        Self::new(pattern)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    fn matches(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => self.pattern.is_match(s),
            Value::Integer(n) => self.pattern.is_match(&n.to_string()),
            Value::Real(n) => self.pattern.is_match(&n.to_string()),
            _ => false,
        }
    }
}

impl Validator for MatchesValidator {
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        let pattern = self.pattern.as_str();
        check(
            attribute,
            value,
            errors,
            |v| self.matches(v),
            || format!("does not match /{}/", pattern),
            || format!("{} must all match /{}/", attribute, pattern),
        );
    }
}

#[derive(Debug, Clone)]
pub struct MinValidator {
    minimum: f64,
}

impl MinValidator {
    pub fn new(minimum: f64) -> Self {
        Self { minimum }
    }

    pub fn from_argument(argument: &JsonValue) -> Result<Self> {
        Ok(Self::new(number_argument("min", argument)?))
    }

    pub fn minimum(&self) -> f64 {
        self.minimum
    }
}

impl Validator for MinValidator {
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        let bound = format_number(self.minimum);
        check(
            attribute,
            value,
            errors,
            |v| v.as_f64().map_or(true, |n| n >= self.minimum),
            || format!("must be greater than or equal to {}", bound),
            || format!("{} must all be greater than or equal to {}", attribute, bound),
        );
    }
}

#[derive(Debug, Clone)]
pub struct MaxValidator {
    maximum: f64,
}

impl MaxValidator {
    pub fn new(maximum: f64) -> Self {
        Self { maximum }
    }

    pub fn from_argument(argument: &JsonValue) -> Result<Self> {
        Ok(Self::new(number_argument("max", argument)?))
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }
}

impl Validator for MaxValidator {
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        let bound = format_number(self.maximum);
        check(
            attribute,
            value,
            errors,
            |v| v.as_f64().map_or(true, |n| n <= self.maximum),
            || format!("must be less than or equal to {}", bound),
            || format!("{} must all be less than or equal to {}", attribute, bound),
        );
    }
}

/// Character length of strings within an inclusive range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthValidator {
    min: Option<usize>,
    max: Option<usize>,
}

impl LengthValidator {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Result<Self> {
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(Error::configuration(format!(
                    "length range is empty: {}..{}",
                    min, max
                )));
            }
        }
        if min.is_none() && max.is_none() {
            return Err(Error::configuration("length needs a minimum or a maximum"));
        }
        Ok(Self { min, max })
    }

    /// Accepts `{"min": a, "max": b}`, `[a, b]`, `"a..b"` or an exact length
    pub fn from_argument(argument: &JsonValue) -> Result<Self> {
        match argument {
            JsonValue::Object(map) => {
                let min = map.get("min").map(|v| count_argument("length.min", v)).transpose()?;
                let max = map.get("max").map(|v| count_argument("length.max", v)).transpose()?;
                Self::new(min, max)
            }
            JsonValue::Array(bounds) if bounds.len() == 2 => Self::new(
                Some(count_argument("length", &bounds[0])?),
                Some(count_argument("length", &bounds[1])?),
            ),
            JsonValue::String(range) => {
                let (min, max) = range.split_once("..").ok_or_else(|| {
                    Error::configuration(format!("length range must look like a..b, got {}", range))
                })?;
                let parse = |s: &str| -> Result<Option<usize>> {
                    let s = s.trim_start_matches('=').trim();
                    if s.is_empty() {
                        return Ok(None);
                    }
                    s.parse::<usize>().map(Some).map_err(|_| {
                        Error::configuration(format!("invalid length bound {:?}", s))
                    })
                };
                Self::new(parse(min)?, parse(max)?)
            }
            JsonValue::Number(_) => {
                let exact = count_argument("length", argument)?;
                Self::new(Some(exact), Some(exact))
            }
            other => Err(Error::configuration(format!("length expects a range, got {}", other))),
        }
    }

    pub fn min(&self) -> Option<usize> {
        self.min
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    fn describe(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => format!("exactly {}", min),
            (Some(min), Some(max)) => format!("between {} and {}", min, max),
            (Some(min), None) => format!("at least {}", min),
            (None, Some(max)) => format!("at most {}", max),
            (None, None) => "unbounded".to_string(),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        let Value::String(s) = value else {
            return true;
        };
        let len = s.chars().count();
        self.min.map_or(true, |min| len >= min) && self.max.map_or(true, |max| len <= max)
    }
}

impl Validator for LengthValidator {
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        let range = self.describe();
        check(
            attribute,
            value,
            errors,
            |v| self.accepts(v),
            || format!("length must be {}", range),
            || format!("{} must all have a length {}", attribute, range),
        );
    }
}

/// Number of fractional digits of a real value
#[derive(Debug, Clone)]
pub struct PrecisionValidator {
    digits: usize,
}

impl PrecisionValidator {
    pub fn new(digits: usize) -> Self {
        Self { digits }
    }

    pub fn from_argument(argument: &JsonValue) -> Result<Self> {
        Ok(Self::new(count_argument("precision", argument)?))
    }

    pub fn digits(&self) -> usize {
        self.digits
    }
}

/// Fractional digits in the shortest decimal rendering of `n`
pub(crate) fn fractional_digits(n: f64) -> usize {
    let rendered = n.to_string();
    rendered.split_once('.').map_or(0, |(_, fraction)| fraction.len())
}

impl Validator for PrecisionValidator {
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        let digits = self.digits;
        check(
            attribute,
            value,
            errors,
            |v| match v {
                Value::Real(n) => fractional_digits(*n) == digits,
                Value::Integer(_) => digits == 0,
                _ => true,
            },
            || format!("must have {} decimal places", digits),
            || format!("{} must all have {} decimal places", attribute, digits),
        );
    }
}

/// Membership in a cached enumeration
#[derive(Debug, Clone)]
pub struct EnumeratedValidator {
    enumeration: String,
    cache: EnumerationCache,
}

impl EnumeratedValidator {
    pub fn new(enumeration: impl Into<String>, cache: EnumerationCache) -> Self {
        Self { enumeration: enumeration.into(), cache }
    }

    pub fn from_argument(argument: &JsonValue, cache: &EnumerationCache) -> Result<Self> {
        let name = argument.as_str().filter(|s| !s.is_empty()).ok_or_else(|| {
            Error::configuration(format!("enumerated expects an enumeration name, got {}", argument))
        })?;
        Ok(Self::new(name, cache.clone()))
    }
}

impl Validator for EnumeratedValidator {
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        if value.is_none() {
            return;
        }
        let Some(allowed) = self.cache.get(&self.enumeration) else {
            log::warn!(
                "enumeration {} is not cached; {} cannot be checked",
                self.enumeration,
                attribute
            );
            errors.add(attribute, format!("references unknown enumeration {}", self.enumeration));
            return;
        };
        let name = &self.enumeration;
        check(
            attribute,
            value,
            errors,
            |v| allowed.contains(&v.to_json()),
            || format!("is not a valid {} value", name),
            || format!("{} must all be valid {} values", attribute, name),
        );
    }
}

/// Instance-of check against a synthesized type
#[derive(Debug, Clone)]
pub struct EmbeddedValidator {
    type_name: String,
}

impl EmbeddedValidator {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self { type_name: type_name.into() }
    }

    pub fn from_argument(argument: &JsonValue) -> Result<Self> {
        let name = argument.as_str().filter(|s| !s.is_empty()).ok_or_else(|| {
            Error::configuration(format!("embedded expects a type name, got {}", argument))
        })?;
        Ok(Self::new(name))
    }
}

impl Validator for EmbeddedValidator {
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        let name = &self.type_name;
        check(
            attribute,
            value,
            errors,
            |v| matches!(v, Value::Resource(r) if r.type_name() == name),
            || format!("must be {} {}", article(name), name),
            || format!("{} must all be {} instances", attribute, name),
        );
    }
}

/// The type check matching a declared type
pub fn type_check(declared: &DeclaredType, cache: &EnumerationCache) -> Box<dyn Validator> {
    match declared {
        DeclaredType::Enumerated(reference) => {
            Box::new(EnumeratedValidator::new(reference.clone(), cache.clone()))
        }
        DeclaredType::Embedded(type_name) => Box::new(EmbeddedValidator::new(type_name.clone())),
        primitive => Box::new(TypeValidator { expected: primitive.clone() }),
    }
}
