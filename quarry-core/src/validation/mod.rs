//! Validation: rule library, catalog and per-type engine
//!
//! A [`Validator`] checks one semantic constraint for one attribute value and
//! writes into the record's [`Errors`]. Validators never see the record
//! itself: the engine lends them the collector for the duration of a single
//! validation pass.

pub mod catalog;
pub mod engine;
pub mod errors;
pub mod rules;

pub use catalog::{canonical_key, ValidatorCatalog};
pub use engine::{ValidationEngine, ValidatorChain};
pub use errors::Errors;

use crate::model::Value;
use convert_case::{Case, Casing};
use std::fmt;

/// A rule checker bound to its parameters
pub trait Validator: Send + Sync + fmt::Debug {
    /// Configuration key, derived from the implementing type's name
    /// (`MinValidator` -> `min`, `NotBlankValidator` -> `not_blank`)
    fn key(&self) -> String {
        derive_key(std::any::type_name::<Self>())
    }

    /// Check `value` (absent when `None`) and record failures under `attribute`
    fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors);
}

/// Derive a configuration key from a validator type name
pub fn derive_key(type_name: &str) -> String {
    let short = type_name.rsplit("::").next().unwrap_or(type_name);
    let short = short.split('<').next().unwrap_or(short);
    let short = short.strip_suffix("Validator").unwrap_or(short);
    short.to_case(Case::Snake)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_from_type_names() {
        assert_eq!(derive_key("quarry_core::validation::rules::MinValidator"), "min");
        assert_eq!(derive_key("NotBlankValidator"), "not_blank");
        assert_eq!(derive_key("crate::IsEmailValidator"), "is_email");
    }

    #[test]
    fn test_key_uses_concrete_type() {
        let validator: Box<dyn Validator> = Box::new(rules::MaxValidator::new(3.0));
        assert_eq!(validator.key(), "max");
    }
}
