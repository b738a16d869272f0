//! Registry of validator constructors keyed by canonical name

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use convert_case::{Case, Casing};
use serde_json::Value as JsonValue;

use crate::enumeration::EnumerationCache;
use crate::error::{Error, Result};
use crate::validation::rules::{
    EmbeddedValidator, EnumeratedValidator, IsEmailValidator, LengthValidator, MatchesValidator,
    MaxValidator, MinValidator, MultiValidator, NotBlankValidator, PrecisionValidator,
    RequiredValidator, TypeValidator,
};
use crate::validation::{derive_key, Validator};

type Builder = Arc<dyn Fn(&JsonValue, &EnumerationCache) -> Result<Box<dyn Validator>> + Send + Sync>;

/// Platform spellings accepted in constraint maps
const ALIASES: &[(&str, &str)] = &[
    ("minimum", "min"),
    ("maximum", "max"),
    ("pattern", "matches"),
    ("email", "is_email"),
];

/// Normalize a constraint key: snake_case, then alias resolution
pub fn canonical_key(name: &str) -> String {
    let key = name.trim().to_case(Case::Snake);
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(key)
}

/// Maps constraint keys to validator constructors
///
/// Every catalog starts with the built-in rules. Additional constructors are
/// registered under the key derived from their validator type.
#[derive(Clone)]
pub struct ValidatorCatalog {
    builders: HashMap<String, Builder>,
    enumerations: EnumerationCache,
}

impl ValidatorCatalog {
    pub fn new(enumerations: EnumerationCache) -> Self {
        let mut catalog = Self { builders: HashMap::new(), enumerations };

        catalog.register::<RequiredValidator, _>(|_| Ok(RequiredValidator));
        catalog.register::<MultiValidator, _>(|_| Ok(MultiValidator));
        catalog.register::<NotBlankValidator, _>(|_| Ok(NotBlankValidator));
        catalog.register::<IsEmailValidator, _>(|_| Ok(IsEmailValidator));
        catalog.register::<TypeValidator, _>(TypeValidator::from_argument);
        catalog.register::<MatchesValidator, _>(MatchesValidator::from_argument);
        catalog.register::<MinValidator, _>(MinValidator::from_argument);
        catalog.register::<MaxValidator, _>(MaxValidator::from_argument);
        catalog.register::<LengthValidator, _>(LengthValidator::from_argument);
        catalog.register::<PrecisionValidator, _>(PrecisionValidator::from_argument);
        catalog.register::<EmbeddedValidator, _>(EmbeddedValidator::from_argument);
        catalog.builders.insert(
            derive_key(std::any::type_name::<EnumeratedValidator>()),
            Arc::new(|argument: &JsonValue, cache: &EnumerationCache| {
                Ok(Box::new(EnumeratedValidator::from_argument(argument, cache)?) as Box<dyn Validator>)
            }),
        );

        catalog
    }

    /// Register a constructor under the key derived from `V`'s type name
    ///
    /// Registering an existing key replaces its constructor.
    pub fn register<V, F>(&mut self, build: F)
    where
        V: Validator + 'static,
        F: Fn(&JsonValue) -> Result<V> + Send + Sync + 'static,
    {
        let key = derive_key(std::any::type_name::<V>());
        self.builders.insert(
            key,
            Arc::new(move |argument: &JsonValue, _: &EnumerationCache| {
                Ok(Box::new(build(argument)?) as Box<dyn Validator>)
            }),
        );
    }

    /// Build the validator for a constraint key and argument
    pub fn resolve(&self, key: &str, argument: &JsonValue) -> Result<Box<dyn Validator>> {
        let canonical = canonical_key(key);
        let build = self
            .builders
            .get(&canonical)
            .ok_or_else(|| Error::configuration(format!("unknown validator: {}", key)))?;
        build(argument, &self.enumerations)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.builders.contains_key(&canonical_key(key))
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.builders.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn enumerations(&self) -> &EnumerationCache {
        &self.enumerations
    }
}

impl Default for ValidatorCatalog {
    fn default() -> Self {
        Self::new(EnumerationCache::new())
    }
}

impl fmt::Debug for ValidatorCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorCatalog").field("keys", &self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::validation::Errors;
    use serde_json::json;

    #[test]
    fn test_canonical_keys_and_aliases() {
        assert_eq!(canonical_key("minimum"), "min");
        assert_eq!(canonical_key("maximum"), "max");
        assert_eq!(canonical_key("pattern"), "matches");
        assert_eq!(canonical_key("email"), "is_email");
        assert_eq!(canonical_key("notBlank"), "not_blank");
        assert_eq!(canonical_key("isEmail"), "is_email");
        assert_eq!(canonical_key("length"), "length");
    }

    #[test]
    fn test_builtin_keys() {
        let catalog = ValidatorCatalog::default();
        assert_eq!(
            catalog.keys(),
            vec![
                "embedded", "enumerated", "is_email", "length", "matches", "max", "min", "multi",
                "not_blank", "precision", "required", "type",
            ]
        );
    }

    #[test]
    fn test_resolve_through_alias() {
        let catalog = ValidatorCatalog::default();
        let validator = catalog.resolve("maximum", &json!(5)).unwrap();
        assert_eq!(validator.key(), "max");

        let mut errors = Errors::new();
        validator.validate("count", Some(&Value::Integer(6)), &mut errors);
        assert_eq!(errors.get("count"), ["must be less than or equal to 5"]);
    }

    #[test]
    fn test_unknown_key_is_configuration_error() {
        let catalog = ValidatorCatalog::default();
        let err = catalog.resolve("frobnicate", &json!(true)).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("frobnicate"));
    }

    #[derive(Debug)]
    struct EvenValidator;

    impl Validator for EvenValidator {
        fn validate(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
            if let Some(Value::Integer(n)) = value {
                if n % 2 != 0 {
                    errors.add(attribute, "must be even");
                }
            }
        }
    }

    #[test]
    fn test_register_custom_validator() {
        let mut catalog = ValidatorCatalog::default();
        assert!(!catalog.contains("even"));
        catalog.register::<EvenValidator, _>(|_| Ok(EvenValidator));
        assert!(catalog.contains("even"));

        let validator = catalog.resolve("even", &json!(true)).unwrap();
        let mut errors = Errors::new();
        validator.validate("n", Some(&Value::Integer(3)), &mut errors);
        assert_eq!(errors.get("n"), ["must be even"]);
    }
}
