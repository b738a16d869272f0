//! Per-type validation chains

use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::model::Value;
use crate::validation::{Errors, Validator, ValidatorCatalog};

/// Ordered validators bound to one attribute
#[derive(Debug, Default)]
pub struct ValidatorChain {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidatorChain {
    pub fn new() -> Self {
        Self { validators: Vec::new() }
    }

    pub fn push(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    /// Build a chain from a constraint map, resolving each key in order
    pub fn from_constraints(catalog: &ValidatorCatalog, constraints: &Map<String, JsonValue>) -> Result<Self> {
        let mut chain = Self::new();
        for (key, argument) in constraints {
            chain.push(catalog.resolve(key, argument)?);
        }
        Ok(chain)
    }

    /// Run every validator; failures accumulate, nothing short-circuits
    pub fn run(&self, attribute: &str, value: Option<&Value>, errors: &mut Errors) {
        for validator in &self.validators {
            validator.validate(attribute, value, errors);
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.validators.iter().map(|v| v.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

/// Attribute chains in declaration order
#[derive(Debug, Default)]
pub struct ValidationEngine {
    chains: Vec<(String, ValidatorChain)>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self { chains: Vec::new() }
    }

    /// Declare the constraints of `attribute`, replacing any earlier chain
    pub fn validates(
        &mut self,
        catalog: &ValidatorCatalog,
        attribute: &str,
        constraints: &Map<String, JsonValue>,
    ) -> Result<()> {
        if constraints.is_empty() {
            return Err(Error::configuration(format!(
                "validates({}) needs at least one constraint",
                attribute
            )));
        }
        let chain = ValidatorChain::from_constraints(catalog, constraints)?;
        self.set_chain(attribute, chain);
        Ok(())
    }

    /// Install a prebuilt chain; an existing attribute keeps its position
    pub fn set_chain(&mut self, attribute: &str, chain: ValidatorChain) {
        match self.chains.iter_mut().find(|(name, _)| name == attribute) {
            Some((_, existing)) => *existing = chain,
            None => self.chains.push((attribute.to_string(), chain)),
        }
    }

    pub fn chain(&self, attribute: &str) -> Option<&ValidatorChain> {
        self.chains.iter().find(|(name, _)| name == attribute).map(|(_, chain)| chain)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.chains.iter().map(|(name, _)| name.as_str())
    }

    /// Run every chain against the values `lookup` returns
    pub fn run<'a, F>(&self, lookup: F, errors: &mut Errors)
    where
        F: Fn(&str) -> Option<&'a Value>,
    {
        for (attribute, chain) in &self.chains {
            chain.run(attribute, lookup(attribute), errors);
        }
    }
}
