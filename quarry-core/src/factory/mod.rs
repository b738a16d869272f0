//! Randomized instance generation
//!
//! A [`Factory`] keeps one generator per attribute, in declaration order.
//! Defaults derive from the declared type and constraints; any attribute can
//! be given a custom zero-argument closure instead.
//!
//! ```rust,ignore
//! let factory = Factory::new(&registry.require("Widget")?)
//!     .generator("label", || json!("fixed"));
//! registry.register_factory(factory);
//!
//! let widgets = registry.build_list("Widget", 3, json!({ "count": 1 }))?;
//! ```

pub mod generators;
pub mod pattern;

use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::{Resource, ResourceType, TypeRegistry};
use crate::persistence::{self, BatchFailure, BatchOutcome};
use crate::schema::PropertyDescriptor;

/// User-supplied generator
pub type GeneratorFn = Arc<dyn Fn() -> JsonValue + Send + Sync>;

#[derive(Clone)]
pub enum Generator {
    /// Derived from the property's declared type and constraints
    Default(PropertyDescriptor),
    Custom(GeneratorFn),
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generator::Default(descriptor) => write!(f, "Default({})", descriptor.declared_type),
            Generator::Custom(_) => f.write_str("Custom"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Factory {
    type_name: String,
    generators: Vec<(String, Generator)>,
}

impl Factory {
    /// Default generators for every property of `ty`
    pub fn new(ty: &ResourceType) -> Self {
        Self {
            type_name: ty.name().to_string(),
            generators: ty
                .properties()
                .iter()
                .map(|descriptor| (descriptor.name.clone(), Generator::Default(descriptor.clone())))
                .collect(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Attributes with a generator, in order
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.generators.iter().map(|(name, _)| name.as_str())
    }

    /// Replace (or add) the generator of `attribute`
    pub fn generator<F>(mut self, attribute: &str, generate: F) -> Self
    where
        F: Fn() -> JsonValue + Send + Sync + 'static,
    {
        let generator = Generator::Custom(Arc::new(generate));
        match self.generators.iter_mut().find(|(name, _)| name == attribute) {
            Some(slot) => slot.1 = generator,
            None => self.generators.push((attribute.to_string(), generator)),
        }
        self
    }

    /// Stop generating `attribute`
    pub fn without(mut self, attribute: &str) -> Self {
        self.generators.retain(|(name, _)| name != attribute);
        self
    }

    /// Generated attributes for every generator not shadowed by `overrides`
    pub(crate) fn generate(
        &self,
        registry: &TypeRegistry,
        overrides: &Map<String, JsonValue>,
        visiting: &mut Vec<String>,
    ) -> Result<Map<String, JsonValue>> {
        let mut rng = rand::thread_rng();
        let mut attributes = Map::new();
        for (name, generator) in &self.generators {
            if overrides.contains_key(name) {
                continue;
            }
            let value = match generator {
                Generator::Custom(generate) => Some(generate()),
                Generator::Default(descriptor) => {
                    generators::generate(&mut rng, registry, descriptor, visiting)?
                }
            };
            if let Some(value) = value {
                attributes.insert(name.clone(), value);
            }
        }
        Ok(attributes)
    }

    /// One instance; `overrides` (an object or null) always wins
    pub fn build(&self, registry: &TypeRegistry, overrides: JsonValue) -> Result<Resource> {
        let overrides = override_map(&self.type_name, overrides)?;
        self.build_with(registry, &overrides)
    }

    /// `count` instances, each generator invoked afresh
    pub fn build_list(&self, registry: &TypeRegistry, count: usize, overrides: JsonValue) -> Result<Vec<Resource>> {
        let overrides = override_map(&self.type_name, overrides)?;
        (0..count).map(|_| self.build_with(registry, &overrides)).collect()
    }

    fn build_with(&self, registry: &TypeRegistry, overrides: &Map<String, JsonValue>) -> Result<Resource> {
        let ty = registry.require(&self.type_name)?;
        let mut visiting = vec![self.type_name.clone()];
        let mut attributes = self.generate(registry, overrides, &mut visiting)?;
        attributes.extend(overrides.clone());
        Resource::from_map(registry, ty, attributes)
    }

    /// Build and persist one instance
    pub async fn create(&self, registry: &TypeRegistry, context: &Context, overrides: JsonValue) -> Result<Resource> {
        let mut resource = self.build(registry, overrides)?;
        persistence::create(context, &mut resource).await?;
        Ok(resource)
    }

    /// Build `count` instances and persist them one by one
    ///
    /// A failed create lands in `failed` and does not stop the others.
    /// Build errors abort before anything is sent.
    pub async fn create_list(
        &self,
        registry: &TypeRegistry,
        context: &Context,
        count: usize,
        overrides: JsonValue,
    ) -> Result<BatchOutcome> {
        let records = self.build_list(registry, count, overrides)?;
        let mut outcome = BatchOutcome::default();
        for (index, mut record) in records.into_iter().enumerate() {
            match persistence::create(context, &mut record).await {
                Ok(()) => outcome.created.push(record),
                Err(error) => {
                    log::error!("Creating {} #{} failed: {}", self.type_name, index + 1, error);
                    outcome.failed.push(BatchFailure { record, error });
                }
            }
        }
        Ok(outcome)
    }
}

fn override_map(type_name: &str, overrides: JsonValue) -> Result<Map<String, JsonValue>> {
    match overrides {
        JsonValue::Null => Ok(Map::new()),
        JsonValue::Object(map) => Ok(map),
        other => Err(Error::configuration(format!(
            "overrides for {} must be an object, got {}",
            type_name, other
        ))),
    }
}
