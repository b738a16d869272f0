//! Turns type definitions into registered resource types

use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{ResourceType, TypeRegistry};
use crate::schema::{PropertyOptions, TypeDefinition};

/// Registers synthesized types into a [`TypeRegistry`]
#[derive(Debug, Clone)]
pub struct Synthesizer<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> Synthesizer<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Synthesize one type; an existing type of the same name is replaced
    ///
    /// Embedded and enumerated references are not checked here. They are
    /// looked up when instances are constructed, so definitions may refer
    /// to types synthesized later.
    pub fn synthesize(&self, definition: &TypeDefinition) -> Result<Arc<ResourceType>> {
        let mut builder = self.registry.define(&definition.name);
        if let Some(namespace) = &definition.namespace {
            builder = builder.namespace(namespace);
        }
        if let Some(package) = &definition.package {
            builder = builder.package(package);
        }

        for (name, schema) in &definition.properties {
            let options = PropertyOptions::from_schema(schema).map_err(|e| {
                log::error!("Property {}.{} rejected: {}", definition.name, name, e);
                e
            })?;
            builder = builder.property(name, options)?;
        }
        for index in &definition.indexes {
            builder = builder.index(index.clone());
        }
        for association in &definition.associations {
            builder = builder.associate(&association.name, association.kind, association.options())?;
        }

        let ty = builder.register();
        log::info!(
            "Synthesized type {} ({} properties, {} associations)",
            ty.name(),
            ty.properties().len(),
            ty.associations().len()
        );
        Ok(ty)
    }

    pub fn synthesize_json(&self, definition: JsonValue) -> Result<Arc<ResourceType>> {
        self.synthesize(&TypeDefinition::from_json(definition)?)
    }

    /// Synthesize several definitions in order, stopping at the first failure
    pub fn synthesize_all(&self, definitions: &[TypeDefinition]) -> Result<Vec<Arc<ResourceType>>> {
        definitions.iter().map(|definition| self.synthesize(definition)).collect()
    }
}
