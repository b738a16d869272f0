//! Type registry: resource types, their factories and the validator catalog

use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::enumeration::EnumerationCache;
use crate::error::{Error, Result};
use crate::factory::Factory;
use crate::model::Resource;
use crate::query::Query;
use crate::schema::{
    AssociationDescriptor, AssociationKind, AssociationOptions, IndexSpec, PropertyDescriptor,
    PropertyOptions,
};
use crate::validation::rules::{self, MultiValidator, RequiredValidator};
use crate::validation::{ValidationEngine, Validator, ValidatorCatalog, ValidatorChain};

/// Structural descriptor of a synthesized type
#[derive(Debug)]
pub struct ResourceType {
    name: String,
    namespace: String,
    package: Option<String>,
    properties: Vec<PropertyDescriptor>,
    validations: ValidationEngine,
    associations: Vec<AssociationDescriptor>,
    indexes: Vec<IndexSpec>,
}

impl ResourceType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Properties in declaration order
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn validations(&self) -> &ValidationEngine {
        &self.validations
    }

    pub fn associations(&self) -> &[AssociationDescriptor] {
        &self.associations
    }

    pub fn association(&self, name: &str) -> Option<&AssociationDescriptor> {
        self.associations.iter().find(|a| a.name == name)
    }

    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// `/{namespace}/resources/{type}`
    pub fn resource_path(&self) -> String {
        format!("/{}/resources/{}", self.namespace, self.name)
    }
}

struct RegistryInner {
    namespace: String,
    types: RwLock<HashMap<String, Arc<ResourceType>>>,
    factories: RwLock<HashMap<String, Arc<Factory>>>,
    catalog: RwLock<ValidatorCatalog>,
    enumerations: EnumerationCache,
}

/// Registry of synthesized types
///
/// Cloning yields another handle on the same registry. Registrations are
/// last-write-wins.
#[derive(Clone)]
pub struct TypeRegistry {
    inner: Arc<RegistryInner>,
}

impl TypeRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_enumerations(namespace, EnumerationCache::new())
    }

    /// Registry whose enumerated validators and generators read `enumerations`
    pub fn with_enumerations(namespace: impl Into<String>, enumerations: EnumerationCache) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                namespace: namespace.into(),
                types: RwLock::new(HashMap::new()),
                factories: RwLock::new(HashMap::new()),
                catalog: RwLock::new(ValidatorCatalog::new(enumerations.clone())),
                enumerations,
            }),
        }
    }

    /// Default namespace for types that do not declare one
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn enumerations(&self) -> &EnumerationCache {
        &self.inner.enumerations
    }

    /// Start declaring a type
    pub fn define(&self, name: impl Into<String>) -> TypeBuilder {
        TypeBuilder::new(self.clone(), name.into())
    }

    /// Register a type, replacing any type of the same name and its factory
    pub fn insert(&self, ty: ResourceType) -> Arc<ResourceType> {
        let ty = Arc::new(ty);
        let previous = self
            .inner
            .types
            .write()
            .expect("type registry lock poisoned")
            .insert(ty.name.clone(), ty.clone());
        if previous.is_some() {
            log::debug!("Replaced type {}", ty.name);
            self.inner.factories.write().expect("factory registry lock poisoned").remove(&ty.name);
        }
        ty
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResourceType>> {
        self.inner.types.read().expect("type registry lock poisoned").get(name).cloned()
    }

    pub fn require(&self, name: &str) -> Result<Arc<ResourceType>> {
        self.get(name)
            .ok_or_else(|| Error::configuration(format!("unknown resource type: {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.types.read().expect("type registry lock poisoned").contains_key(name)
    }

    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.inner.types.read().expect("type registry lock poisoned").keys().cloned().collect();
        names.sort();
        names
    }

    /// Build an instance from raw JSON
    pub fn instantiate(&self, name: &str, raw: JsonValue) -> Result<Resource> {
        Resource::from_json(self, self.require(name)?, raw)
    }

    /// Query builder over a type
    pub fn query(&self, name: &str) -> Result<Query> {
        Ok(Query::new(self.clone(), self.require(name)?))
    }

    /// The factory registered for a type, or a default one
    pub fn factory(&self, name: &str) -> Result<Arc<Factory>> {
        if let Some(factory) =
            self.inner.factories.read().expect("factory registry lock poisoned").get(name)
        {
            return Ok(factory.clone());
        }
        let ty = self.require(name)?;
        Ok(Arc::new(Factory::new(&ty)))
    }

    /// Install a customised factory; embedded generation uses it too
    pub fn register_factory(&self, factory: Factory) {
        self.inner
            .factories
            .write()
            .expect("factory registry lock poisoned")
            .insert(factory.type_name().to_string(), Arc::new(factory));
    }

    pub fn build(&self, name: &str, overrides: JsonValue) -> Result<Resource> {
        self.factory(name)?.build(self, overrides)
    }

    pub fn build_list(&self, name: &str, count: usize, overrides: JsonValue) -> Result<Vec<Resource>> {
        self.factory(name)?.build_list(self, count, overrides)
    }

    /// Add a validator constructor to this registry's catalog
    pub fn register_validator<V, F>(&self, build: F)
    where
        V: Validator + 'static,
        F: Fn(&JsonValue) -> Result<V> + Send + Sync + 'static,
    {
        self.inner.catalog.write().expect("validator catalog lock poisoned").register::<V, F>(build);
    }

    pub fn resolve_validator(&self, key: &str, argument: &JsonValue) -> Result<Box<dyn Validator>> {
        self.inner.catalog.read().expect("validator catalog lock poisoned").resolve(key, argument)
    }

    fn catalog(&self) -> std::sync::RwLockReadGuard<'_, ValidatorCatalog> {
        self.inner.catalog.read().expect("validator catalog lock poisoned")
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("namespace", &self.inner.namespace)
            .field("types", &self.type_names())
            .finish()
    }
}

/// Declares a type: properties, validations, associations and indexes
#[derive(Debug)]
pub struct TypeBuilder {
    registry: TypeRegistry,
    name: String,
    namespace: Option<String>,
    package: Option<String>,
    properties: Vec<PropertyDescriptor>,
    validations: ValidationEngine,
    associations: Vec<AssociationDescriptor>,
    indexes: Vec<IndexSpec>,
}

impl TypeBuilder {
    fn new(registry: TypeRegistry, name: String) -> Self {
        Self {
            registry,
            name,
            namespace: None,
            package: None,
            properties: Vec::new(),
            validations: ValidationEngine::new(),
            associations: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Register a property and derive its validator chain
    ///
    /// The chain is `required`, `multi`, the type check, then the remaining
    /// constraints in declaration order. Redeclaring a property replaces it.
    pub fn property(mut self, name: &str, options: PropertyOptions) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::configuration(format!("property of {} needs a name", self.name)));
        }
        let descriptor = PropertyDescriptor::new(name, options);

        let mut chain = ValidatorChain::new();
        if descriptor.required {
            chain.push(Box::new(RequiredValidator));
        }
        if descriptor.multi {
            chain.push(Box::new(MultiValidator));
        }
        chain.push(rules::type_check(&descriptor.declared_type, self.registry.enumerations()));
        {
            let catalog = self.registry.catalog();
            for (key, argument) in &descriptor.constraints {
                chain.push(catalog.resolve(key, argument).map_err(|e| {
                    Error::configuration(format!("{}.{}: {}", self.name, name, e))
                })?);
            }
        }
        self.validations.set_chain(name, chain);

        match self.properties.iter_mut().find(|p| p.name == descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => self.properties.push(descriptor),
        }
        Ok(self)
    }

    /// Declare (or redeclare) the constraints of an attribute
    pub fn validates(mut self, attribute: &str, constraints: JsonValue) -> Result<Self> {
        let constraints: Map<String, JsonValue> = match constraints {
            JsonValue::Object(map) => map,
            other => {
                return Err(Error::configuration(format!(
                    "validates({}) expects an object of constraints, got {}",
                    attribute, other
                )))
            }
        };
        self.validations.validates(&self.registry.catalog(), attribute, &constraints)?;
        Ok(self)
    }

    pub fn associate(mut self, name: &str, kind: AssociationKind, options: AssociationOptions) -> Result<Self> {
        let descriptor =
            AssociationDescriptor::build(&self.name, name, kind, options, &self.associations)?;
        match self.associations.iter_mut().find(|a| a.name == descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => self.associations.push(descriptor),
        }
        Ok(self)
    }

    pub fn has_one(self, name: &str, options: AssociationOptions) -> Result<Self> {
        self.associate(name, AssociationKind::HasOne, options)
    }

    pub fn has_many(self, name: &str, options: AssociationOptions) -> Result<Self> {
        self.associate(name, AssociationKind::HasMany, options)
    }

    pub fn belongs_to(self, name: &str, options: AssociationOptions) -> Result<Self> {
        self.associate(name, AssociationKind::BelongsTo, options)
    }

    pub fn index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    /// Finish the declaration without registering it
    pub fn build(self) -> (TypeRegistry, ResourceType) {
        let namespace = self.namespace.unwrap_or_else(|| self.registry.namespace().to_string());
        let ty = ResourceType {
            name: self.name,
            namespace,
            package: self.package,
            properties: self.properties,
            validations: self.validations,
            associations: self.associations,
            indexes: self.indexes,
        };
        (self.registry, ty)
    }

    pub fn register(self) -> Arc<ResourceType> {
        let (registry, ty) = self.build();
        registry.insert(ty)
    }
}
