//! Instances of synthesized types

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::coerce::{coerce, parse_datetime};
use crate::model::{ResourceType, TypeRegistry, Value};
use crate::query::{self, Related};
use crate::validation::Errors;

/// Keys the platform reserves for record metadata
pub const SYSTEM_KEYS: [&str; 5] = ["_id", "_createdAt", "_modifiedAt", "_owner", "_version"];

/// Record metadata owned by the platform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemFields {
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub owner: Option<String>,
    pub version: Option<i64>,
}

impl SystemFields {
    pub fn is_system_key(key: &str) -> bool {
        SYSTEM_KEYS.contains(&key)
    }

    /// Take a system value from a raw payload; returns false for other keys
    pub(crate) fn absorb(&mut self, key: &str, raw: &JsonValue) -> bool {
        let text = || match raw {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        };
        match key {
            "_id" => self.id = text(),
            "_createdAt" => self.created_at = raw.as_str().and_then(parse_datetime),
            "_modifiedAt" => self.modified_at = raw.as_str().and_then(parse_datetime),
            "_owner" => self.owner = text(),
            "_version" => {
                self.version = raw.as_i64().or_else(|| raw.as_str().and_then(|s| s.parse().ok()))
            }
            _ => return false,
        }
        true
    }

    /// Absorb every system key of a JSON object
    pub(crate) fn absorb_all(&mut self, payload: &Map<String, JsonValue>) {
        for (key, raw) in payload {
            self.absorb(key, raw);
        }
    }

    pub fn get(&self, key: &str) -> Option<JsonValue> {
        let at = |value: &Option<DateTime<Utc>>| {
            value.map(|at| JsonValue::String(at.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)))
        };
        match key {
            "_id" => self.id.clone().map(JsonValue::String),
            "_createdAt" => at(&self.created_at),
            "_modifiedAt" => at(&self.modified_at),
            "_owner" => self.owner.clone().map(JsonValue::String),
            "_version" => self.version.map(JsonValue::from),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Map<String, JsonValue> {
        SYSTEM_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
            .collect()
    }
}

/// A structurally typed record validated against its [`ResourceType`]
#[derive(Clone)]
pub struct Resource {
    ty: Arc<ResourceType>,
    registry: TypeRegistry,
    values: HashMap<String, Value>,
    extras: Map<String, JsonValue>,
    system: SystemFields,
    errors: Errors,
    context: Option<Context>,
}

impl Resource {
    /// Empty instance of `ty`
    pub fn new(registry: &TypeRegistry, ty: Arc<ResourceType>) -> Self {
        Self {
            ty,
            registry: registry.clone(),
            values: HashMap::new(),
            extras: Map::new(),
            system: SystemFields::default(),
            errors: Errors::new(),
            context: None,
        }
    }

    /// Construct from a JSON object, coercing registered properties
    ///
    /// Unknown keys are kept raw; system keys populate the system fields.
    pub fn from_json(registry: &TypeRegistry, ty: Arc<ResourceType>, raw: JsonValue) -> Result<Self> {
        match raw {
            JsonValue::Object(map) => Self::from_map(registry, ty, map),
            other => Err(Error::configuration(format!(
                "{} must be built from a JSON object, got {}",
                ty.name(),
                other
            ))),
        }
    }

    pub fn from_map(registry: &TypeRegistry, ty: Arc<ResourceType>, map: Map<String, JsonValue>) -> Result<Self> {
        let mut resource = Self::new(registry, ty);
        for (key, raw) in map {
            resource.assign(key, raw)?;
        }
        Ok(resource)
    }

    fn assign(&mut self, key: String, raw: JsonValue) -> Result<()> {
        if let Some(descriptor) = self.ty.property(&key) {
            match coerce(&self.registry, descriptor, raw)? {
                Some(value) => {
                    self.values.insert(key, value);
                }
                None => {
                    self.values.remove(&key);
                }
            }
        } else if !self.system.absorb(&key, &raw) {
            self.extras.insert(key, raw);
        }
        Ok(())
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn resource_type(&self) -> &Arc<ResourceType> {
        &self.ty
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Assign a raw value with the same coercion construction applies
    ///
    /// `null` unsets a property. System keys are not writable here.
    pub fn set(&mut self, name: &str, raw: impl Into<JsonValue>) -> Result<()> {
        if SystemFields::is_system_key(name) && self.ty.property(name).is_none() {
            return Err(Error::configuration(format!("{} is a read-only system field", name)));
        }
        self.assign(name.to_string(), raw.into())
    }

    /// Store an already typed value for a registered property
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<()> {
        if self.ty.property(name).is_none() {
            return Err(Error::configuration(format!(
                "{} has no property named {}",
                self.ty.name(),
                name
            )));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn extra(&self, key: &str) -> Option<&JsonValue> {
        self.extras.get(key)
    }

    pub fn extras(&self) -> &Map<String, JsonValue> {
        &self.extras
    }

    /// Registered properties with non-null values, in declaration order
    pub fn attributes(&self) -> Map<String, JsonValue> {
        let mut attributes = Map::new();
        for descriptor in self.ty.properties() {
            if let Some(value) = self.values.get(&descriptor.name) {
                let json = value.to_json();
                if !json.is_null() {
                    attributes.insert(descriptor.name.clone(), json);
                }
            }
        }
        attributes
    }

    /// Attributes plus system fields and raw extras
    pub fn to_json(&self) -> JsonValue {
        let mut json = self.system.to_json();
        json.extend(self.extras.clone());
        json.extend(self.attributes());
        JsonValue::Object(json)
    }

    /// Value of any field by name: property, system field or raw extra
    pub fn lookup(&self, field: &str) -> Option<JsonValue> {
        let found = match self.values.get(field) {
            Some(value) => Some(value.to_json()),
            None => self.system.get(field).or_else(|| self.extras.get(field).cloned()),
        };
        found.filter(|value| !value.is_null())
    }

    pub fn system(&self) -> &SystemFields {
        &self.system
    }

    pub(crate) fn system_mut(&mut self) -> &mut SystemFields {
        &mut self.system
    }

    pub fn id(&self) -> Option<&str> {
        self.system.id.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.system.created_at
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.system.modified_at
    }

    pub fn owner(&self) -> Option<&str> {
        self.system.owner.as_deref()
    }

    pub fn version(&self) -> Option<i64> {
        self.system.version
    }

    pub fn is_persisted(&self) -> bool {
        self.system.id.is_some()
    }

    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Clear the collector and run every declared chain
    pub fn validate(&mut self) -> &Errors {
        self.errors.clear();
        let values = &self.values;
        self.ty.validations().run(|name| values.get(name), &mut self.errors);
        &self.errors
    }

    pub fn is_valid(&mut self) -> bool {
        self.validate().is_empty()
    }

    pub fn is_invalid(&mut self) -> bool {
        !self.is_valid()
    }

    /// Validate and turn a non-empty collector into [`Error::Validation`]
    pub fn validate_strict(&mut self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::Validation(self.errors.clone()))
        }
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn attach(&mut self, context: Context) {
        self.context = Some(context);
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.attach(context);
        self
    }

    pub(crate) fn require_context(&self) -> Result<&Context> {
        self.context.as_ref().ok_or_else(|| {
            Error::configuration(format!("{} has no context attached", self.ty.name()))
        })
    }

    /// Persist through the attached context
    pub async fn create(&mut self) -> Result<()> {
        let context = self.require_context()?.clone();
        crate::persistence::create(&context, self).await
    }

    /// Delete the persisted record through the attached context
    pub async fn delete(&self) -> Result<()> {
        let context = self.require_context()?;
        crate::persistence::delete(context, self).await
    }

    /// Resolve a declared association; every call queries again
    pub async fn related(&self, association: &str) -> Result<Related> {
        let descriptor = self.ty.association(association).ok_or_else(|| {
            Error::configuration(format!(
                "{} has no association named {}",
                self.ty.name(),
                association
            ))
        })?;
        let context = self.require_context()?;
        query::relations::resolve(context, self, descriptor).await
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.ty.name() == other.ty.name()
            && self.system == other.system
            && self.attributes() == other.attributes()
            && self.extras == other.extras
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("type", &self.ty.name())
            .field("id", &self.system.id)
            .field("attributes", &self.attributes())
            .field("errors", &self.errors)
            .finish()
    }
}
