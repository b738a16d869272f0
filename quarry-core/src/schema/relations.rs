//! Association declarations between synthesized types
//!
//! This module holds the declarative half: kinds, options, the serde form
//! used in schema documents and the resolved [`AssociationDescriptor`].
//! Resolution against the platform lives in [`crate::query::relations`].

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};

/// Identifier field every platform record carries
pub const DEFAULT_PRIMARY_KEY: &str = "_id";

/// Supported association kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssociationKind {
    /// One target record points at the source
    #[serde(rename = "hasOne", alias = "has_one")]
    HasOne,
    /// Many target records point at the source
    #[serde(rename = "hasMany", alias = "has_many")]
    HasMany,
    /// The source points at one target record
    #[serde(rename = "belongsTo", alias = "belongs_to")]
    BelongsTo,
}

impl AssociationKind {
    /// Whether resolution yields a single record
    pub fn is_singular(&self) -> bool {
        !matches!(self, AssociationKind::HasMany)
    }
}

/// Association entry of a schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssociationSpec {
    pub name: String,
    pub kind: AssociationKind,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub through: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub criteria: Map<String, JsonValue>,
}

impl AssociationSpec {
    pub fn options(&self) -> AssociationOptions {
        AssociationOptions {
            target: self.target.clone(),
            foreign_key: self.foreign_key.clone(),
            primary_key: self.primary_key.clone(),
            through: self.through.clone(),
            criteria: self.criteria.clone(),
        }
    }
}

/// Builder for `has_one` / `has_many` / `belongs_to` declarations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationOptions {
    pub target: String,
    pub foreign_key: Option<String>,
    pub primary_key: Option<String>,
    /// Name of an association declared earlier on the same type
    pub through: Option<String>,
    pub criteria: Map<String, JsonValue>,
}

impl AssociationOptions {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into(), ..Default::default() }
    }

    pub fn foreign_key(mut self, field: impl Into<String>) -> Self {
        self.foreign_key = Some(field.into());
        self
    }

    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = Some(field.into());
        self
    }

    pub fn through(mut self, association: impl Into<String>) -> Self {
        self.through = Some(association.into());
        self
    }

    /// Static criteria added to every resolution query
    pub fn criteria(mut self, criteria: JsonValue) -> Result<Self> {
        match criteria {
            JsonValue::Object(map) => {
                self.criteria.extend(map);
                Ok(self)
            }
            other => Err(Error::configuration(format!(
                "association criteria must be an object, got {}",
                other
            ))),
        }
    }
}

/// Fully resolved association, owned by the declaring type
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationDescriptor {
    pub name: String,
    pub kind: AssociationKind,
    pub target: String,
    pub foreign_key: String,
    pub primary_key: String,
    pub through: Option<Box<AssociationDescriptor>>,
    pub criteria: Map<String, JsonValue>,
}

/// `ParentItem` -> `parent_item_id`
pub fn key_for(type_name: &str) -> String {
    format!("{}_id", type_name.to_case(Case::Snake))
}

impl AssociationDescriptor {
    /// Apply key defaults and resolve `through` against earlier declarations
    ///
    /// Without `through`, has-one/has-many default to
    /// `foreign_key = <declaring>_id` on the target and `primary_key = _id`
    /// on the source, belongs-to to `foreign_key = <target>_id` on the source
    /// and `primary_key = _id` on the target. With `through`, the linking
    /// value is read from `primary_key` (default `<target>_id`) of each
    /// intermediate record and matched against the target's `foreign_key`
    /// (default `_id`).
    pub fn build(
        declaring: &str,
        name: &str,
        kind: AssociationKind,
        options: AssociationOptions,
        declared: &[AssociationDescriptor],
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::configuration(format!(
                "association on {} needs a name",
                declaring
            )));
        }
        let target = options.target.trim().to_string();
        if target.is_empty() {
            return Err(Error::configuration(format!(
                "association {}.{} needs a target type",
                declaring, name
            )));
        }
        for key in [&options.foreign_key, &options.primary_key].into_iter().flatten() {
            if key.trim().is_empty() {
                return Err(Error::configuration(format!(
                    "association {}.{} has a blank key",
                    declaring, name
                )));
            }
        }

        let through = match options.through.as_deref() {
            None => None,
            Some(_) if kind == AssociationKind::BelongsTo => {
                return Err(Error::configuration(format!(
                    "belongs_to association {}.{} cannot go through another association",
                    declaring, name
                )))
            }
            Some(via) => {
                let intermediate = declared.iter().find(|a| a.name == via).ok_or_else(|| {
                    Error::configuration(format!(
                        "association {}.{} goes through undeclared association {}",
                        declaring, name, via
                    ))
                })?;
                if intermediate.through.is_some() {
                    return Err(Error::configuration(format!(
                        "association {}.{} cannot go through {}, which is itself indirect",
                        declaring, name, via
                    )));
                }
                Some(Box::new(intermediate.clone()))
            }
        };

        let (default_foreign, default_primary) = match (kind, &through) {
            (AssociationKind::BelongsTo, _) => (key_for(&target), DEFAULT_PRIMARY_KEY.to_string()),
            (_, Some(_)) => (DEFAULT_PRIMARY_KEY.to_string(), key_for(&target)),
            (_, None) => (key_for(declaring), DEFAULT_PRIMARY_KEY.to_string()),
        };

        Ok(Self {
            name: name.to_string(),
            kind,
            target,
            foreign_key: options.foreign_key.unwrap_or(default_foreign),
            primary_key: options.primary_key.unwrap_or(default_primary),
            through,
            criteria: options.criteria,
        })
    }

    /// Field read from the source (or intermediate) record
    pub fn source_key(&self) -> &str {
        match self.kind {
            AssociationKind::BelongsTo => &self.foreign_key,
            _ => &self.primary_key,
        }
    }

    /// Field of the target type the linking value is matched against
    pub fn target_key(&self) -> &str {
        match self.kind {
            AssociationKind::BelongsTo => &self.primary_key,
            _ => &self.foreign_key,
        }
    }
}
