//! Schema documents as delivered by the platform

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::schema::relations::AssociationSpec;
use crate::schema::IndexSpec;
use crate::transport::TransportRequest;

/// Input of the synthesizer
///
/// `properties` keeps the document's key order, which becomes the
/// declaration order of the synthesized type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default, alias = "propertiesByName")]
    pub properties: Map<String, JsonValue>,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
    #[serde(default)]
    pub associations: Vec<AssociationSpec>,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            package: None,
            properties: Map::new(),
            indexes: Vec::new(),
            associations: Vec::new(),
        }
    }

    pub fn from_json(value: JsonValue) -> Result<Self> {
        let definition: TypeDefinition = serde_json::from_value(value)
            .map_err(|e| Error::configuration(format!("malformed type definition: {}", e)))?;
        if definition.name.trim().is_empty() {
            return Err(Error::configuration("type definition needs a name"));
        }
        Ok(definition)
    }
}

/// Fetch a type definition from `GET /{namespace}/schemas/{name}`
pub async fn fetch_definition(context: &Context, name: &str) -> Result<TypeDefinition> {
    let path = format!("/{}/schemas/{}", context.namespace(), name);
    let response = context.send(TransportRequest::get(path)).await?;
    let body = response.body_json()?;
    TypeDefinition::from_json(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_properties_keep_document_order() {
        let definition = TypeDefinition::from_json(json!({
            "name": "Widget",
            "propertiesByName": {
                "zeta": { "type": "String" },
                "alpha": { "type": "Integer" },
                "mid": { "type": "Boolean" }
            },
            "indexes": [{ "name": "by_zeta", "fields": ["zeta"], "unique": true }]
        }))
        .unwrap();

        assert_eq!(definition.properties.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert!(definition.indexes[0].unique);
        assert!(definition.associations.is_empty());
    }

    #[test]
    fn test_nameless_definition_is_rejected() {
        assert!(TypeDefinition::from_json(json!({ "name": "" })).unwrap_err().is_configuration());
        assert!(TypeDefinition::from_json(json!({ "properties": {} })).is_err());
    }
}
