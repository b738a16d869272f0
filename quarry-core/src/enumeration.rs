//! Named value sets referenced by enumerated properties

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::transport::TransportRequest;

/// Cache of enumeration values, shared by clones
///
/// Populated explicitly with [`insert`](Self::insert) or
/// [`fetch`](Self::fetch) and cleared explicitly; nothing expires on its own.
#[derive(Debug, Clone, Default)]
pub struct EnumerationCache {
    entries: Arc<RwLock<HashMap<String, Vec<JsonValue>>>>,
}

impl EnumerationCache {
    pub fn new() -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn insert(&self, name: impl Into<String>, values: Vec<JsonValue>) {
        self.entries.write().expect("enumeration cache lock poisoned").insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<Vec<JsonValue>> {
        self.entries.read().expect("enumeration cache lock poisoned").get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().expect("enumeration cache lock poisoned").contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<Vec<JsonValue>> {
        self.entries.write().expect("enumeration cache lock poisoned").remove(name)
    }

    pub fn clear(&self) {
        self.entries.write().expect("enumeration cache lock poisoned").clear();
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.entries.read().expect("enumeration cache lock poisoned").keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("enumeration cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load one enumeration from `GET /{namespace}/enumerations/{name}`
    ///
    /// The body may be the value list itself or `{"values": [...]}`.
    pub async fn fetch(&self, context: &Context, name: &str) -> Result<Vec<JsonValue>> {
        let path = format!("/{}/enumerations/{}", context.namespace(), name);
        let response = context.send(TransportRequest::get(path)).await?;
        let values = match response.body_json()? {
            JsonValue::Array(values) => values,
            JsonValue::Object(mut body) => match body.remove("values") {
                Some(JsonValue::Array(values)) => values,
                _ => {
                    return Err(Error::unexpected(format!(
                        "enumeration {} response has no values list",
                        name
                    )))
                }
            },
            other => {
                return Err(Error::unexpected(format!(
                    "enumeration {} response is not a list: {}",
                    name, other
                )))
            }
        };
        log::debug!("Cached enumeration {} ({} values)", name, values.len());
        self.insert(name, values.clone());
        Ok(values)
    }

    /// Fetch several enumerations in order
    pub async fn populate(&self, context: &Context, names: &[&str]) -> Result<()> {
        for name in names {
            self.fetch(context, name).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context_with, MockTransport};
    use crate::transport::TransportResponse;
    use serde_json::json;

    #[test]
    fn test_clones_share_entries() {
        let cache = EnumerationCache::new();
        let other = cache.clone();
        cache.insert("Color", vec![json!("red")]);
        assert_eq!(other.get("Color"), Some(vec![json!("red")]));

        other.insert("Color", vec![json!("blue")]);
        assert_eq!(cache.get("Color"), Some(vec![json!("blue")]));

        cache.clear();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_accepts_both_body_shapes() {
        let transport = MockTransport::new();
        transport.respond(TransportResponse::json(200, json!(["S", "M", "L"])));
        transport.respond(TransportResponse::json(200, json!({ "values": [1, 2] })));
        let context = context_with(&transport);

        let cache = EnumerationCache::new();
        cache.populate(&context, &["Size", "Level"]).await.unwrap();

        assert_eq!(cache.names(), vec!["Level", "Size"]);
        assert_eq!(cache.get("Level"), Some(vec![json!(1), json!(2)]));
        let paths: Vec<String> = transport.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/acme/enumerations/Size", "/acme/enumerations/Level"]);
    }

    #[tokio::test]
    async fn test_fetch_rejects_unexpected_shape() {
        let transport = MockTransport::new();
        transport.respond(TransportResponse::json(200, json!({ "items": [] })));
        let context = context_with(&transport);

        let err = EnumerationCache::new().fetch(&context, "Size").await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }
}
