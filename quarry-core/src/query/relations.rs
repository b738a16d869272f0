//! Association resolution
//!
//! Every call builds fresh queries; nothing is cached between accesses.

use serde_json::{json, Map, Value as JsonValue};

use crate::context::Context;
use crate::error::Result;
use crate::model::Resource;
use crate::schema::AssociationDescriptor;

/// Records reached through an association
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// has-one and belongs-to
    One(Option<Resource>),
    /// has-many
    Many(Vec<Resource>),
}

impl Related {
    /// The single record, or the first of many
    pub fn one(self) -> Option<Resource> {
        match self {
            Related::One(record) => record,
            Related::Many(records) => records.into_iter().next(),
        }
    }

    pub fn many(self) -> Vec<Resource> {
        match self {
            Related::One(record) => record.into_iter().collect(),
            Related::Many(records) => records,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Related::One(record) => usize::from(record.is_some()),
            Related::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn empty(descriptor: &AssociationDescriptor) -> Self {
        if descriptor.kind.is_singular() {
            Related::One(None)
        } else {
            Related::Many(Vec::new())
        }
    }
}

/// `{key: value}`, or `{key: {"$in": value}}` for a list
fn match_criterion(key: &str, value: JsonValue) -> JsonValue {
    let mut criterion = Map::new();
    let value = match value {
        JsonValue::Array(values) => json!({ "$in": values }),
        scalar => scalar,
    };
    criterion.insert(key.to_string(), value);
    JsonValue::Object(criterion)
}

/// Filter linking `source` to the association's targets, if it has the key
fn direct_criterion(source: &Resource, descriptor: &AssociationDescriptor) -> Option<JsonValue> {
    let value = source.lookup(descriptor.source_key());
    if value.is_none() {
        log::debug!(
            "{}.{} has no {}; nothing to resolve",
            source.type_name(),
            descriptor.name,
            descriptor.source_key()
        );
    }
    value.map(|value| match_criterion(descriptor.target_key(), value))
}

async fn fetch(
    context: &Context,
    source: &Resource,
    descriptor: &AssociationDescriptor,
    criterion: JsonValue,
) -> Result<Related> {
    let mut query = source.registry().query(&descriptor.target)?.with_context(context.clone()).filter(criterion)?;
    if !descriptor.criteria.is_empty() {
        query = query.and(JsonValue::Object(descriptor.criteria.clone()))?;
    }
    if descriptor.kind.is_singular() {
        Ok(Related::One(query.first().await?))
    } else {
        Ok(Related::Many(query.all().await?))
    }
}

/// Resolve `descriptor` for `source`
///
/// With `through`, the intermediate association is resolved first and the
/// linking values read from each intermediate record are matched with `$in`.
pub async fn resolve(context: &Context, source: &Resource, descriptor: &AssociationDescriptor) -> Result<Related> {
    let criterion = match &descriptor.through {
        None => match direct_criterion(source, descriptor) {
            Some(criterion) => criterion,
            None => return Ok(Related::empty(descriptor)),
        },
        Some(through) => {
            let Some(first_hop) = direct_criterion(source, through) else {
                return Ok(Related::empty(descriptor));
            };
            let intermediates = fetch(context, source, through, first_hop).await?.many();
            let mut links: Vec<JsonValue> = Vec::new();
            for record in &intermediates {
                let values = match record.lookup(descriptor.source_key()) {
                    Some(JsonValue::Array(values)) => values,
                    Some(value) => vec![value],
                    None => Vec::new(),
                };
                for value in values {
                    if !links.contains(&value) {
                        links.push(value);
                    }
                }
            }
            if links.is_empty() {
                return Ok(Related::empty(descriptor));
            }
            match_criterion(descriptor.target_key(), JsonValue::Array(links))
        }
    };
    fetch(context, source, descriptor, criterion).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeRegistry;
    use crate::schema::{AssociationOptions, DeclaredType, PropertyOptions};
    use crate::testing::{context_with, MockTransport};
    use crate::transport::TransportResponse;
    use pretty_assertions::assert_eq;

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new("acme");
        registry
            .define("Author")
            .property("name", PropertyOptions::new(DeclaredType::String))
            .unwrap()
            .has_many("posts", AssociationOptions::new("Post"))
            .unwrap()
            .has_many("tags", AssociationOptions::new("Tag").through("posts"))
            .unwrap()
            .has_one("profile", AssociationOptions::new("Profile").criteria(json!({ "public": true })).unwrap())
            .unwrap()
            .register();
        registry
            .define("Post")
            .property("title", PropertyOptions::new(DeclaredType::String))
            .unwrap()
            .property("tag_id", PropertyOptions::new(DeclaredType::String).multi())
            .unwrap()
            .belongs_to("author", AssociationOptions::new("Author"))
            .unwrap()
            .register();
        registry.define("Tag").property("label", PropertyOptions::new(DeclaredType::String)).unwrap().register();
        registry.define("Profile").property("bio", PropertyOptions::new(DeclaredType::String)).unwrap().register();
        registry
    }

    fn paths(transport: &MockTransport) -> Vec<String> {
        transport.requests().into_iter().map(|r| r.path).collect()
    }

    #[tokio::test]
    async fn test_belongs_to_reads_foreign_key_from_source() {
        let registry = registry();
        let transport = MockTransport::new();
        transport.respond(TransportResponse::json(200, json!([{ "_id": "A1", "name": "Ada" }])));
        let context = context_with(&transport);

        let post = registry.instantiate("Post", json!({ "author_id": "A1" })).unwrap().with_context(context);
        let author = post.related("author").await.unwrap().one().unwrap();

        assert_eq!(author.lookup("name"), Some(json!("Ada")));
        assert_eq!(paths(&transport), vec![r#"/acme/resources/Author?where={"_id":"A1"}&paging=limit:1"#]);
    }

    #[tokio::test]
    async fn test_missing_key_resolves_empty_without_network() {
        let registry = registry();
        let transport = MockTransport::new();
        let post = registry.instantiate("Post", json!({})).unwrap().with_context(context_with(&transport));

        assert_eq!(post.related("author").await.unwrap(), Related::One(None));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_static_criteria_become_second_criterion() {
        let registry = registry();
        let transport = MockTransport::new();
        transport.respond(TransportResponse::json(200, json!([])));
        let author = registry
            .instantiate("Author", json!({ "_id": "A1" }))
            .unwrap()
            .with_context(context_with(&transport));

        assert!(author.related("profile").await.unwrap().is_empty());
        assert_eq!(
            paths(&transport),
            vec![r#"/acme/resources/Profile?where={"$and":[{"author_id":"A1"},{"public":true}]}&paging=limit:1"#]
        );
    }

    #[tokio::test]
    async fn test_through_collects_linking_values() {
        let registry = registry();
        let transport = MockTransport::new();
        transport.respond(TransportResponse::json(
            200,
            json!([
                { "_id": "P1", "tag_id": ["T1", "T2"] },
                { "_id": "P2", "tag_id": ["T2"] },
                { "_id": "P3" }
            ]),
        ));
        transport.respond(TransportResponse::json(200, json!([{ "_id": "T1" }, { "_id": "T2" }])));
        let author = registry
            .instantiate("Author", json!({ "_id": "A1" }))
            .unwrap()
            .with_context(context_with(&transport));

        let tags = author.related("tags").await.unwrap().many();
        assert_eq!(tags.len(), 2);
        assert_eq!(
            paths(&transport),
            vec![
                r#"/acme/resources/Post?where={"author_id":"A1"}"#.to_string(),
                r#"/acme/resources/Tag?where={"_id":{"$in":["T1","T2"]}}"#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_association_is_configuration_error() {
        let registry = registry();
        let transport = MockTransport::new();
        let post = registry.instantiate("Post", json!({})).unwrap().with_context(context_with(&transport));
        assert!(post.related("comments").await.unwrap_err().is_configuration());

        let detached = registry.instantiate("Post", json!({ "author_id": "A1" })).unwrap();
        assert!(detached.related("author").await.unwrap_err().is_configuration());
    }
}
