//! Query builder
//!
//! A [`Query`] accumulates criteria, a projection, paging and sorting, and
//! serializes them into the platform's URL grammar:
//!
//! ```text
//! /{namespace}/resources/{type}?where=<json>&fields=a,b&paging=page:P,limit:L&sort=field:order
//! ```
//!
//! Each part appears only when set. One criterion is serialized as is;
//! several are wrapped in `{"$and":[...]}` in the order they were added.
//! `url()` performs no encoding; that is the transport's job.

pub mod relations;

pub use relations::Related;

use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::{Resource, ResourceType, TypeRegistry};
use crate::transport::TransportRequest;

/// Largest page the platform serves
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chainable, reusable request description over one resource type
#[derive(Clone)]
pub struct Query {
    registry: TypeRegistry,
    ty: Arc<ResourceType>,
    context: Option<Context>,
    criteria: Vec<JsonValue>,
    fields: Vec<String>,
    page: Option<u64>,
    limit: Option<u64>,
    sort: Option<(String, Option<SortOrder>)>,
}

impl Query {
    pub fn new(registry: TypeRegistry, ty: Arc<ResourceType>) -> Self {
        Self {
            registry,
            ty,
            context: None,
            criteria: Vec::new(),
            fields: Vec::new(),
            page: None,
            limit: None,
            sort: None,
        }
    }

    pub fn resource_type(&self) -> &Arc<ResourceType> {
        &self.ty
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Append a criterion: a JSON object, or a string holding one
    pub fn filter(mut self, criterion: impl Into<JsonValue>) -> Result<Self> {
        let criterion = match criterion.into() {
            JsonValue::String(text) => serde_json::from_str(&text).map_err(|e| {
                Error::configuration(format!("criterion {:?} is not valid JSON: {}", text, e))
            })?,
            other => other,
        };
        if !criterion.is_object() {
            return Err(Error::configuration(format!(
                "a criterion must be a JSON object, got {}",
                criterion
            )));
        }
        self.criteria.push(criterion);
        Ok(self)
    }

    /// Same as [`filter`](Self::filter); reads better after the first one
    pub fn and(self, criterion: impl Into<JsonValue>) -> Result<Self> {
        self.filter(criterion)
    }

    /// Merge a comma-separated field list into the projection
    ///
    /// Blank entries are dropped; the others are kept byte for byte.
    pub fn select(mut self, fields: &str) -> Self {
        for field in fields.split(',').filter(|f| !f.trim().is_empty()) {
            if !self.fields.iter().any(|existing| existing == field) {
                self.fields.push(field.to_string());
            }
        }
        self
    }

    pub fn limit(mut self, limit: u64) -> Result<Self> {
        if limit > MAX_LIMIT {
            return Err(Error::configuration(format!(
                "limit {} exceeds the maximum of {}",
                limit, MAX_LIMIT
            )));
        }
        self.limit = Some(limit);
        Ok(self)
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn sort(mut self, field: &str, order: Option<SortOrder>) -> Self {
        self.sort = Some((field.to_string(), order));
        self
    }

    /// Drop criteria, projection, paging and sorting; the context stays
    pub fn clear(mut self) -> Self {
        self.criteria.clear();
        self.fields.clear();
        self.page = None;
        self.limit = None;
        self.sort = None;
        self
    }

    pub fn criteria(&self) -> &[JsonValue] {
        &self.criteria
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn paging(&self) -> (Option<u64>, Option<u64>) {
        (self.page, self.limit)
    }

    /// The combined filter, or `None` without criteria
    pub fn filter_json(&self) -> Option<JsonValue> {
        match self.criteria.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(json!({ "$and": many })),
        }
    }

    /// `/{namespace}/resources/{type}`
    pub fn base_path(&self) -> String {
        self.ty.resource_path()
    }

    fn query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(filter) = self.filter_json() {
            parts.push(format!("where={}", filter));
        }
        if !self.fields.is_empty() {
            parts.push(format!("fields={}", self.fields.join(",")));
        }
        let paging: Vec<String> = [("page", self.page), ("limit", self.limit)]
            .iter()
            .filter_map(|(key, value)| value.map(|value| format!("{}:{}", key, value)))
            .collect();
        if !paging.is_empty() {
            parts.push(format!("paging={}", paging.join(",")));
        }
        if let Some((field, order)) = &self.sort {
            match order {
                Some(order) => parts.push(format!("sort={}:{}", field, order)),
                None => parts.push(format!("sort={}", field)),
            }
        }
        parts.join("&")
    }

    fn with_query(&self, path: String) -> String {
        let query = self.query_string();
        if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, query)
        }
    }

    pub fn url(&self) -> String {
        self.with_query(self.base_path())
    }

    fn require_context(&self) -> Result<&Context> {
        self.context.as_ref().ok_or_else(|| {
            Error::configuration(format!("query on {} has no context attached", self.ty.name()))
        })
    }

    fn instantiate(&self, context: &Context, raw: JsonValue) -> Result<Resource> {
        if !raw.is_object() {
            return Err(Error::unexpected(format!(
                "expected a {} object, got {}",
                self.ty.name(),
                raw
            )));
        }
        Ok(Resource::from_json(&self.registry, self.ty.clone(), raw)?.with_context(context.clone()))
    }

    /// Every matching record
    pub async fn all(&self) -> Result<Vec<Resource>> {
        let context = self.require_context()?;
        let response = context.send(TransportRequest::get(self.url())).await?;
        let items = match response.body_json()? {
            JsonValue::Array(items) => items,
            JsonValue::Null => Vec::new(),
            other => {
                return Err(Error::unexpected(format!(
                    "query on {} expected an array, got {}",
                    self.ty.name(),
                    other
                )))
            }
        };
        log::debug!("Query on {} returned {} records", self.ty.name(), items.len());
        items.into_iter().map(|raw| self.instantiate(context, raw)).collect()
    }

    /// The first matching record, fetched with `limit 1`
    pub async fn first(&self) -> Result<Option<Resource>> {
        let mut single = self.clone();
        single.limit = Some(1);
        Ok(single.all().await?.into_iter().next())
    }

    pub async fn last(&self) -> Result<Option<Resource>> {
        Ok(self.all().await?.pop())
    }

    /// Number of matching records
    pub async fn count(&self) -> Result<u64> {
        let context = self.require_context()?;
        let path = self.with_query(format!("{}/count", self.base_path()));
        let body = context.send(TransportRequest::get(path)).await?.body_json()?;
        body.as_u64()
            .or_else(|| body.get("count").and_then(JsonValue::as_u64))
            .ok_or_else(|| Error::unexpected(format!("count of {} returned {}", self.ty.name(), body)))
    }

    /// Delete every matching record
    pub async fn delete(&self) -> Result<()> {
        let context = self.require_context()?;
        context.send(TransportRequest::delete(self.url())).await?;
        log::info!("Deleted {} records matching {}", self.ty.name(), self.url());
        Ok(())
    }

    /// One record by identifier
    pub async fn find(&self, id: &str) -> Result<Resource> {
        let context = self.require_context()?;
        let path = format!("{}/{}", self.base_path(), id);
        let body = context.send(TransportRequest::get(path)).await?.body_json()?;
        self.instantiate(context, body)
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").field("type", &self.ty.name()).field("url", &self.url()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DeclaredType, PropertyOptions};
    use crate::testing::{context_with, MockTransport};
    use crate::transport::TransportResponse;
    use pretty_assertions::assert_eq;

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new("acme");
        registry
            .define("Widget")
            .property("label", PropertyOptions::new(DeclaredType::String))
            .unwrap()
            .property("count", PropertyOptions::new(DeclaredType::Integer))
            .unwrap()
            .register();
        registry
    }

    fn widgets() -> Query {
        registry().query("Widget").unwrap()
    }

    #[test]
    fn test_bare_url() {
        assert_eq!(widgets().url(), "/acme/resources/Widget");
    }

    #[test]
    fn test_where_and_equivalence() {
        let chained = widgets().filter(json!({ "a": 1 })).unwrap().filter(json!({ "b": 2 })).unwrap();
        let with_and = widgets().filter(json!({ "a": 1 })).unwrap().and(json!({ "b": 2 })).unwrap();
        assert_eq!(chained.url(), with_and.url());
        assert_eq!(chained.url(), r#"/acme/resources/Widget?where={"$and":[{"a":1},{"b":2}]}"#);
    }

    #[test]
    fn test_string_criteria_are_parsed() {
        let query = widgets().filter(r#"{"label": {"$regex": "^w"}}"#).unwrap();
        assert_eq!(query.criteria(), &[json!({ "label": { "$regex": "^w" } })]);

        assert!(widgets().filter("not json").unwrap_err().is_configuration());
        assert!(widgets().filter(json!([1, 2])).unwrap_err().is_configuration());
        assert!(widgets().filter(json!(3)).unwrap_err().is_configuration());
    }

    #[test]
    fn test_select_dedups_in_order() {
        let query = widgets().select("a,b,,c,a");
        assert_eq!(query.fields(), &["a", "b", "c"]);
        assert_eq!(query.select("d,b").url(), "/acme/resources/Widget?fields=a,b,c,d");
    }

    #[test]
    fn test_select_keeps_whitespace_in_names() {
        let query = widgets().select("a, b,, c,  ");
        assert_eq!(query.fields(), &["a", " b", " c"]);
        assert_eq!(query.url(), "/acme/resources/Widget?fields=a, b, c");
    }

    #[test]
    fn test_limit_bounds() {
        assert!(widgets().limit(101).unwrap_err().is_configuration());
        let query = widgets().limit(100).unwrap();
        assert_eq!(query.paging(), (None, Some(100)));
        assert_eq!(query.url(), "/acme/resources/Widget?paging=limit:100");
    }

    #[test]
    fn test_full_url_order() {
        let query = widgets()
            .sort("count", Some(SortOrder::Desc))
            .page(2)
            .limit(10)
            .unwrap()
            .select("label")
            .filter(json!({ "count": { "$gt": 3 } }))
            .unwrap();
        assert_eq!(
            query.url(),
            r#"/acme/resources/Widget?where={"count":{"$gt":3}}&fields=label&paging=page:2,limit:10&sort=count:desc"#
        );
        assert_eq!(widgets().page(3).sort("label", None).url(), "/acme/resources/Widget?paging=page:3&sort=label");
    }

    #[test]
    fn test_clear_resets_everything() {
        let query = widgets().filter(json!({ "a": 1 })).unwrap().select("a").page(1).sort("a", None).clear();
        assert_eq!(query.url(), "/acme/resources/Widget");
    }

    #[tokio::test]
    async fn test_operations_need_context() {
        let err = widgets().all().await.unwrap_err();
        assert!(err.is_configuration());
        assert!(widgets().count().await.unwrap_err().is_configuration());
    }

    #[tokio::test]
    async fn test_all_attaches_context() {
        let transport = MockTransport::new();
        transport.respond(TransportResponse::json(
            200,
            json!([{ "_id": "65f1c0ffee0123456789abcd", "label": "a", "count": 1 }, { "label": "b" }]),
        ));
        let query = widgets().with_context(context_with(&transport)).filter(json!({ "count": 1 })).unwrap();

        let found = query.all().await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id(), Some("65f1c0ffee0123456789abcd"));
        assert!(found.iter().all(|w| w.context().is_some()));
        assert_eq!(transport.requests()[0].path, r#"/acme/resources/Widget?where={"count":1}"#);
    }

    #[tokio::test]
    async fn test_first_last_and_count() {
        let transport = MockTransport::new();
        transport.respond(TransportResponse::json(200, json!([{ "label": "a" }])));
        transport.respond(TransportResponse::json(200, json!([{ "label": "a" }, { "label": "z" }])));
        transport.respond(TransportResponse::json(200, json!({ "count": 42 })));
        transport.respond(TransportResponse::json(200, json!(7)));
        let query = widgets().with_context(context_with(&transport)).page(2);

        let first = query.first().await.unwrap().unwrap();
        assert_eq!(first.lookup("label"), Some(json!("a")));
        let last = query.last().await.unwrap().unwrap();
        assert_eq!(last.lookup("label"), Some(json!("z")));
        assert_eq!(query.count().await.unwrap(), 42);
        assert_eq!(query.count().await.unwrap(), 7);

        let paths: Vec<_> = transport.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![
                "/acme/resources/Widget?paging=page:2,limit:1",
                "/acme/resources/Widget?paging=page:2",
                "/acme/resources/Widget/count?paging=page:2",
                "/acme/resources/Widget/count?paging=page:2",
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_by_query() {
        let transport = MockTransport::new();
        let query = widgets().with_context(context_with(&transport)).filter(json!({ "count": 0 })).unwrap();
        query.delete().await.unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.method, http::Method::DELETE);
        assert_eq!(request.path, r#"/acme/resources/Widget?where={"count":0}"#);
    }

    #[tokio::test]
    async fn test_unexpected_shapes() {
        let transport = MockTransport::new();
        transport.respond(TransportResponse::json(200, json!({ "items": [] })));
        transport.respond(TransportResponse::json(200, json!({ "total": 1 })));
        let query = widgets().with_context(context_with(&transport));

        assert!(matches!(query.all().await, Err(Error::UnexpectedResponse(_))));
        assert!(matches!(query.count().await, Err(Error::UnexpectedResponse(_))));
    }
}
