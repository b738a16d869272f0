//! Create, delete and batch create against the resource endpoints

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::Resource;
use crate::transport::{TransportRequest, TransportResponse};

lazy_static! {
    static ref OBJECT_ID: Regex = Regex::new(r"^[0-9A-Za-z]{24}$").expect("object id pattern is valid");
}

/// Identifier carried by a `location` value
///
/// Path segments are tried from the last one backwards; the first that is a
/// 24-character alphanumeric id or a UUID wins.
pub fn extract_identifier(location: &str) -> Option<String> {
    let path = location.split(['?', '#']).next().unwrap_or(location);
    path.rsplit('/')
        .filter(|segment| !segment.is_empty())
        .find(|segment| OBJECT_ID.is_match(segment) || uuid::Uuid::parse_str(segment).is_ok())
        .map(str::to_string)
}

fn location_of(response: &TransportResponse, body: &JsonValue) -> Option<String> {
    response
        .header("location")
        .map(str::to_string)
        .or_else(|| body.get("location").and_then(JsonValue::as_str).map(str::to_string))
}

/// Mark `resource` as persisted under `id`, taking system fields from `body`
fn absorb(context: &Context, resource: &mut Resource, id: String, body: &JsonValue) {
    if let JsonValue::Object(fields) = body {
        resource.system_mut().absorb_all(fields);
    }
    resource.system_mut().id = Some(id);
    resource.attach(context.clone());
}

/// POST the attributes of `resource` and record the identifier it was given
pub async fn create(context: &Context, resource: &mut Resource) -> Result<()> {
    let path = resource.resource_type().resource_path();
    let body = JsonValue::Object(resource.attributes());
    let response = context.send(TransportRequest::post(path, body)).await?;
    let payload = response.body_json()?;

    let id = location_of(&response, &payload)
        .as_deref()
        .and_then(extract_identifier)
        .ok_or_else(|| {
            Error::unexpected(format!("create of {} returned no usable location", resource.type_name()))
        })?;
    log::info!("Created {} {}", resource.type_name(), id);
    absorb(context, resource, id, &payload);
    Ok(())
}

/// DELETE the persisted record
pub async fn delete(context: &Context, resource: &Resource) -> Result<()> {
    let id = resource.id().ok_or_else(|| {
        Error::configuration(format!("cannot delete a {} that was never saved", resource.type_name()))
    })?;
    let path = format!("{}/{}", resource.resource_type().resource_path(), id);
    context.send(TransportRequest::delete(path)).await?;
    log::info!("Deleted {} {}", resource.type_name(), id);
    Ok(())
}

/// A record a batch could not persist, with the reason
#[derive(Debug)]
pub struct BatchFailure {
    pub record: Resource,
    pub error: Error,
}

/// Result of a batch: records keep their identity in either list
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub created: Vec<Resource>,
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.created.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Create many records of one type in a single POST
///
/// The response must be an array aligned with the request; elements carrying
/// a `location` are created, the others failed. A response of a different
/// length is rejected as a whole.
pub async fn create_batch(context: &Context, records: Vec<Resource>) -> Result<BatchOutcome> {
    let Some(first) = records.first() else {
        return Ok(BatchOutcome::default());
    };
    let ty = first.resource_type().clone();
    if let Some(other) = records.iter().find(|r| r.type_name() != ty.name()) {
        return Err(Error::configuration(format!(
            "batch of {} also contains a {}",
            ty.name(),
            other.type_name()
        )));
    }

    let body = JsonValue::Array(records.iter().map(|r| JsonValue::Object(r.attributes())).collect());
    let response = context.send(TransportRequest::post(ty.resource_path(), body)).await?;
    let items = match response.body_json()? {
        JsonValue::Array(items) => items,
        other => {
            return Err(Error::unexpected(format!(
                "batch create of {} expected an array, got {}",
                ty.name(),
                other
            )))
        }
    };
    if items.len() != records.len() {
        return Err(Error::unexpected(format!(
            "batch create of {} sent {} records but received {} results",
            ty.name(),
            records.len(),
            items.len()
        )));
    }

    let mut outcome = BatchOutcome::default();
    for (index, (mut record, item)) in records.into_iter().zip(items).enumerate() {
        let id = item.get("location").and_then(JsonValue::as_str).and_then(extract_identifier);
        match id {
            Some(id) => {
                absorb(context, &mut record, id, &item);
                outcome.created.push(record);
            }
            None => {
                log::error!("Batch item {} of {} was not created: {}", index + 1, ty.name(), item);
                let error = Error::unexpected(format!("batch item {} has no location: {}", index + 1, item));
                outcome.failed.push(BatchFailure { record, error });
            }
        }
    }
    log::info!(
        "Batch created {} of {} {} records",
        outcome.created.len(),
        outcome.len(),
        ty.name()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeRegistry;
    use crate::schema::{DeclaredType, PropertyOptions};
    use crate::testing::{context_with, MockTransport};
    use http::Method;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const UUID: &str = "0b6f3b9e-5c1d-4f4e-9a59-3b7c9d1e2f10";

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new("acme");
        registry
            .define("Widget")
            .property("label", PropertyOptions::new(DeclaredType::String).required())
            .unwrap()
            .register();
        registry
            .define("Gadget")
            .property("size", PropertyOptions::new(DeclaredType::Integer))
            .unwrap()
            .register();
        registry
    }

    #[test]
    fn test_extract_identifier() {
        assert_eq!(
            extract_identifier("https://p.example/acme/resources/Widget/65f1c0ffee0123456789abcd"),
            Some("65f1c0ffee0123456789abcd".to_string())
        );
        assert_eq!(extract_identifier(&format!("/acme/users/{}?expand=1", UUID)), Some(UUID.to_string()));
        assert_eq!(extract_identifier(&format!("/acme/files/{}/", UUID)), Some(UUID.to_string()));
        assert_eq!(extract_identifier("/acme/resources/Widget"), None);
        assert_eq!(extract_identifier("/acme/resources/Widget/123"), None);
    }

    #[tokio::test]
    async fn test_create_takes_location_header() {
        let registry = registry();
        let transport = MockTransport::new();
        transport.respond(
            TransportResponse::json(201, json!({ "_createdAt": "2024-03-01T10:00:00Z", "_version": 1 }))
                .with_header("Location", "/acme/resources/Widget/65f1c0ffee0123456789abcd"),
        );
        let context = context_with(&transport);

        let mut widget = registry.instantiate("Widget", json!({ "label": "x", "note": "raw" })).unwrap();
        create(&context, &mut widget).await.unwrap();

        assert_eq!(widget.id(), Some("65f1c0ffee0123456789abcd"));
        assert_eq!(widget.version(), Some(1));
        assert!(widget.created_at().is_some());
        assert!(widget.context().is_some());

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/acme/resources/Widget");
        assert_eq!(request.body, Some(json!({ "label": "x" })));
    }

    #[tokio::test]
    async fn test_create_takes_location_from_body() {
        let registry = registry();
        let transport = MockTransport::new();
        transport.respond(TransportResponse::json(201, json!({ "location": format!("/acme/resources/Widget/{}", UUID) })));
        let context = context_with(&transport);

        let mut widget = registry.instantiate("Widget", json!({ "label": "x" })).unwrap();
        create(&context, &mut widget).await.unwrap();
        assert_eq!(widget.id(), Some(UUID));
    }

    #[tokio::test]
    async fn test_create_without_location_is_unexpected() {
        let registry = registry();
        let transport = MockTransport::new();
        transport.respond(TransportResponse::json(201, json!({})));
        let context = context_with(&transport);

        let mut widget = registry.instantiate("Widget", json!({ "label": "x" })).unwrap();
        let err = create(&context, &mut widget).await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
        assert!(!widget.is_persisted());
    }

    #[tokio::test]
    async fn test_delete_requires_identifier() {
        let registry = registry();
        let transport = MockTransport::new();
        let context = context_with(&transport);

        let unsaved = registry.instantiate("Widget", json!({ "label": "x" })).unwrap();
        assert!(delete(&context, &unsaved).await.unwrap_err().is_configuration());
        assert!(transport.requests().is_empty());

        let saved = registry.instantiate("Widget", json!({ "_id": "65f1c0ffee0123456789abcd" })).unwrap();
        delete(&context, &saved).await.unwrap();
        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::DELETE);
        assert_eq!(request.path, "/acme/resources/Widget/65f1c0ffee0123456789abcd");
    }

    #[tokio::test]
    async fn test_batch_rejects_misaligned_response() {
        let registry = registry();
        let transport = MockTransport::new();
        transport.respond(TransportResponse::json(200, json!([{ "location": "/acme/resources/Widget/65f1c0ffee0123456789abcd" }])));
        let context = context_with(&transport);

        let records = vec![
            registry.instantiate("Widget", json!({ "label": "a" })).unwrap(),
            registry.instantiate("Widget", json!({ "label": "b" })).unwrap(),
        ];
        let err = create_batch(&context, records).await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(ref m) if m.contains("sent 2 records but received 1")));
    }

    #[tokio::test]
    async fn test_batch_rejects_mixed_types() {
        let registry = registry();
        let transport = MockTransport::new();
        let context = context_with(&transport);

        let records = vec![
            registry.instantiate("Widget", json!({ "label": "a" })).unwrap(),
            registry.instantiate("Gadget", json!({ "size": 2 })).unwrap(),
        ];
        assert!(create_batch(&context, records).await.unwrap_err().is_configuration());
        assert!(create_batch(&context, Vec::new()).await.unwrap().is_empty());
        assert!(transport.requests().is_empty());
    }
}
