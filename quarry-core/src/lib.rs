//! Quarry - Core
//!
//! A schema-driven data-access layer for remote resource platforms.
//!
//! # Overview
//!
//! Resource types are not Rust structs: they arrive at runtime as schema
//! descriptions. Quarry turns each description into a registered
//! [`ResourceType`] whose instances ([`Resource`]) coerce their attributes,
//! validate themselves against per-attribute validator chains, resolve
//! associations lazily and persist through a pluggable [`Transport`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use quarry_core::prelude::*;
//! use serde_json::json;
//!
//! let registry = TypeRegistry::new("acme");
//! Synthesizer::new(&registry).synthesize_json(json!({
//!     "name": "Widget",
//!     "properties": {
//!         "label": { "type": "String", "required": true },
//!         "count": { "type": "Integer" }
//!     }
//! }))?;
//!
//! let mut widget = registry.instantiate("Widget", json!({ "label": "x" }))?;
//! assert!(widget.is_valid());
//!
//! let url = registry.query("Widget")?.filter(json!({ "count": 3 }))?.limit(10)?.url();
//! assert_eq!(url, r#"/acme/resources/Widget?where={"count":3}&paging=limit:10"#);
//! # Ok::<(), quarry_core::Error>(())
//! ```
//!
//! # Architecture
//!
//! - [`schema`] - declared types, property options, type definitions and the synthesizer
//! - [`validation`] - error collector, validator catalog and validation engine
//! - [`model`] - type registry, attribute values, coercion and resource instances
//! - [`factory`] - randomized instance generation
//! - [`query`] - query builder, URL serialization and association resolution
//! - [`persistence`] - create, delete and batch create
//! - [`context`] / [`transport`] - the network boundary
//! - [`config`] / [`logging`] - layered configuration and the `log` backend

pub mod config; // Layered configuration with TOML and environment support
pub mod context;
pub mod enumeration;
pub mod error;
pub mod factory;
pub mod logging; // Declarative logging built on the standard log crate
pub mod model;
pub mod persistence;
pub mod query;
pub mod schema;
pub mod transport;
pub mod validation;

// Prelude module for convenient imports
pub mod prelude;

#[cfg(test)]
pub mod testing;

// Re-exports of main types and traits
pub use context::Context;
pub use enumeration::EnumerationCache;
pub use error::{Error, Result};
pub use factory::Factory;
pub use model::{Resource, ResourceType, TypeBuilder, TypeRegistry, Value};
pub use persistence::{BatchFailure, BatchOutcome};
pub use query::{Query, Related, SortOrder};
pub use schema::{DeclaredType, PropertyDescriptor, PropertyOptions, Synthesizer, TypeDefinition};
pub use transport::{Transport, TransportRequest, TransportResponse};
pub use validation::{Errors, Validator, ValidatorCatalog};
