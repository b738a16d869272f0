//! Runtime data model: type registry, coerced values and resource instances

pub mod coerce;
pub mod geo;
pub mod registry;
pub mod resource;
pub mod value;

pub use registry::{ResourceType, TypeBuilder, TypeRegistry};
pub use resource::{Resource, SystemFields, SYSTEM_KEYS};
pub use value::Value;
