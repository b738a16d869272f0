//! Prelude module for convenient imports.
//!
//! Import everything you need with a single line:
//!
//! ```rust,ignore
//! use quarry_core::prelude::*;
//! ```
//!
//! This re-exports the most commonly used types, traits, and functions
//! so you can get started quickly without hunting for import paths.

// === Configuration ===
pub use crate::config::{ContextConfig, QuarryConfig};
pub use crate::logging::{init_logging, LoggingConfig};

// === Context and transport ===
pub use crate::context::{Context, Credentials};
pub use crate::transport::{HttpTransport, Transport, TransportRequest, TransportResponse};

// === Schema and types ===
pub use crate::schema::{
    AssociationKind, AssociationOptions, DeclaredType, PropertyOptions, Synthesizer, TypeDefinition,
};
pub use crate::model::{Resource, ResourceType, TypeRegistry, Value};
pub use crate::enumeration::EnumerationCache;

// === Validation ===
pub use crate::validation::{Errors, Validator, ValidatorCatalog};

// === Queries, associations and persistence ===
pub use crate::persistence::{create_batch, BatchOutcome};
pub use crate::query::{Query, Related, SortOrder};

// === Test data ===
pub use crate::factory::Factory;

// === Errors ===
pub use crate::error::{Error, Result};
