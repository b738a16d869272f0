//! Error taxonomy shared by every Quarry component
//!
//! Configuration and context errors are raised before any network call and
//! are never retried. API errors carry the raw status and body of the
//! response. Validation failures live in each resource's [`Errors`]
//! collector and only become an [`Error::Validation`] through
//! [`Resource::validate_strict`](crate::Resource::validate_strict).

use crate::validation::Errors;

/// Main result type for Quarry
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Quarry
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Programmer mistake: unknown constraint, malformed options, bad argument
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The context (server, namespace, credentials) failed its own validation
    #[error("Context error: {0}")]
    Context(String),
    /// The remote platform answered with a non-success status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    /// Raised by the validate-and-raise wrapper only
    #[error("Validation failed: {0}")]
    Validation(Errors),
    /// Opaque failure reported by the transport collaborator
    #[error("Transport error: {0}")]
    Transport(String),
    /// The response body does not have the shape the contract promises
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub fn context(message: impl Into<String>) -> Self {
        Error::Context(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Error::UnexpectedResponse(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    pub fn is_context(&self) -> bool {
        matches!(self, Error::Context(_))
    }

    /// HTTP status of an [`Error::Api`]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_carries_status_and_body() {
        let err = Error::Api { status: 422, body: r#"{"message":"bad"}"#.to_string() };
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.to_string(), r#"API error 422: {"message":"bad"}"#);
    }

    #[test]
    fn test_validation_error_renders_messages() {
        let mut errors = Errors::new();
        errors.add("label", "is required");
        let err = Error::Validation(errors);
        assert_eq!(err.to_string(), "Validation failed: label is required");
        assert!(!err.is_configuration());
    }
}
