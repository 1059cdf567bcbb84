//! Collaborator errors and the port marker trait
//!
//! The application flow talks to three outside systems: a draft store, a
//! document store and the application backend. Each is reached through a
//! trait declared next to the domain code that needs it; those traits
//! extend [`DomainPort`] and report every failure as a [`PortError`].
//! Adapters translate their backend's failures into these variants so the
//! flow can decide between "show the user a message" and "try again later"
//! without knowing which backend answered.

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

type BoxedCause = Box<dyn StdError + Send + Sync>;

/// Failure reported by an external collaborator
#[derive(Debug, Error)]
pub enum PortError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Payload larger than the collaborator accepts
    #[error("Size exceeded: {actual} bytes (limit {limit} bytes)")]
    SizeExceeded { limit: u64, actual: u64 },

    #[error("Unsupported type: {mime_type}")]
    UnsupportedType { mime_type: String },

    /// The collaborator looked at the payload and refused it
    #[error("Rejected: {message}")]
    ValidationRejected { message: String },

    /// The collaborator could not be reached
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// The collaborator answered with something unusable
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied { message: message.into() }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::ValidationRejected { message: message.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into(), source: None }
    }

    /// Transport failure carrying the backend's own error
    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Whether repeating the same call later might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Supertrait of every port; ports are shared as `Arc<dyn Port>` across tasks
pub trait DomainPort: Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_entity_and_id() {
        let error = PortError::not_found("Application", "APP-1");
        assert!(error.is_not_found());
        assert_eq!(error.to_string(), "Not found: Application with id APP-1");
    }

    #[test]
    fn test_only_transport_and_timeout_are_transient() {
        let timeout = PortError::Timeout {
            operation: "upload".to_string(),
            duration_ms: 30_000,
        };
        assert!(timeout.is_transient());
        assert!(PortError::transport("connection reset").is_transient());

        for permanent in [
            PortError::permission_denied("owner mismatch"),
            PortError::rejected("scan failed"),
            PortError::internal("bad json"),
            PortError::SizeExceeded { limit: 10, actual: 20 },
        ] {
            assert!(!permanent.is_transient(), "{permanent}");
        }
    }

    #[test]
    fn test_size_exceeded_message() {
        let error = PortError::SizeExceeded { limit: 10, actual: 20 };
        assert_eq!(error.to_string(), "Size exceeded: 20 bytes (limit 10 bytes)");
    }

    #[test]
    fn test_transport_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "disk gone");
        let error = PortError::transport_with_source("write failed", io);
        let source = StdError::source(&error).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk gone"));
    }
}
