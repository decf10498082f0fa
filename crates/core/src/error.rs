//! Error kinds shared by every snapshot store and the orchestrator

use thiserror::Error;

/// Failure of a store, policy or orchestrator operation
#[derive(Debug, Error)]
pub enum VaultError {
    /// Caller misuse, e.g. reading a snapshot that was never appended
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Nothing to return
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport, authentication or backend fault
    #[error("backend unavailable: {message}")]
    BackendUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// Malformed request at the dispatcher boundary
    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

impl VaultError {
    /// Backend fault without an underlying cause
    pub fn backend(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Backend fault wrapping the error that caused it
    pub fn backend_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::BackendUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Short, stable name of the error kind (used as a log field)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::BackendUnavailable { .. } => "backend_unavailable",
            Self::ValidationFailed(_) => "validation_failed",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for store and orchestrator operations
pub type Result<T> = std::result::Result<T, VaultError>;
