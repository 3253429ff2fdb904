//! Resource errors

use thiserror::Error;

/// Errors reported by a host engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("No resource registered for key '{0}'")]
    NotFound(String),

    #[error("{0}")]
    Failed(String),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Errors surfaced by the resource provider
///
/// `Clone` because a single in-flight acquisition is shared by every caller
/// waiting on the same key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to load '{key}': {reason}")]
    LoadFailed { key: String, reason: String },

    #[error("Failed to unload scene '{key}': {reason}")]
    UnloadFailed { key: String, reason: String },

    #[error("Resource type mismatch for '{key}': expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("Acquisition of '{0}' was cancelled")]
    Cancelled(String),
}

impl ResourceError {
    /// Map a host error for `key` into a provider error
    pub fn from_host(key: &str, error: HostError) -> Self {
        match error {
            HostError::NotFound(_) => Self::NotFound(key.to_string()),
            HostError::Failed(reason) => Self::LoadFailed {
                key: key.to_string(),
                reason,
            },
            HostError::Cancelled => Self::Cancelled(key.to_string()),
        }
    }

    /// Check if this is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Key the error refers to
    pub fn key(&self) -> &str {
        match self {
            Self::NotFound(key) | Self::Cancelled(key) => key,
            Self::LoadFailed { key, .. }
            | Self::UnloadFailed { key, .. }
            | Self::TypeMismatch { key, .. } => key,
        }
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;
