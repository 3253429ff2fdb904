//! Scene switch errors

use thiserror::Error;
use void_resource::ResourceError;

/// Scene orchestration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("Scene switch to '{0}' was cancelled")]
    Cancelled(String),

    #[error("Cannot switch to '{requested}': a switch to '{active}' is in progress")]
    SwitchInProgress { requested: String, active: String },

    #[error("No current scene")]
    NoCurrentScene,
}

impl SceneError {
    /// Map a provider error for `key`, keeping cancellation distinct
    pub fn from_resource(key: &str, error: ResourceError) -> Self {
        if error.is_cancelled() {
            Self::Cancelled(key.to_string())
        } else {
            Self::Resource(error)
        }
    }

    /// Check if the switch was cancelled rather than failed
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

pub type SceneResult<T> = Result<T, SceneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_stays_distinct() {
        let cancelled = SceneError::from_resource("forest", ResourceError::Cancelled("forest".into()));
        assert!(cancelled.is_cancelled());

        let failed = SceneError::from_resource("forest", ResourceError::NotFound("forest".into()));
        assert!(!failed.is_cancelled());
        assert_eq!(failed.to_string(), "Resource not found: forest");
    }
}
