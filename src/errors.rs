//! Error types for the resource pool

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Type-erased error returned by factory and reset hooks
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Shared form of a hook error, kept behind an `Arc` so `PoolError` stays `Clone`
pub type HookError = Arc<dyn Error + Send + Sync>;

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    #[error("Invalid pool configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Pool is exhausted - every resource is leased and capacity is reached")]
    PoolExhausted,

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Resource construction failed: {0}")]
    ConstructionFailed(HookError),

    #[error("Resource reset failed, resource discarded: {0}")]
    ResetFailed(HookError),

    #[error("Pool is closed")]
    Closed,
}

impl PoolError {
    pub(crate) fn construction(err: BoxError) -> Self {
        PoolError::ConstructionFailed(Arc::from(err))
    }

    pub(crate) fn reset(err: BoxError) -> Self {
        PoolError::ResetFailed(Arc::from(err))
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        PoolError::InvalidConfiguration(message.into())
    }
}

pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_errors_keep_message() {
        let err = PoolError::construction("device lost".into());
        assert_eq!(err.to_string(), "Resource construction failed: device lost");

        let cloned = err.clone();
        assert!(matches!(cloned, PoolError::ConstructionFailed(_)));
    }

    #[test]
    fn test_timeout_display() {
        let err = PoolError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Operation timed out after 250ms");
    }
}
