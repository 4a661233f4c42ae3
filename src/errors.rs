use thiserror::Error;

/// Top-level error type for the SQS listener.
///
/// Every narrower error in this module converts into it, so callers wiring a
/// listener together can propagate any of them with `?`.
#[derive(Debug, Error)]
pub enum SqsListenerError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while resolving the queue handle.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The backend could not locate a queue with the configured name.
    ///
    /// Setup may be retried; the listener stays unconfigured until it succeeds.
    #[error("failed to locate queue {queue_name}: {reason}")]
    QueueNotFound { queue_name: String, reason: String },
}

/// Lifecycle misuse. None of these affect the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("listener is already listening")]
    AlreadyListening,

    #[error("listener is not currently listening")]
    NotListening,

    #[error("listener is not ready; setup has not completed")]
    NotReady,
}

/// Errors reported by a [`QueueBackend`](crate::backend::QueueBackend).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("queue not found: {0}")]
    QueueNotFound(String),

    #[error("failed to receive messages: {0}")]
    ReceiveFailure(String),

    #[error("failed to delete message: {0}")]
    DeleteFailure(String),
}

/// Invalid listener configuration read from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: &str, reason: impl ToString) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
