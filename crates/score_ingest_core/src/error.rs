use thiserror::Error;

/// Run-level failures. Either one aborts the invocation before any row is
/// written or published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("source object {container}/{key} is unavailable: {message}")]
    SourceUnavailable {
        container: String,
        key: String,
        message: String,
    },
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl IngestError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// Stable machine-readable kind, used in logs and invocation errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "SourceUnavailable",
            Self::MalformedInput(_) => "MalformedInput",
        }
    }
}

/// Failure reported by an external collaborator (object store, key-value
/// store, notification service).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub message: String,
    pub retryable: bool,
}

impl CollaboratorError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}
