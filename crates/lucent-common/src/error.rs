use crate::protocol::NodeRef;
use thiserror::Error;

/// Errors raised while driving a live page.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Node {id} not found in the current document")]
    NotFound { id: NodeRef },

    #[error("Expected <{expected}> element, got <{got}>")]
    TypeMismatch { expected: String, got: String },

    #[error("Option not found: {value}")]
    OptionNotFound { value: String },

    /// The page navigated while a script was being evaluated.
    #[error("Execution context destroyed: {0}")]
    ContextDestroyed(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// An evaluation outlived the bound its caller gave it.
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Driver not ready")]
    NotReady,

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DriverError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            DriverError::NotFound { .. } => "NOT_FOUND",
            DriverError::TypeMismatch { .. } => "TYPE_MISMATCH",
            DriverError::OptionNotFound { .. } => "OPTION_NOT_FOUND",
            DriverError::ContextDestroyed(_) => "CONTEXT_DESTROYED",
            DriverError::Protocol(_) => "PROTOCOL_ERROR",
            DriverError::Timeout(_) => "TIMEOUT",
            DriverError::NotReady => "NOT_READY",
            DriverError::Launch(_) => "LAUNCH_ERROR",
            DriverError::NotSupported(_) => "NOT_SUPPORTED",
            DriverError::Io(_) => "IO_ERROR",
            DriverError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound { .. })
    }

    pub fn is_context_destroyed(&self) -> bool {
        matches!(self, DriverError::ContextDestroyed(_))
    }
}

/// Failures reported by a judgment or loading-classification collaborator.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Judge transport failed: {0}")]
    Transport(String),

    #[error("Judge returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed judge response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Judge(#[from] JudgeError),
}
