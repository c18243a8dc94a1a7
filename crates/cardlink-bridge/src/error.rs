//! Errors raised inside the bridge before they are reduced to an
//! [`ErrorRecord`](cardlink_core::ErrorRecord).

use cardlink_hardware::HardwareError;
use thiserror::Error;

use crate::commands::{CommandError, DomainError};

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Every failure the bridge can produce on its side of the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// No reader resource is bound; nothing was dispatched.
    #[error("NFC reader is not initialized")]
    NotInitialized,

    /// Transport, context or storage failure.
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// Failure reported by the command layer.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Caller input or a structured document could not be decoded.
    #[error("Malformed input: {description}")]
    Malformed {
        description: String,
        cause: Option<String>,
    },

    /// Bridge configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Anything else.
    #[error("{0}")]
    Unexpected(String),
}

impl BridgeError {
    /// Create a malformed-input error with an inner cause.
    pub fn malformed(description: impl Into<String>, cause: impl ToString) -> Self {
        Self::Malformed {
            description: description.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// Create an unexpected-fault error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

impl From<DomainError> for BridgeError {
    fn from(value: DomainError) -> Self {
        Self::Command(CommandError::Domain(value))
    }
}
