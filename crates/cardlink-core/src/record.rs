//! Terminal failure shape delivered to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{NOT_INITIALIZED_CODE, NOT_INITIALIZED_MESSAGE, UNEXPECTED_ERROR_CODE};

/// `{ code, message }` pair every failure is reduced to before it crosses the
/// bridge boundary.
///
/// # Examples
///
/// ```
/// use cardlink_core::ErrorRecord;
///
/// let record = ErrorRecord::new(50005, "User cancelled");
/// assert_eq!(record.to_string(), "50005: User cancelled");
/// assert!(!record.is_not_initialized());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct ErrorRecord {
    /// Stable numeric code.
    pub code: i32,

    /// Human-readable, possibly localized, message.
    pub message: String,
}

impl ErrorRecord {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Record carrying [`UNEXPECTED_ERROR_CODE`].
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(UNEXPECTED_ERROR_CODE, message)
    }

    /// Precondition failure: no reader resource is bound.
    pub fn not_initialized() -> Self {
        Self::new(NOT_INITIALIZED_CODE, NOT_INITIALIZED_MESSAGE)
    }

    pub fn is_not_initialized(&self) -> bool {
        self.code == NOT_INITIALIZED_CODE
    }

    pub fn is_unexpected(&self) -> bool {
        self.code == UNEXPECTED_ERROR_CODE
    }
}
