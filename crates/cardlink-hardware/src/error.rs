//! Error types for hardware collaborator operations.
//!
//! This module defines the failures the reader transport, the host context
//! and the platform storage can report back to the session coordinator.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while controlling the reader hardware.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HardwareError {
    /// Transport is torn down or the radio went away.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Radio communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Transport or command layer could not be constructed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Persistent store could not be opened.
    #[error("Storage unavailable: {name}: {message}")]
    StorageUnavailable { name: String, message: String },
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new storage unavailable error.
    pub fn storage_unavailable(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("NfcManager");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: NfcManager");
    }

    #[test]
    fn test_communication_error() {
        let error = HardwareError::communication("tag lost");
        assert!(matches!(error, HardwareError::CommunicationError { .. }));
        assert_eq!(error.to_string(), "Communication error: tag lost");
    }

    #[test]
    fn test_initialization_failed_error() {
        let error = HardwareError::initialization_failed("reader mode rejected");
        assert_eq!(error.to_string(), "Initialization failed: reader mode rejected");
    }

    #[test]
    fn test_storage_unavailable_error() {
        let error = HardwareError::storage_unavailable("rn_cards.db", "read-only");
        assert_eq!(error.to_string(), "Storage unavailable: rn_cards.db: read-only");
    }
}
