//! Collaborator interfaces at the hardware seam.
//!
//! These traits are the contract between the session coordinator and the
//! pieces it does not own: the radio transport that talks to the reader, the
//! UI-bearing host context the transport is bound to, and the host's adapter
//! query. Unlike the command layer, none of these operations complete
//! asynchronously (start, stop and teardown return as soon as the radio has
//! been told), so they are plain methods and usable as trait objects.

use crate::error::Result;

/// Reader transport bound to one host context.
///
/// The coordinator holds at most one live transport at a time and shares it
/// with the command layer, hence `&self` receivers.
///
/// # Examples
///
/// ```
/// use cardlink_hardware::mock::MockTransport;
/// use cardlink_hardware::traits::NfcTransport;
///
/// let (transport, handle) = MockTransport::new();
/// transport.start().unwrap();
/// assert!(transport.is_ready());
/// assert_eq!(handle.start_calls(), 1);
/// ```
pub trait NfcTransport: Send + Sync {
    /// Enable reader mode on the radio.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport was torn down or the radio refused.
    fn start(&self) -> Result<()>;

    /// Disable reader mode, keeping the transport reusable.
    fn stop(&self) -> Result<()>;

    /// Release the radio. The transport is unusable afterwards.
    fn destroy(&self) -> Result<()>;

    /// Whether reader mode is currently enabled.
    fn is_ready(&self) -> bool;
}

/// UI-bearing environment (window / activity) a transport is bound to.
///
/// The coordinator never owns a context; it keeps a weak reference for
/// staleness checks and message localization.
pub trait HostContext: Send + Sync {
    /// Identity used in log records.
    fn id(&self) -> u64;

    /// The context has been destroyed by the host.
    fn is_destroyed(&self) -> bool;

    /// The context is shutting down and will be destroyed.
    fn is_finishing(&self) -> bool;

    /// Resolve a localization key against this context's resources.
    fn localized_string(&self, key: &str) -> Option<String>;

    /// Destroyed or finishing; a transport bound to it must be rebuilt.
    fn is_stale(&self) -> bool {
        self.is_destroyed() || self.is_finishing()
    }
}

/// Host NFC adapter, if the device has one.
pub trait NfcAdapter: Send + Sync {
    /// Whether the user has the adapter switched on.
    fn is_enabled(&self) -> bool;
}
