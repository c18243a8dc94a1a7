//! Constants shared by every layer of the bridge.
//!
//! Error codes handed to the caller are part of the caller-visible contract:
//! domain errors coming from the command layer keep their own numeric code,
//! everything else collapses into one of the sentinels below.

// ============================================================================
// Error codes
// ============================================================================

/// Code reported for malformed input and any unexpected fault.
///
/// Distinct from every domain code produced by the command layer.
///
/// ```
/// use cardlink_core::constants::{NOT_INITIALIZED_CODE, UNEXPECTED_ERROR_CODE};
///
/// assert_eq!(UNEXPECTED_ERROR_CODE, 9999);
/// assert_ne!(UNEXPECTED_ERROR_CODE, NOT_INITIALIZED_CODE);
/// ```
pub const UNEXPECTED_ERROR_CODE: i32 = 9999;

/// Code reported when a command or session request arrives before the reader
/// resource has been initialized.
pub const NOT_INITIALIZED_CODE: i32 = 9998;

/// Message attached to [`NOT_INITIALIZED_CODE`].
pub const NOT_INITIALIZED_MESSAGE: &str = "NFC reader is not initialized";

// ============================================================================
// Events
// ============================================================================

/// Name of the asynchronous event carrying adapter on/off transitions.
pub const NFC_STATE_CHANGE_EVENT: &str = "NFCStateChange";

/// Payload key of the adapter state event and of the hardware status query.
pub const KEY_ENABLED: &str = "enabled";

/// Payload key reporting adapter presence in the hardware status query.
pub const KEY_SUPPORT: &str = "support";

// ============================================================================
// Storage
// ============================================================================

/// Default store name for persisted card values.
pub const DEFAULT_CARD_VALUES_STORE: &str = "rn_cards.db";

/// Default store name for terminal keys.
pub const DEFAULT_TERMINAL_KEYS_STORE: &str = "terminal_keys";
