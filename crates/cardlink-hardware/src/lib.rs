//! Hardware seam of the card reader bridge.
//!
//! This crate defines the interfaces the session coordinator uses to drive
//! hardware it does not own, plus the relay that turns OS adapter broadcasts
//! into bridge notifications.
//!
//! # Collaborators
//!
//! - [`NfcTransport`]: start / stop / teardown control over the reader radio
//!   and a readiness flag.
//! - [`HostContext`]: the window or activity the transport is bound to. Its
//!   identity can change underneath the bridge, which is why the coordinator
//!   only ever holds it weakly.
//! - [`NfcAdapter`]: presence and enablement of the host adapter.
//!
//! # Relay
//!
//! [`HardwareStateRelay`] decodes [`AdapterBroadcast`]s and republishes
//! settled on/off transitions as [`cardlink_core::NfcStateEvent`]s:
//!
//! ```
//! use cardlink_hardware::{AdapterBroadcast, AdapterState, relay::decode_broadcast};
//!
//! let event = decode_broadcast(&AdapterBroadcast::state_changed(AdapterState::On));
//! assert_eq!(event.map(|e| e.enabled), Some(true));
//! ```
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides controllable stand-ins for every trait so the
//! bridge can be exercised without a phone or a reader.
//!
//! [`NfcTransport`]: traits::NfcTransport
//! [`HostContext`]: traits::HostContext
//! [`NfcAdapter`]: traits::NfcAdapter

pub mod error;
pub mod mock;
pub mod relay;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use relay::{HardwareStateRelay, RelayHandle};
pub use traits::{HostContext, NfcAdapter, NfcTransport};
pub use types::{AdapterBroadcast, AdapterState};
