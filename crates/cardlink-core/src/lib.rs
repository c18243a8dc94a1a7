//! Shared vocabulary for the card reader bridge.
//!
//! Everything that crosses the bridge boundary is expressed with the types in
//! this crate: the caller-neutral [`GenericValue`] tree used for every result
//! payload, the [`ErrorRecord`] every failure collapses into, and the small
//! fixed-shape payloads ([`HardwareStatus`], [`NfcStateEvent`]) the bridge
//! emits on its own.

pub mod constants;
pub mod error;
pub mod record;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use record::ErrorRecord;
pub use types::*;
pub use value::{GenericValue, ValueKind, ValueMap};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
