//! Mock collaborator implementations for testing and development.
//!
//! This module provides simulated transports, host contexts and adapters that
//! can be controlled programmatically without a phone or a reader.

pub mod adapter;
pub mod context;
pub mod transport;

// Re-export commonly used types
pub use adapter::MockAdapter;
pub use context::MockHostContext;
pub use transport::{MockTransport, MockTransportHandle};
