//! Asynchronous bridge between a caller and a card command layer.
//!
//! The bridge accepts requests (scan, create/purge wallet, sign, change
//! pins), checks the reader session can serve them, forwards them to the
//! command layer and resolves each request exactly once with a
//! [`GenericValue`](cardlink_core::GenericValue) or an
//! [`ErrorRecord`](cardlink_core::ErrorRecord).
//!
//! ```text
//!  caller ──► CardBridge ──► SessionCoordinator ──► CardCommands
//!    ▲            │                  │                    │
//!    │            │                  └─ transport, stores │ completion
//!    │            ▼                                       ▼ (any thread)
//!    └──── PendingResponse ◄── delivery task ◄── normalizer / error mapper
//! ```
//!
//! # Modules
//!
//! - [`bridge`]: caller-facing entry point
//! - [`coordinator`]: session lifecycle and resource ownership
//! - [`invocation`]: single-use result channels
//! - [`normalizer`] and [`error_mapper`]: result and failure shaping
//! - [`host`], [`commands`], [`storage`]: seams the host application fills
//! - [`mock`]: in-process host and command layer

pub mod bridge;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod delivery;
pub mod error;
pub mod error_mapper;
pub mod host;
pub mod invocation;
pub mod mock;
pub mod normalizer;
pub mod storage;

pub use bridge::{CardBridge, decode_hashes, hash_pin};
pub use commands::{CardCommands, CommandError, CommandKind, CommandResult, Completion, DomainError};
pub use config::BridgeConfig;
pub use coordinator::{
    HostLifecycleEvent, SessionCoordinator, SessionSnapshot, SessionState, StateTransition,
};
pub use error::{BridgeError, Result};
pub use error_mapper::map_error;
pub use host::{CommandLayerConfig, CommandLayerParts, ContextBinding, Platform};
pub use invocation::{Outcome, PendingResponse};
pub use storage::{KeyValueStore, StorageHandles};
