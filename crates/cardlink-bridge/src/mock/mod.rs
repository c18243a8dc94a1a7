//! Mock host platform and command layer for tests and the CLI.
//!
//! Everything here runs in-process without a phone or a card.

pub mod commands;
pub mod platform;
pub mod storage;

pub use commands::{LAST_CARD_KEY, MockCardCommands, MockCommandsHandle, RecordedCall};
pub use platform::MockPlatform;
pub use storage::MemoryStore;
