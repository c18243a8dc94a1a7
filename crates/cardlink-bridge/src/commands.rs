//! Command layer interface.
//!
//! The command layer performs the actual card operations. It is callback
//! driven: every method receives a [`Completion`] and returns as soon as the
//! operation has been started. The completion may fire later from any thread.
//!
//! A method returning `Err` signals that the operation could not be started;
//! the bridge reports that error and ignores whatever happens to the
//! completion afterwards.

use cardlink_core::CardId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use crate::invocation::Completion;

/// Result a command reports through its [`Completion`].
pub type CommandResult = std::result::Result<serde_json::Value, CommandError>;

/// Operations exposed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandKind {
    StartSession,
    StopSession,
    ScanCard,
    CreateWallet,
    PurgeWallet,
    Sign,
    ChangePin1,
    ChangePin2,
}

impl CommandKind {
    /// Caller-facing operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartSession => "startSession",
            Self::StopSession => "stopSession",
            Self::ScanCard => "scanCard",
            Self::CreateWallet => "createWallet",
            Self::PurgeWallet => "purgeWallet",
            Self::Sign => "sign",
            Self::ChangePin1 => "changePin1",
            Self::ChangePin2 => "changePin2",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structured failure from the card protocol.
///
/// `message_key` names a localized string resource; `message` is used when
/// no host context can resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[error("{message} (code {code})")]
pub struct DomainError {
    pub code: i32,
    pub message_key: Option<String>,
    pub message: String,
}

impl DomainError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message_key: None,
            message: message.into(),
        }
    }

    /// Attach a localization key.
    pub fn with_message_key(mut self, key: impl Into<String>) -> Self {
        self.message_key = Some(key.into());
        self
    }
}

/// Failure reported by the command layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Card protocol error with a stable code.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A response could not be serialized or parsed.
    #[error("Malformed payload: {description}")]
    MalformedPayload {
        description: String,
        cause: Option<String>,
    },

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl CommandError {
    pub fn malformed(description: impl Into<String>, cause: Option<String>) -> Self {
        Self::MalformedPayload {
            description: description.into(),
            cause,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Card operations the bridge dispatches to.
///
/// Each method must eventually call [`Completion::complete`] once, or drop
/// the completion, in which case the invocation fails with the
/// unexpected-fault code.
///
/// Faults are reported as `Err` from the method or through the completion.
/// Implementations must never panic; the bridge does not catch unwinding.
pub trait CardCommands: Send + Sync {
    /// Read the card presented to the reader.
    fn scan_card(&self, completion: Completion) -> Result<(), CommandError>;

    /// Create a wallet on the card.
    fn create_wallet(&self, card_id: &CardId, completion: Completion) -> Result<(), CommandError>;

    /// Erase the wallet on the card.
    fn purge_wallet(&self, card_id: &CardId, completion: Completion) -> Result<(), CommandError>;

    /// Sign raw hashes, preserving their order.
    fn sign(
        &self,
        card_id: &CardId,
        hashes: Vec<Vec<u8>>,
        completion: Completion,
    ) -> Result<(), CommandError>;

    /// Replace the first access code. `None` clears it.
    fn change_pin1(
        &self,
        card_id: &CardId,
        pin: Option<Vec<u8>>,
        completion: Completion,
    ) -> Result<(), CommandError>;

    /// Replace the second access code. `None` clears it.
    fn change_pin2(
        &self,
        card_id: &CardId,
        pin: Option<Vec<u8>>,
        completion: Completion,
    ) -> Result<(), CommandError>;
}
