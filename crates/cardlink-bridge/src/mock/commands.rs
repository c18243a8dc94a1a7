//! Mock command layer.
//!
//! Answers every command from a background thread with a canned typed
//! response, the way a real card SDK calls back from its own worker. Tests
//! steer it through a [`MockCommandsHandle`]: queue protocol failures, reject
//! dispatch, hold completions, or drop them.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use cardlink_core::CardId;
use serde::Serialize;
use tracing::debug;

use crate::commands::{CardCommands, CommandError, CommandKind, Completion, DomainError};
use crate::storage::KeyValueStore;

/// Key under which the last scanned card id is persisted.
pub const LAST_CARD_KEY: &str = "last_card";

/// Arguments the command layer was called with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: CommandKind,
    pub card_id: Option<CardId>,
    pub hashes: Vec<Vec<u8>>,
    pub pin: Option<Vec<u8>>,
}

impl RecordedCall {
    fn new(kind: CommandKind, card_id: Option<&CardId>) -> Self {
        Self {
            kind,
            card_id: card_id.cloned(),
            hashes: Vec::new(),
            pin: None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CommandsState {
    calls: Vec<RecordedCall>,
    failures: VecDeque<DomainError>,
    reject_next: Option<CommandError>,
    hold: bool,
    held: Vec<Completion>,
    drop_next: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanResponse {
    card_id: String,
    batch_id: String,
    health: u8,
    is_activated: bool,
    settings_mask: Vec<&'static str>,
    remaining_signatures: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletResponse {
    card_id: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    wallet_public_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignResponse {
    card_id: String,
    signature: Vec<String>,
    wallet_remaining_signatures: u32,
    wallet_signed_hashes: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PinResponse {
    card_id: String,
    status: &'static str,
}

/// Simulated card command layer.
pub struct MockCardCommands {
    card_id: CardId,
    card_values: Option<Arc<dyn KeyValueStore>>,
    state: Arc<Mutex<CommandsState>>,
}

impl fmt::Debug for MockCardCommands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockCardCommands")
            .field("card_id", &self.card_id)
            .field("card_values", &self.card_values.as_ref().map(|s| s.name().to_string()))
            .finish_non_exhaustive()
    }
}

impl MockCardCommands {
    /// Create a command layer answering for a card with id `CB79000000018201`.
    pub fn new() -> (Self, MockCommandsHandle) {
        let state = Arc::new(Mutex::new(CommandsState::default()));
        let commands = Self::with_state(Arc::clone(&state), None);
        (commands, MockCommandsHandle { state })
    }

    pub(crate) fn with_state(
        state: Arc<Mutex<CommandsState>>,
        card_values: Option<Arc<dyn KeyValueStore>>,
    ) -> Self {
        Self {
            card_id: CardId::new("CB79000000018201"),
            card_values,
            state,
        }
    }

    fn state(&self) -> MutexGuard<'_, CommandsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call and decide what happens to its completion.
    ///
    /// Returns the completion together with a queued failure when the mock
    /// should answer, `None` when it was held or dropped.
    fn accept(
        &self,
        call: RecordedCall,
        completion: Completion,
    ) -> Result<Option<(Completion, Option<DomainError>)>, CommandError> {
        let mut state = self.state();
        if let Some(error) = state.reject_next.take() {
            return Err(error);
        }

        debug!(
            kind = %call.kind,
            id = ?completion.invocation_id(),
            "Mock command dispatched"
        );
        state.calls.push(call);

        if state.drop_next {
            state.drop_next = false;
            drop(state);
            drop(completion);
            return Ok(None);
        }
        if state.hold {
            state.held.push(completion);
            return Ok(None);
        }

        let failure = state.failures.pop_front();
        Ok(Some((completion, failure)))
    }

    fn answer<T>(
        &self,
        call: RecordedCall,
        completion: Completion,
        response: T,
    ) -> Result<(), CommandError>
    where
        T: Serialize + Send + 'static,
    {
        let Some((completion, failure)) = self.accept(call, completion)? else {
            return Ok(());
        };

        thread::spawn(move || match failure {
            Some(error) => completion.fail(error),
            None => completion.succeed_with(&response),
        });
        Ok(())
    }
}

impl CardCommands for MockCardCommands {
    fn scan_card(&self, completion: Completion) -> Result<(), CommandError> {
        if let Some(store) = &self.card_values {
            store.put(LAST_CARD_KEY, self.card_id.as_str().as_bytes().to_vec());
        }

        let response = ScanResponse {
            card_id: self.card_id.to_string(),
            batch_id: "0017".to_string(),
            health: 0,
            is_activated: false,
            settings_mask: vec!["AllowSetPIN1", "AllowSetPIN2", "AllowUnencrypted"],
            remaining_signatures: 100,
        };
        self.answer(RecordedCall::new(CommandKind::ScanCard, None), completion, response)
    }

    fn create_wallet(&self, card_id: &CardId, completion: Completion) -> Result<(), CommandError> {
        let response = WalletResponse {
            card_id: card_id.to_string(),
            status: "Loaded",
            wallet_public_key: Some(
                "04E1A9E9CCE6F1C2D1A3E5B7F2D4C6A8B0E2F4A6C8D0E2F4A6C8B0D2E4F6A8C0D2".into(),
            ),
        };
        let call = RecordedCall::new(CommandKind::CreateWallet, Some(card_id));
        self.answer(call, completion, response)
    }

    fn purge_wallet(&self, card_id: &CardId, completion: Completion) -> Result<(), CommandError> {
        let response = WalletResponse {
            card_id: card_id.to_string(),
            status: "Empty",
            wallet_public_key: None,
        };
        let call = RecordedCall::new(CommandKind::PurgeWallet, Some(card_id));
        self.answer(call, completion, response)
    }

    fn sign(
        &self,
        card_id: &CardId,
        hashes: Vec<Vec<u8>>,
        completion: Completion,
    ) -> Result<(), CommandError> {
        let signed = u32::try_from(hashes.len()).unwrap_or(u32::MAX);
        let response = SignResponse {
            card_id: card_id.to_string(),
            signature: hashes.iter().map(|hash| hex::encode_upper(hash)).collect(),
            wallet_remaining_signatures: 100u32.saturating_sub(signed),
            wallet_signed_hashes: signed,
        };

        let mut call = RecordedCall::new(CommandKind::Sign, Some(card_id));
        call.hashes = hashes;
        self.answer(call, completion, response)
    }

    fn change_pin1(
        &self,
        card_id: &CardId,
        pin: Option<Vec<u8>>,
        completion: Completion,
    ) -> Result<(), CommandError> {
        let mut call = RecordedCall::new(CommandKind::ChangePin1, Some(card_id));
        call.pin = pin;
        let response = PinResponse {
            card_id: card_id.to_string(),
            status: "Success",
        };
        self.answer(call, completion, response)
    }

    fn change_pin2(
        &self,
        card_id: &CardId,
        pin: Option<Vec<u8>>,
        completion: Completion,
    ) -> Result<(), CommandError> {
        let mut call = RecordedCall::new(CommandKind::ChangePin2, Some(card_id));
        call.pin = pin;
        let response = PinResponse {
            card_id: card_id.to_string(),
            status: "Success",
        };
        self.answer(call, completion, response)
    }
}

/// Handle for inspecting and steering a [`MockCardCommands`].
///
/// Shared by every command layer a [`MockPlatform`](super::MockPlatform)
/// builds, so it survives session rebuilds.
#[derive(Debug, Clone)]
pub struct MockCommandsHandle {
    state: Arc<Mutex<CommandsState>>,
}

impl MockCommandsHandle {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CommandsState::default())),
        }
    }

    pub(crate) fn shared_state(&self) -> Arc<Mutex<CommandsState>> {
        Arc::clone(&self.state)
    }

    fn state(&self) -> MutexGuard<'_, CommandsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call the command layer accepted, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.state().calls.last().cloned()
    }

    /// Answer the next accepted command with `error`.
    pub fn fail_next(&self, error: DomainError) {
        self.state().failures.push_back(error);
    }

    /// Refuse to start the next command.
    pub fn reject_next(&self, error: CommandError) {
        self.state().reject_next = Some(error);
    }

    /// Drop the next accepted command's completion without answering.
    pub fn drop_next(&self) {
        self.state().drop_next = true;
    }

    /// Keep completions instead of answering them.
    pub fn hold(&self, hold: bool) {
        self.state().hold = hold;
    }

    /// Take the completions kept while holding.
    pub fn take_held(&self) -> Vec<Completion> {
        std::mem::take(&mut self.state().held)
    }
}
