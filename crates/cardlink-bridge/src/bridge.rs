//! Caller-facing bridge.
//!
//! [`CardBridge`] turns caller requests into command-layer invocations and
//! hands back a [`PendingResponse`] per request. Every request resolves
//! exactly once, either with a normalized [`GenericValue`] or with an
//! [`ErrorRecord`](cardlink_core::ErrorRecord).
//!
//! # Dispatch
//!
//! 1. Check the session permits dispatch; otherwise fail with the
//!    not-initialized record and never touch the command layer.
//! 2. Decode arguments (hex hashes, pin digests). A decode failure fails the
//!    invocation before the command layer is called.
//! 3. Forward to the command layer with a [`Completion`]. Its result is
//!    normalized and delivered on the delivery task.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use cardlink_bridge::{BridgeConfig, CardBridge};
//! use cardlink_bridge::mock::MockPlatform;
//! use cardlink_core::GenericValue;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bridge = CardBridge::new(Arc::new(MockPlatform::new()), BridgeConfig::default());
//!
//! let card = bridge.scan_card().await.unwrap();
//! assert_eq!(card.get("health"), Some(&GenericValue::Int(0)));
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use cardlink_core::{CardId, GenericValue, HardwareStatus, NfcStateEvent};
use cardlink_hardware::{AdapterBroadcast, HardwareStateRelay, RelayHandle};
use sha2::{Digest, Sha256};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, debug_span, warn};

use crate::commands::{CardCommands, CommandKind, Completion};
use crate::config::BridgeConfig;
use crate::coordinator::{
    HostLifecycleEvent, SessionCoordinator, SessionSnapshot, StateTransition,
};
use crate::delivery::DeliveryContext;
use crate::error::{BridgeError, Result};
use crate::host::Platform;
use crate::invocation::{InvocationSlot, PendingResponse};

/// Entry point for callers.
pub struct CardBridge {
    coordinator: Arc<SessionCoordinator>,
    platform: Arc<dyn Platform>,
    delivery: DeliveryContext,
    delivery_task: JoinHandle<()>,
    relay: HardwareStateRelay,
}

impl fmt::Debug for CardBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardBridge")
            .field("coordinator", &self.coordinator)
            .field("delivery", &self.delivery)
            .field("relay", &self.relay)
            .finish_non_exhaustive()
    }
}

impl CardBridge {
    /// Create the bridge and initialize it against the current host context.
    ///
    /// A failed initialization is logged and leaves the bridge uninitialized;
    /// commands then fail with the not-initialized record until a resume or
    /// [`initialize`](Self::initialize) succeeds.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new(platform: Arc<dyn Platform>, config: BridgeConfig) -> Self {
        let relay = HardwareStateRelay::new(config.event_capacity);
        let coordinator = Arc::new(SessionCoordinator::new(Arc::clone(&platform), config));
        let (delivery, delivery_task) = DeliveryContext::spawn();

        let bridge = Self {
            coordinator,
            platform,
            delivery,
            delivery_task,
            relay,
        };

        if let Err(e) = bridge.initialize() {
            warn!(error = %e, "Initial reader setup failed");
        }
        bridge
    }

    /// (Re)build the reader session against the current host context.
    ///
    /// Returns `Ok(false)` when no host context is available.
    pub fn initialize(&self) -> Result<bool> {
        self.coordinator.initialize()
    }

    pub fn on_host_resume(&self) -> Result<()> {
        self.coordinator.on_resume()
    }

    pub fn on_host_pause(&self) -> Result<()> {
        self.coordinator.on_pause()
    }

    pub fn on_host_destroy(&self) {
        self.coordinator.on_destroy();
    }

    /// Feed host lifecycle events from `events` until the sender is dropped.
    pub fn attach_lifecycle(
        &self,
        mut events: mpsc::Receiver<HostLifecycleEvent>,
    ) -> JoinHandle<()> {
        let coordinator = Arc::clone(&self.coordinator);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Err(e) = coordinator.handle(event) {
                    warn!(?event, error = %e, "Lifecycle transition failed");
                }
            }
            debug!("Host lifecycle source closed");
        })
    }

    /// Relay adapter broadcasts from `broadcasts` to subscribers.
    pub fn attach_adapter(&self, broadcasts: mpsc::Receiver<AdapterBroadcast>) -> RelayHandle {
        self.relay.spawn(broadcasts)
    }

    /// Publish one adapter broadcast directly.
    pub fn publish_adapter_broadcast(&self, broadcast: &AdapterBroadcast) -> Option<NfcStateEvent> {
        self.relay.publish(broadcast)
    }

    /// Subscribe to `NFCStateChange` events.
    pub fn subscribe(&self) -> broadcast::Receiver<NfcStateEvent> {
        self.relay.subscribe()
    }

    /// Adapter support and enablement, read directly from the host.
    ///
    /// Does not require an initialized session.
    pub fn hardware_status(&self) -> HardwareStatus {
        match self.platform.nfc_adapter() {
            Some(adapter) => HardwareStatus::supported(adapter.is_enabled()),
            None => HardwareStatus::unsupported(),
        }
    }

    /// Activate the reader. Resolves to `Null`.
    pub fn start_session(&self) -> PendingResponse {
        self.session_request(CommandKind::StartSession, || self.coordinator.start_session())
    }

    /// Deactivate the reader. Resolves to `Null`.
    pub fn stop_session(&self) -> PendingResponse {
        self.session_request(CommandKind::StopSession, || self.coordinator.stop_session())
    }

    pub fn scan_card(&self) -> PendingResponse {
        self.dispatch(CommandKind::ScanCard, |commands, completion| {
            Ok(commands.scan_card(completion)?)
        })
    }

    pub fn create_wallet(&self, card_id: impl Into<CardId>) -> PendingResponse {
        let card_id = card_id.into();
        self.dispatch(CommandKind::CreateWallet, move |commands, completion| {
            Ok(commands.create_wallet(&card_id, completion)?)
        })
    }

    pub fn purge_wallet(&self, card_id: impl Into<CardId>) -> PendingResponse {
        let card_id = card_id.into();
        self.dispatch(CommandKind::PurgeWallet, move |commands, completion| {
            Ok(commands.purge_wallet(&card_id, completion)?)
        })
    }

    /// Sign hex-encoded hashes, in order.
    ///
    /// Any hash that is not valid hex fails the invocation and nothing is
    /// sent to the card.
    pub fn sign(
        &self,
        card_id: impl Into<CardId>,
        hashes: &[impl AsRef<str>],
    ) -> PendingResponse {
        let card_id = card_id.into();
        let decoded = decode_hashes(hashes);
        self.dispatch(CommandKind::Sign, move |commands, completion| {
            Ok(commands.sign(&card_id, decoded?, completion)?)
        })
    }

    /// Replace the first access code. A blank pin clears it.
    pub fn change_pin1(&self, card_id: impl Into<CardId>, pin: &str) -> PendingResponse {
        let card_id = card_id.into();
        let pin = hash_pin(pin);
        self.dispatch(CommandKind::ChangePin1, move |commands, completion| {
            Ok(commands.change_pin1(&card_id, pin, completion)?)
        })
    }

    /// Replace the second access code. A blank pin clears it.
    pub fn change_pin2(&self, card_id: impl Into<CardId>, pin: &str) -> PendingResponse {
        let card_id = card_id.into();
        let pin = hash_pin(pin);
        self.dispatch(CommandKind::ChangePin2, move |commands, completion| {
            Ok(commands.change_pin2(&card_id, pin, completion)?)
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.coordinator.snapshot()
    }

    pub fn history(&self) -> Vec<StateTransition> {
        self.coordinator.history()
    }

    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        &self.coordinator
    }

    /// Stop the delivery task. Results not yet delivered are lost and their
    /// callers observe an unexpected-fault record.
    pub async fn shutdown(self) {
        self.delivery_task.abort();
        let _ = self.delivery_task.await;
        debug!("Card bridge shut down");
    }

    fn open(&self, kind: CommandKind) -> (Arc<InvocationSlot>, PendingResponse) {
        InvocationSlot::open(kind, self.delivery.clone(), self.coordinator.binding().clone())
    }

    fn session_request<F>(&self, kind: CommandKind, request: F) -> PendingResponse
    where
        F: FnOnce() -> Result<()>,
    {
        let (slot, pending) = self.open(kind);
        let span = debug_span!("invocation", id = %slot.id(), %kind);
        let _guard = span.enter();

        match request() {
            Ok(()) => {
                slot.finish_dispatch(Ok(()));
                slot.resolve(GenericValue::Null);
            }
            Err(e) => slot.finish_dispatch(Err(e)),
        }
        pending
    }

    fn dispatch<F>(&self, kind: CommandKind, call: F) -> PendingResponse
    where
        F: FnOnce(&dyn CardCommands, Completion) -> Result<()>,
    {
        let (slot, pending) = self.open(kind);
        let span = debug_span!("invocation", id = %slot.id(), %kind);
        let _guard = span.enter();

        let dispatched = match self.coordinator.command_layer() {
            Ok(commands) => {
                debug!("Dispatching to command layer");
                call(commands.as_ref(), Completion::new(Arc::clone(&slot)))
            }
            Err(e) => {
                debug!("Rejected before dispatch");
                Err(e)
            }
        };

        slot.finish_dispatch(dispatched);
        pending
    }
}

/// Decode hex-encoded hashes, case-insensitively, preserving order.
///
/// # Errors
///
/// Returns [`BridgeError::Malformed`] naming the first hash that is not an
/// even-length hex string.
pub fn decode_hashes(hashes: &[impl AsRef<str>]) -> Result<Vec<Vec<u8>>> {
    hashes
        .iter()
        .enumerate()
        .map(|(index, hash)| {
            hex::decode(hash.as_ref())
                .map_err(|e| BridgeError::malformed(format!("Invalid hash at index {index}"), e))
        })
        .collect()
}

/// SHA-256 digest of a pin's UTF-8 bytes; `None` for a blank pin.
pub fn hash_pin(pin: &str) -> Option<Vec<u8>> {
    if pin.trim().is_empty() {
        return None;
    }
    Some(Sha256::digest(pin.as_bytes()).to_vec())
}
