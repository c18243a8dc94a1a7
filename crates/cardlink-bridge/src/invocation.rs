//! Single-use result channel for one command invocation.
//!
//! Each invocation owns a one-shot sender guarded by a slot. Whatever settles
//! the slot first (command completion, synchronous dispatch failure, or a
//! dropped completion) takes the sender; later attempts find it gone and are
//! discarded. The caller awaits the matching [`PendingResponse`].
//!
//! While the bridge is still inside the dispatch call, a dropped
//! [`Completion`] only marks the slot abandoned. The dispatch result decides
//! what is reported, so a command that fails to start reports its own error
//! rather than "dropped".

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use cardlink_core::{ErrorRecord, GenericValue};
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::commands::{CommandError, CommandKind, CommandResult};
use crate::delivery::DeliveryContext;
use crate::error::{BridgeError, Result};
use crate::error_mapper::map_error;
use crate::host::ContextBinding;
use crate::normalizer::normalize;

/// Terminal event delivered to the caller.
pub type Outcome = std::result::Result<GenericValue, ErrorRecord>;

#[derive(Debug)]
struct SlotState {
    sender: Option<oneshot::Sender<Outcome>>,
    dispatching: bool,
    abandoned: bool,
}

/// Shared settlement point of one invocation.
#[derive(Debug)]
pub(crate) struct InvocationSlot {
    id: Uuid,
    kind: CommandKind,
    state: Mutex<SlotState>,
    delivery: DeliveryContext,
    binding: ContextBinding,
}

impl InvocationSlot {
    /// Open a slot in the dispatching phase.
    pub(crate) fn open(
        kind: CommandKind,
        delivery: DeliveryContext,
        binding: ContextBinding,
    ) -> (Arc<Self>, PendingResponse) {
        let (tx, rx) = oneshot::channel();
        let id = Uuid::new_v4();

        let slot = Arc::new(Self {
            id,
            kind,
            state: Mutex::new(SlotState {
                sender: Some(tx),
                dispatching: true,
                abandoned: false,
            }),
            delivery,
            binding,
        });

        (slot, PendingResponse { id, kind, rx })
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Leave the dispatching phase with the result of the dispatch call.
    pub(crate) fn finish_dispatch(&self, dispatched: Result<()>) {
        let abandoned = {
            let mut state = self.state();
            state.dispatching = false;
            state.abandoned
        };

        match dispatched {
            Err(error) => self.fail(error),
            Ok(()) if abandoned => self.fail(dropped_completion()),
            Ok(()) => {}
        }
    }

    /// Resolve successfully with an already-built value.
    pub(crate) fn resolve(&self, value: GenericValue) {
        self.settle(move |_| Ok(value));
    }

    /// Resolve with a raw command-layer document; normalized on delivery.
    fn succeed(&self, document: serde_json::Value) {
        self.settle(move |_| Ok(normalize(&document)));
    }

    /// Fail; the error is mapped on delivery against the bound context.
    pub(crate) fn fail(&self, error: BridgeError) {
        self.settle(move |context| Err(map_error(&error, context)));
    }

    fn abandon(&self) {
        {
            let mut state = self.state();
            if state.dispatching {
                state.abandoned = true;
                return;
            }
        }

        warn!(id = %self.id, kind = %self.kind, "Completion dropped without a result");
        self.fail(dropped_completion());
    }

    fn settle<F>(&self, outcome: F)
    where
        F: FnOnce(Option<&dyn cardlink_hardware::HostContext>) -> Outcome + Send + 'static,
    {
        let Some(sender) = self.state().sender.take() else {
            warn!(id = %self.id, kind = %self.kind, "Discarding duplicate completion");
            return;
        };

        let id = self.id;
        let kind = self.kind;
        let binding = self.binding.clone();

        self.delivery.post(move || {
            let context = binding.current();
            let outcome = outcome(context.as_deref());

            match &outcome {
                Ok(_) => debug!(%id, %kind, "Delivering success"),
                Err(record) => debug!(%id, %kind, code = record.code, "Delivering failure"),
            }
            if sender.send(outcome).is_err() {
                debug!(%id, %kind, "Caller stopped waiting for result");
            }
        });
    }
}

fn dropped_completion() -> BridgeError {
    BridgeError::unexpected("Command completed without a result")
}

/// Completion token handed to the command layer.
///
/// Consumed by [`complete`](Self::complete). Dropping it unused fails the
/// invocation, so the caller always observes exactly one terminal event.
#[derive(Debug)]
pub struct Completion {
    slot: Option<Arc<InvocationSlot>>,
}

impl Completion {
    pub(crate) fn new(slot: Arc<InvocationSlot>) -> Self {
        Self { slot: Some(slot) }
    }

    /// Id of the invocation this token settles.
    pub fn invocation_id(&self) -> Option<Uuid> {
        self.slot.as_ref().map(|slot| slot.id)
    }

    /// Report the command result.
    pub fn complete(mut self, result: CommandResult) {
        if let Some(slot) = self.slot.take() {
            match result {
                Ok(document) => slot.succeed(document),
                Err(error) => slot.fail(BridgeError::Command(error)),
            }
        }
    }

    /// Report a typed success response.
    ///
    /// A response that does not serialize to a structured document fails the
    /// invocation as a malformed payload.
    pub fn succeed_with<T: Serialize + ?Sized>(self, response: &T) {
        let result = serde_json::to_value(response).map_err(|e| {
            CommandError::malformed("Response is not a structured document", Some(e.to_string()))
        });
        self.complete(result);
    }

    /// Report a failure.
    pub fn fail(self, error: impl Into<CommandError>) {
        self.complete(Err(error.into()));
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.abandon();
        }
    }
}

/// Caller-side future resolving to the invocation's single terminal event.
#[derive(Debug)]
#[must_use = "the result of a command is only observable by awaiting it"]
pub struct PendingResponse {
    id: Uuid,
    kind: CommandKind,
    rx: oneshot::Receiver<Outcome>,
}

impl PendingResponse {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }
}

impl Future for PendingResponse {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(ErrorRecord::unexpected(
                    "Invocation was dropped before delivery",
                ))
            })
        })
    }
}
