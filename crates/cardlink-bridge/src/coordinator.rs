//! Session lifecycle coordinator.
//!
//! Owns the transport, the command layer built on it, and the session state.
//! Host lifecycle events and explicit start/stop requests are the only
//! mutators; the bridge reads readiness through [`SessionCoordinator::command_layer`]
//! right before each dispatch.
//!
//! # States
//!
//! ```text
//!                 initialize
//! Uninitialized ─────────────► Initialized ──start──► Active
//!                                  ▲    │              │  ▲
//!                         rebuild  │    │stop     pause│  │resume/start
//!                                  │    ▼              ▼  │
//!        Destroyed ◄──destroy──────┴─ Inactive ◄──────────┘
//! ```
//!
//! Any state holding resources may be rebuilt into `Initialized` when the
//! bound host context goes stale, and any of them is torn down to
//! `Destroyed` by a host destroy.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cardlink_hardware::{HostContext, NfcTransport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::commands::CardCommands;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::host::{CommandLayerConfig, CommandLayerParts, ContextBinding, Platform};
use crate::storage::StorageHandles;

/// Session state owned by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No resources have been built yet.
    Uninitialized,
    /// Resources built, reader not activated.
    Initialized,
    /// Reader activated.
    Active,
    /// Reader deactivated, resources retained.
    Inactive,
    /// Resources torn down by the host.
    Destroyed,
}

impl SessionState {
    /// Whether moving to `next` is a legal transition.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, next),
            (_, Initialized)
                | (Initialized | Active | Inactive, Active | Inactive | Destroyed)
        )
    }

    /// States in which commands may be dispatched, given resources exist.
    pub fn allows_dispatch(&self) -> bool {
        matches!(self, Self::Initialized | Self::Active | Self::Inactive)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Record of one session-state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: SessionState,
    pub to: SessionState,
    pub at: DateTime<Utc>,
}

impl StateTransition {
    pub fn new(from: SessionState, to: SessionState) -> Self {
        Self {
            from,
            to,
            at: Utc::now(),
        }
    }
}

/// Lifecycle notifications from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostLifecycleEvent {
    Resume,
    Pause,
    Destroy,
}

/// Point-in-time view of the session, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub session_started: bool,
    pub transport_ready: bool,
    /// Number of times resources have been built.
    pub generation: u64,
    /// Id of the bound host context, if it is still alive.
    pub context_id: Option<u64>,
}

struct SessionResources {
    transport: Arc<dyn NfcTransport>,
    commands: Arc<dyn CardCommands>,
    context_id: u64,
}

struct SessionInner {
    state: SessionState,
    session_started: bool,
    resources: Option<SessionResources>,
    generation: u64,
    history: VecDeque<StateTransition>,
}

/// Owns the reader session and reacts to host lifecycle events.
pub struct SessionCoordinator {
    platform: Arc<dyn Platform>,
    config: BridgeConfig,
    binding: ContextBinding,
    inner: Mutex<SessionInner>,
}

impl SessionCoordinator {
    pub fn new(platform: Arc<dyn Platform>, config: BridgeConfig) -> Self {
        let history = VecDeque::with_capacity(config.lifecycle_history);
        Self {
            platform,
            config,
            binding: ContextBinding::new(),
            inner: Mutex::new(SessionInner {
                state: SessionState::Uninitialized,
                session_started: false,
                resources: None,
                generation: 0,
                history,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build resources against the current host context.
    ///
    /// Returns `Ok(false)` and leaves everything untouched when no context is
    /// available. Any previous transport is destroyed and replaced.
    ///
    /// # Errors
    ///
    /// Returns the platform error if the transport, a store, or the command
    /// layer cannot be built. The previous session is left as it was.
    pub fn initialize(&self) -> Result<bool> {
        let Some(context) = self.platform.current_context() else {
            debug!("No host context available, staying uninitialized");
            return Ok(false);
        };

        let resources = self.build(&context)?;

        let mut inner = self.inner();
        if let Some(previous) = inner.resources.take() {
            teardown(previous.transport.as_ref());
        }
        inner.resources = Some(resources);
        inner.session_started = false;
        inner.generation += 1;
        self.binding.bind(&context);
        self.transition(&mut inner, SessionState::Initialized);

        info!(
            context = context.id(),
            generation = inner.generation,
            "Reader session initialized"
        );
        Ok(true)
    }

    fn build(&self, context: &Arc<dyn HostContext>) -> Result<SessionResources> {
        let transport = self.platform.create_transport(context)?;
        self.assemble(context, transport.clone()).inspect_err(|_| {
            teardown(transport.as_ref());
        })
    }

    fn assemble(
        &self,
        context: &Arc<dyn HostContext>,
        transport: Arc<dyn NfcTransport>,
    ) -> Result<SessionResources> {
        let storage = StorageHandles {
            card_values: self
                .platform
                .open_store(context, &self.config.card_values_store)?,
            terminal_keys: self
                .platform
                .open_store(context, &self.config.terminal_keys_store)?,
        };

        let commands = self.platform.create_command_layer(CommandLayerParts {
            context: Arc::clone(context),
            transport: Arc::clone(&transport),
            storage,
            config: CommandLayerConfig {
                card_filter: self.config.card_filter.clone(),
            },
        })?;

        Ok(SessionResources {
            transport,
            commands,
            context_id: context.id(),
        })
    }

    /// Host came to the foreground.
    ///
    /// A stale context triggers a full rebuild; the rebuilt session starts out
    /// `Initialized` and must be started again by the caller. When no
    /// replacement can be built the stale session is discarded and the
    /// coordinator sits in `Destroyed` until a later resume succeeds.
    pub fn on_resume(&self) -> Result<()> {
        let needs_rebuild = {
            let inner = self.inner();
            match inner.state {
                SessionState::Uninitialized => {
                    debug!("Resume before initialization, ignoring");
                    return Ok(());
                }
                SessionState::Destroyed => true,
                _ => inner.resources.is_none() || self.binding.is_stale(),
            }
        };

        if needs_rebuild {
            warn!("Bound host context is stale, rebuilding reader session");
            let rebuilt = self.initialize();
            if !matches!(rebuilt, Ok(true)) {
                self.discard_stale();
            }
            return rebuilt.map(|_| ());
        }

        let mut inner = self.inner();
        let Some(transport) = started_transport(&inner) else {
            return Ok(());
        };
        transport.start()?;
        self.transition(&mut inner, SessionState::Active);
        Ok(())
    }

    /// Drop resources bound to a dead context when no replacement could be
    /// built. Commands report not-initialized until a later resume succeeds.
    fn discard_stale(&self) {
        let mut inner = self.inner();
        inner.session_started = false;
        self.binding.clear();
        let Some(resources) = inner.resources.take() else {
            return;
        };

        teardown(resources.transport.as_ref());
        self.transition(&mut inner, SessionState::Destroyed);
        warn!(
            context = resources.context_id,
            "Discarded stale reader session without a replacement"
        );
    }

    /// Host went to the background. Resources are kept.
    pub fn on_pause(&self) -> Result<()> {
        let mut inner = self.inner();
        let Some(transport) = started_transport(&inner) else {
            return Ok(());
        };
        transport.stop()?;
        self.transition(&mut inner, SessionState::Inactive);
        Ok(())
    }

    /// Host is being destroyed; tear everything down.
    pub fn on_destroy(&self) {
        let mut inner = self.inner();
        let Some(resources) = inner.resources.take() else {
            return;
        };

        teardown(resources.transport.as_ref());
        self.transition(&mut inner, SessionState::Destroyed);
        info!(context = resources.context_id, "Reader session destroyed");
    }

    /// Dispatch a host lifecycle event to its handler.
    pub fn handle(&self, event: HostLifecycleEvent) -> Result<()> {
        debug!(?event, "Host lifecycle event");
        match event {
            HostLifecycleEvent::Resume => self.on_resume(),
            HostLifecycleEvent::Pause => self.on_pause(),
            HostLifecycleEvent::Destroy => {
                self.on_destroy();
                Ok(())
            }
        }
    }

    /// Activate the reader and mark the session started.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NotInitialized`] without resources, otherwise any
    /// transport failure.
    pub fn start_session(&self) -> Result<()> {
        let mut inner = self.inner();
        let transport = inner
            .resources
            .as_ref()
            .map(|r| Arc::clone(&r.transport))
            .ok_or(BridgeError::NotInitialized)?;

        transport.start()?;
        inner.session_started = true;
        self.transition(&mut inner, SessionState::Active);
        Ok(())
    }

    /// Deactivate the reader and clear the started flag.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NotInitialized`] without resources, otherwise any
    /// transport failure.
    pub fn stop_session(&self) -> Result<()> {
        let mut inner = self.inner();
        let transport = inner
            .resources
            .as_ref()
            .map(|r| Arc::clone(&r.transport))
            .ok_or(BridgeError::NotInitialized)?;

        transport.stop()?;
        inner.session_started = false;
        self.transition(&mut inner, SessionState::Inactive);
        Ok(())
    }

    /// Command layer to dispatch to, if the session permits dispatch.
    pub fn command_layer(&self) -> Result<Arc<dyn CardCommands>> {
        let inner = self.inner();
        match &inner.resources {
            Some(resources) if inner.state.allows_dispatch() => {
                Ok(Arc::clone(&resources.commands))
            }
            _ => Err(BridgeError::NotInitialized),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner();
        SessionSnapshot {
            state: inner.state,
            session_started: inner.session_started,
            transport_ready: inner
                .resources
                .as_ref()
                .is_some_and(|r| r.transport.is_ready()),
            generation: inner.generation,
            context_id: self.binding.current().map(|c| c.id()),
        }
    }

    /// Recorded transitions, oldest first.
    pub fn history(&self) -> Vec<StateTransition> {
        self.inner().history.iter().cloned().collect()
    }

    /// Binding shared with in-flight invocations.
    pub fn binding(&self) -> &ContextBinding {
        &self.binding
    }

    fn transition(&self, inner: &mut SessionInner, next: SessionState) {
        let current = inner.state;
        if current == next {
            return;
        }
        if !current.can_transition_to(next) {
            warn!(from = %current, to = %next, "Ignoring invalid session transition");
            return;
        }

        debug!(from = %current, to = %next, "Session state changed");
        inner.state = next;
        inner.history.push_back(StateTransition::new(current, next));
        while inner.history.len() > self.config.lifecycle_history {
            inner.history.pop_front();
        }
    }
}

/// Transport of a session the caller has started, if any.
fn started_transport(inner: &SessionInner) -> Option<Arc<dyn NfcTransport>> {
    inner
        .resources
        .as_ref()
        .filter(|_| inner.session_started)
        .map(|r| Arc::clone(&r.transport))
}

fn teardown(transport: &dyn NfcTransport) {
    if let Err(e) = transport.destroy() {
        warn!(error = %e, "Failed to destroy transport");
    }
}

impl fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("config", &self.config)
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}
