//! Host platform interface.
//!
//! [`Platform`] is everything the bridge needs from the application hosting
//! the reader: the current UI context, factories for the transport, storage
//! and command layer bound to that context, and the adapter query.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use cardlink_core::CardFilter;
use cardlink_hardware::{HostContext, NfcAdapter, NfcTransport, Result as HardwareResult};

use crate::commands::CardCommands;
use crate::storage::{KeyValueStore, StorageHandles};

/// Settings handed to the command layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandLayerConfig {
    pub card_filter: CardFilter,
}

/// Collaborators a command layer is constructed against.
#[derive(Clone)]
pub struct CommandLayerParts {
    pub context: Arc<dyn HostContext>,
    pub transport: Arc<dyn NfcTransport>,
    pub storage: StorageHandles,
    pub config: CommandLayerConfig,
}

impl fmt::Debug for CommandLayerParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandLayerParts")
            .field("context", &self.context.id())
            .field("storage", &self.storage)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Application hosting the reader.
pub trait Platform: Send + Sync {
    /// Context currently in the foreground, if any.
    fn current_context(&self) -> Option<Arc<dyn HostContext>>;

    /// Build a transport bound to `context`.
    fn create_transport(
        &self,
        context: &Arc<dyn HostContext>,
    ) -> HardwareResult<Arc<dyn NfcTransport>>;

    /// Open (or create) the named store.
    fn open_store(
        &self,
        context: &Arc<dyn HostContext>,
        name: &str,
    ) -> HardwareResult<Arc<dyn KeyValueStore>>;

    /// Build the command layer for a freshly created transport.
    fn create_command_layer(
        &self,
        parts: CommandLayerParts,
    ) -> HardwareResult<Arc<dyn CardCommands>>;

    /// Host adapter, `None` on devices without NFC.
    fn nfc_adapter(&self) -> Option<Arc<dyn NfcAdapter>>;
}

/// Non-owning link to the host context the session is bound to.
///
/// Shared between the coordinator, which rebinds it on every rebuild, and
/// in-flight invocations, which read it at completion time to localize
/// messages.
#[derive(Clone, Default)]
pub struct ContextBinding {
    inner: Arc<RwLock<Option<Weak<dyn HostContext>>>>,
}

impl ContextBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, context: &Arc<dyn HostContext>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::downgrade(context));
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Bound context if it is still alive.
    pub fn current(&self) -> Option<Arc<dyn HostContext>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Whether a context was ever bound (alive or not).
    pub fn is_bound(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// No live context, or the live one is destroyed / finishing.
    pub fn is_stale(&self) -> bool {
        self.current().is_none_or(|context| context.is_stale())
    }
}

impl fmt::Debug for ContextBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBinding")
            .field("context", &self.current().map(|c| c.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardlink_hardware::mock::MockHostContext;

    #[test]
    fn test_unbound_is_stale() {
        let binding = ContextBinding::new();
        assert!(!binding.is_bound());
        assert!(binding.is_stale());
        assert!(binding.current().is_none());
    }

    #[test]
    fn test_binding_does_not_own_context() {
        let binding = ContextBinding::new();
        let context: Arc<dyn HostContext> = Arc::new(MockHostContext::new(3));
        binding.bind(&context);

        assert_eq!(binding.current().map(|c| c.id()), Some(3));
        assert!(!binding.is_stale());

        drop(context);
        assert!(binding.is_bound());
        assert!(binding.current().is_none());
        assert!(binding.is_stale());
    }

    #[test]
    fn test_clear_unbinds_live_context() {
        let binding = ContextBinding::new();
        let context: Arc<dyn HostContext> = Arc::new(MockHostContext::new(4));
        binding.bind(&context);

        binding.clear();

        assert!(!binding.is_bound());
        assert!(binding.is_stale());
        assert!(binding.current().is_none());
    }

    #[test]
    fn test_destroyed_context_is_stale() {
        let binding = ContextBinding::new();
        let mock = Arc::new(MockHostContext::new(1));
        let context: Arc<dyn HostContext> = mock.clone();
        binding.bind(&context);

        mock.destroy();
        assert!(binding.current().is_some());
        assert!(binding.is_stale());
    }
}
