//! Mock host platform.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cardlink_hardware::mock::{MockAdapter, MockHostContext, MockTransport, MockTransportHandle};
use cardlink_hardware::{
    HardwareError, HostContext, NfcAdapter, NfcTransport, Result as HardwareResult,
};

use super::commands::{MockCardCommands, MockCommandsHandle};
use super::storage::MemoryStore;
use crate::commands::CardCommands;
use crate::host::{CommandLayerConfig, CommandLayerParts, Platform};
use crate::storage::KeyValueStore;

#[derive(Debug, Default)]
struct PlatformState {
    context: Option<Arc<MockHostContext>>,
    adapter: Option<Arc<MockAdapter>>,
    transports: Vec<MockTransportHandle>,
    stores: HashMap<String, Arc<MemoryStore>>,
    fail_storage: bool,
    fail_transport: bool,
    configs: Vec<CommandLayerConfig>,
}

/// Simulated host application.
///
/// Builds [`MockTransport`]s, [`MemoryStore`]s and [`MockCardCommands`] on
/// request and keeps a handle to each so tests can see what the coordinator
/// did. Stores persist across session rebuilds, like files on a device.
///
/// # Examples
///
/// ```
/// use cardlink_bridge::host::Platform;
/// use cardlink_bridge::mock::MockPlatform;
///
/// let platform = MockPlatform::new();
/// assert_eq!(platform.current_context().map(|c| c.id()), Some(1));
///
/// platform.clear_context();
/// assert!(platform.current_context().is_none());
/// ```
#[derive(Debug)]
pub struct MockPlatform {
    state: Mutex<PlatformState>,
    commands: MockCommandsHandle,
}

impl MockPlatform {
    /// Platform in the foreground with context `1` and an enabled adapter.
    pub fn new() -> Self {
        let platform = Self::without_context();
        platform.set_context(1);
        platform.set_adapter(Some(MockAdapter::new(true)));
        platform
    }

    /// Platform with no foreground context and no adapter.
    pub fn without_context() -> Self {
        Self {
            state: Mutex::default(),
            commands: MockCommandsHandle::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the foreground context; the previous one is released.
    pub fn set_context(&self, id: u64) -> Arc<MockHostContext> {
        let context = Arc::new(MockHostContext::new(id));
        self.state().context = Some(Arc::clone(&context));
        context
    }

    pub fn clear_context(&self) {
        self.state().context = None;
    }

    pub fn context(&self) -> Option<Arc<MockHostContext>> {
        self.state().context.clone()
    }

    pub fn set_adapter(&self, adapter: Option<MockAdapter>) {
        self.state().adapter = adapter.map(Arc::new);
    }

    pub fn adapter(&self) -> Option<Arc<MockAdapter>> {
        self.state().adapter.clone()
    }

    /// Make every subsequent store open fail.
    pub fn fail_storage(&self, fail: bool) {
        self.state().fail_storage = fail;
    }

    /// Make every subsequent transport build fail.
    pub fn fail_transport(&self, fail: bool) {
        self.state().fail_transport = fail;
    }

    /// Handles of every transport built so far, oldest first.
    pub fn transports(&self) -> Vec<MockTransportHandle> {
        self.state().transports.clone()
    }

    pub fn latest_transport(&self) -> Option<MockTransportHandle> {
        self.state().transports.last().cloned()
    }

    pub fn store(&self, name: &str) -> Option<Arc<MemoryStore>> {
        self.state().stores.get(name).cloned()
    }

    /// Configurations each command layer was built with.
    pub fn command_layer_configs(&self) -> Vec<CommandLayerConfig> {
        self.state().configs.clone()
    }

    /// Handle shared by every command layer this platform builds.
    pub fn commands(&self) -> &MockCommandsHandle {
        &self.commands
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for MockPlatform {
    fn current_context(&self) -> Option<Arc<dyn HostContext>> {
        self.state()
            .context
            .clone()
            .map(|context| context as Arc<dyn HostContext>)
    }

    fn create_transport(
        &self,
        context: &Arc<dyn HostContext>,
    ) -> HardwareResult<Arc<dyn NfcTransport>> {
        let mut state = self.state();
        if state.fail_transport {
            return Err(HardwareError::initialization_failed(format!(
                "no reader for context {}",
                context.id()
            )));
        }

        let (transport, handle) =
            MockTransport::with_name(format!("Mock NFC Transport #{}", context.id()));
        state.transports.push(handle);
        Ok(Arc::new(transport))
    }

    fn open_store(
        &self,
        _context: &Arc<dyn HostContext>,
        name: &str,
    ) -> HardwareResult<Arc<dyn KeyValueStore>> {
        let mut state = self.state();
        if state.fail_storage {
            return Err(HardwareError::storage_unavailable(name, "disk full"));
        }

        let store = state
            .stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::new(name)));
        Ok(Arc::clone(store) as Arc<dyn KeyValueStore>)
    }

    fn create_command_layer(
        &self,
        parts: CommandLayerParts,
    ) -> HardwareResult<Arc<dyn CardCommands>> {
        self.state().configs.push(parts.config);
        let commands = MockCardCommands::with_state(
            self.commands.shared_state(),
            Some(parts.storage.card_values),
        );
        Ok(Arc::new(commands))
    }

    fn nfc_adapter(&self) -> Option<Arc<dyn NfcAdapter>> {
        self.state()
            .adapter
            .clone()
            .map(|adapter| adapter as Arc<dyn NfcAdapter>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stores_survive_rebuilds() {
        let platform = MockPlatform::new();
        let context = platform.current_context().unwrap();

        let first = platform.open_store(&context, "rn_cards.db").unwrap();
        first.put("k", vec![1]);
        let second = platform.open_store(&context, "rn_cards.db").unwrap();

        assert_eq!(second.get("k"), Some(vec![1]));
    }

    #[test]
    fn test_fail_storage() {
        let platform = MockPlatform::new();
        let context = platform.current_context().unwrap();
        platform.fail_storage(true);

        assert!(matches!(
            platform.open_store(&context, "terminal_keys"),
            Err(HardwareError::StorageUnavailable { .. })
        ));
    }

    #[test]
    fn test_fail_transport() {
        let platform = MockPlatform::new();
        let context = platform.current_context().unwrap();
        platform.fail_transport(true);

        let error = platform.create_transport(&context).err().unwrap();

        assert_eq!(error.to_string(), "Initialization failed: no reader for context 1");
        assert!(platform.transports().is_empty());
    }

    #[test]
    fn test_replaced_context_is_released() {
        let platform = MockPlatform::new();
        let weak = Arc::downgrade(&platform.context().unwrap());

        platform.set_context(2);

        assert!(weak.upgrade().is_none());
    }
}
