//! Mock reader transport.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{HardwareError, Result, traits::NfcTransport};

#[derive(Debug, Default)]
struct TransportState {
    running: bool,
    destroyed: bool,
    fail_start: bool,
    start_calls: usize,
    stop_calls: usize,
    destroy_calls: usize,
}

/// Simulated reader transport.
///
/// Counts every control call so tests can assert how the coordinator drove
/// the radio. Starting a destroyed transport fails like the real one does.
///
/// # Examples
///
/// ```
/// use cardlink_hardware::mock::MockTransport;
/// use cardlink_hardware::traits::NfcTransport;
///
/// let (transport, handle) = MockTransport::new();
/// transport.destroy().unwrap();
/// assert!(transport.start().is_err());
/// assert!(handle.is_destroyed());
/// ```
#[derive(Debug)]
pub struct MockTransport {
    name: String,
    state: Arc<Mutex<TransportState>>,
}

impl MockTransport {
    /// Create a new mock transport with the default name.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_name("Mock NFC Transport")
    }

    /// Create a new mock transport with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockTransportHandle) {
        let state = Arc::new(Mutex::new(TransportState::default()));
        let transport = Self {
            name: name.into(),
            state: Arc::clone(&state),
        };
        (transport, MockTransportHandle { state })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> MutexGuard<'_, TransportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NfcTransport for MockTransport {
    fn start(&self) -> Result<()> {
        let mut state = self.state();
        state.start_calls += 1;

        if state.destroyed {
            return Err(HardwareError::disconnected(self.name.clone()));
        }
        if state.fail_start {
            return Err(HardwareError::communication("reader mode rejected"));
        }

        state.running = true;
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let mut state = self.state();
        state.stop_calls += 1;
        state.running = false;
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        let mut state = self.state();
        state.destroy_calls += 1;
        state.running = false;
        state.destroyed = true;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        let state = self.state();
        state.running && !state.destroyed
    }
}

/// Handle for inspecting and steering a [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    state: Arc<Mutex<TransportState>>,
}

impl MockTransportHandle {
    fn state(&self) -> MutexGuard<'_, TransportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make subsequent `start()` calls fail with a communication error.
    pub fn fail_start(&self, fail: bool) {
        self.state().fail_start = fail;
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    pub fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }

    pub fn start_calls(&self) -> usize {
        self.state().start_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.state().stop_calls
    }

    pub fn destroy_calls(&self) -> usize {
        self.state().destroy_calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop_cycle() {
        let (transport, handle) = MockTransport::new();

        transport.start().unwrap();
        assert!(transport.is_ready());
        assert!(handle.is_running());

        transport.stop().unwrap();
        assert!(!transport.is_ready());
        assert_eq!(handle.start_calls(), 1);
        assert_eq!(handle.stop_calls(), 1);
    }

    #[test]
    fn test_start_after_destroy_fails() {
        let (transport, handle) = MockTransport::with_name("Reader A");
        transport.start().unwrap();
        transport.destroy().unwrap();

        assert!(!transport.is_ready());
        assert_eq!(
            transport.start(),
            Err(HardwareError::disconnected("Reader A"))
        );
        assert_eq!(handle.destroy_calls(), 1);
    }

    #[test]
    fn test_fail_start() {
        let (transport, handle) = MockTransport::new();
        handle.fail_start(true);

        assert!(matches!(
            transport.start(),
            Err(HardwareError::CommunicationError { .. })
        ));
        assert!(!handle.is_running());

        handle.fail_start(false);
        transport.start().unwrap();
        assert!(handle.is_running());
    }
}
