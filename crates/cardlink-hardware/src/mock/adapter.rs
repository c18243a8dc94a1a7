//! Mock NFC adapter.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::traits::NfcAdapter;

/// Simulated adapter whose enablement can be toggled.
#[derive(Debug, Default)]
pub struct MockAdapter {
    enabled: AtomicBool,
}

impl MockAdapter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

impl NfcAdapter for MockAdapter {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let adapter = MockAdapter::new(false);
        assert!(!adapter.is_enabled());
        adapter.set_enabled(true);
        assert!(adapter.is_enabled());
    }
}
