//! Mock host context.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::traits::HostContext;

/// Simulated window / activity.
///
/// Tests keep an `Arc<MockHostContext>` and flip it to destroyed or finishing
/// to simulate the host recreating its UI.
///
/// # Examples
///
/// ```
/// use cardlink_hardware::mock::MockHostContext;
/// use cardlink_hardware::traits::HostContext;
///
/// let context = MockHostContext::new(1).with_string("error_busy", "Card is busy");
/// assert_eq!(context.localized_string("error_busy").as_deref(), Some("Card is busy"));
///
/// context.destroy();
/// assert!(context.is_stale());
/// ```
#[derive(Debug, Default)]
pub struct MockHostContext {
    id: u64,
    destroyed: AtomicBool,
    finishing: AtomicBool,
    strings: Mutex<HashMap<String, String>>,
}

impl MockHostContext {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Register a localized string resource.
    pub fn with_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_string(key, value);
        self
    }

    pub fn set_string(&self, key: impl Into<String>, value: impl Into<String>) {
        self.strings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Mark the context destroyed.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }

    /// Mark the context finishing.
    pub fn finish(&self) {
        self.finishing.store(true, Ordering::SeqCst);
    }
}

impl HostContext for MockHostContext {
    fn id(&self) -> u64 {
        self.id
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn is_finishing(&self) -> bool {
        self.finishing.load(Ordering::SeqCst)
    }

    fn localized_string(&self, key: &str) -> Option<String> {
        self.strings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context_is_live() {
        let context = MockHostContext::new(7);
        assert_eq!(context.id(), 7);
        assert!(!context.is_stale());
    }

    #[test]
    fn test_finishing_is_stale() {
        let context = MockHostContext::new(1);
        context.finish();
        assert!(context.is_finishing());
        assert!(!context.is_destroyed());
        assert!(context.is_stale());
    }

    #[test]
    fn test_missing_string() {
        let context = MockHostContext::new(1);
        assert_eq!(context.localized_string("nope"), None);
    }
}
