use cardlink_core::{
    CardFilter,
    constants::{DEFAULT_CARD_VALUES_STORE, DEFAULT_TERMINAL_KEYS_STORE},
};
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Bridge configuration.
///
/// # Example
///
/// ```
/// use cardlink_bridge::BridgeConfig;
///
/// let config = BridgeConfig::default()
///     .card_values_store("cards.db")
///     .event_capacity(32);
///
/// assert_eq!(config.card_values_store, "cards.db");
/// assert_eq!(config.terminal_keys_store, "terminal_keys");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Store name for persisted card values
    pub card_values_store: String,

    /// Store name for terminal keys
    pub terminal_keys_store: String,

    /// Card kinds the command layer accepts
    pub card_filter: CardFilter,

    /// Undelivered adapter events kept per subscriber
    pub event_capacity: usize,

    /// Session-state transitions kept for diagnostics
    pub lifecycle_history: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            card_values_store: DEFAULT_CARD_VALUES_STORE.to_string(),
            terminal_keys_store: DEFAULT_TERMINAL_KEYS_STORE.to_string(),
            card_filter: CardFilter::default(),
            event_capacity: 16,
            lifecycle_history: 32,
        }
    }
}

impl BridgeConfig {
    /// Load a configuration from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Configuration`] if the document does not parse.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| BridgeError::Configuration(e.to_string()))
    }

    /// Set the card-values store name
    pub fn card_values_store(mut self, name: impl Into<String>) -> Self {
        self.card_values_store = name.into();
        self
    }

    /// Set the terminal-keys store name
    pub fn terminal_keys_store(mut self, name: impl Into<String>) -> Self {
        self.terminal_keys_store = name.into();
        self
    }

    /// Set the accepted card kinds
    pub fn card_filter(mut self, filter: CardFilter) -> Self {
        self.card_filter = filter;
        self
    }

    /// Set the adapter event channel capacity
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Set how many session transitions are retained
    pub fn lifecycle_history(mut self, size: usize) -> Self {
        self.lifecycle_history = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardlink_core::CardKind;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.card_values_store, "rn_cards.db");
        assert_eq!(config.card_filter, CardFilter::new([CardKind::Release]));
        assert_eq!(config.event_capacity, 16);
        assert_eq!(config.lifecycle_history, 32);
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            BridgeConfig::from_json(r#"{"card_filter":{"allowed":["release","sdk"]}}"#).unwrap();
        assert!(config.card_filter.allows(CardKind::Sdk));
        assert_eq!(config.card_values_store, "rn_cards.db");
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            BridgeConfig::from_json("{not json"),
            Err(BridgeError::Configuration(_))
        ));
    }
}
