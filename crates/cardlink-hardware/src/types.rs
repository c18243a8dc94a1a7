//! Raw adapter state as reported by the host OS.
//!
//! The host publishes adapter transitions as broadcasts carrying an action
//! string and an integer state extra. These types decode that shape without
//! interpreting it; the relay decides what is worth republishing.

use serde::{Deserialize, Serialize};

/// Broadcast action announcing an adapter state transition.
pub const ACTION_ADAPTER_STATE_CHANGED: &str = "android.nfc.action.ADAPTER_STATE_CHANGED";

/// Raw value for [`AdapterState::Off`].
pub const STATE_OFF: i32 = 1;
/// Raw value for [`AdapterState::TurningOn`].
pub const STATE_TURNING_ON: i32 = 2;
/// Raw value for [`AdapterState::On`].
pub const STATE_ON: i32 = 3;
/// Raw value for [`AdapterState::TurningOff`].
pub const STATE_TURNING_OFF: i32 = 4;

/// Adapter power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterState {
    Off,
    TurningOn,
    On,
    TurningOff,
}

impl AdapterState {
    /// Decode the host's integer state, `None` for values it never emits.
    ///
    /// ```
    /// use cardlink_hardware::types::AdapterState;
    ///
    /// assert_eq!(AdapterState::from_raw(3), Some(AdapterState::On));
    /// assert_eq!(AdapterState::from_raw(42), None);
    /// ```
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            STATE_OFF => Some(Self::Off),
            STATE_TURNING_ON => Some(Self::TurningOn),
            STATE_ON => Some(Self::On),
            STATE_TURNING_OFF => Some(Self::TurningOff),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> i32 {
        match self {
            Self::Off => STATE_OFF,
            Self::TurningOn => STATE_TURNING_ON,
            Self::On => STATE_ON,
            Self::TurningOff => STATE_TURNING_OFF,
        }
    }

    /// Settled on/off value, `None` while transitioning.
    pub fn settled_enabled(&self) -> Option<bool> {
        match self {
            Self::Off => Some(false),
            Self::On => Some(true),
            Self::TurningOn | Self::TurningOff => None,
        }
    }
}

/// OS broadcast as delivered to the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterBroadcast {
    /// Broadcast action string.
    pub action: String,

    /// Integer state extra, absent on malformed broadcasts.
    pub state: Option<i32>,
}

impl AdapterBroadcast {
    pub fn new(action: impl Into<String>, state: Option<i32>) -> Self {
        Self {
            action: action.into(),
            state,
        }
    }

    /// Well-formed adapter state change broadcast.
    pub fn state_changed(state: AdapterState) -> Self {
        Self::new(ACTION_ADAPTER_STATE_CHANGED, Some(state.as_raw()))
    }

    pub fn is_state_change(&self) -> bool {
        self.action == ACTION_ADAPTER_STATE_CHANGED
    }

    /// Raw state, with a missing extra read as [`STATE_OFF`].
    pub fn raw_state(&self) -> i32 {
        self.state.unwrap_or(STATE_OFF)
    }
}
