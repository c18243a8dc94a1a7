use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    Result,
    constants::{KEY_ENABLED, KEY_SUPPORT, NFC_STATE_CHANGE_EVENT},
    value::GenericValue,
};

/// Card identifier as printed on the card (hex string, passed through as-is).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CardId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Presence and enablement of the host's NFC adapter.
///
/// Both flags are `false` when no adapter exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HardwareStatus {
    pub support: bool,
    pub enabled: bool,
}

impl HardwareStatus {
    /// Status for a host without an adapter.
    pub fn unsupported() -> Self {
        Self::default()
    }

    /// Status for a host with an adapter in the given enablement state.
    pub fn supported(enabled: bool) -> Self {
        Self {
            support: true,
            enabled,
        }
    }

    /// `{ support, enabled }` as a [`GenericValue`] map.
    pub fn to_value(&self) -> GenericValue {
        [
            (KEY_SUPPORT.to_string(), GenericValue::Bool(self.support)),
            (KEY_ENABLED.to_string(), GenericValue::Bool(self.enabled)),
        ]
        .into_iter()
        .collect()
    }
}

impl TryFrom<&GenericValue> for HardwareStatus {
    type Error = crate::Error;

    fn try_from(value: &GenericValue) -> Result<Self> {
        Ok(Self {
            support: value.require_bool(KEY_SUPPORT)?,
            enabled: value.require_bool(KEY_ENABLED)?,
        })
    }
}

/// Payload of the `NFCStateChange` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfcStateEvent {
    pub enabled: bool,
}

impl NfcStateEvent {
    /// Channel name this event is published under.
    pub const NAME: &'static str = NFC_STATE_CHANGE_EVENT;

    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// `{ enabled }` as a [`GenericValue`] map.
    pub fn to_value(&self) -> GenericValue {
        [(KEY_ENABLED.to_string(), GenericValue::Bool(self.enabled))]
            .into_iter()
            .collect()
    }
}

impl TryFrom<&GenericValue> for NfcStateEvent {
    type Error = crate::Error;

    fn try_from(value: &GenericValue) -> Result<Self> {
        Ok(Self::new(value.require_bool(KEY_ENABLED)?))
    }
}

/// Kind of card the command layer is allowed to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// Production cards.
    Release,

    /// Developer cards.
    Sdk,
}

/// Set of card kinds accepted during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFilter {
    pub allowed: Vec<CardKind>,
}

impl CardFilter {
    pub fn new(allowed: impl IntoIterator<Item = CardKind>) -> Self {
        let mut kinds: Vec<CardKind> = Vec::new();
        for kind in allowed {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Self { allowed: kinds }
    }

    pub fn allows(&self, kind: CardKind) -> bool {
        self.allowed.contains(&kind)
    }
}

impl Default for CardFilter {
    fn default() -> Self {
        Self::new([CardKind::Release])
    }
}
