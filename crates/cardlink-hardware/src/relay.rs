//! Adapter state relay.
//!
//! Republishes OS adapter broadcasts as [`NfcStateEvent`]s on a broadcast
//! channel. Only settled transitions are relayed: "off" becomes
//! `{ enabled: false }`, "on" becomes `{ enabled: true }`, everything else is
//! ignored.
//!
//! ```text
//! ┌──────────────┐        ┌───────────────────┐        ┌─────────────┐
//! │ OS broadcast │──mpsc─►│ HardwareStateRelay│──bcast►│ subscribers │
//! └──────────────┘        └───────────────────┘        └─────────────┘
//! ```
//!
//! Publication is fire-and-forget: an event sent while nobody is subscribed
//! is gone, and a lagging subscriber loses the oldest events.
//!
//! # Examples
//!
//! ```
//! use cardlink_hardware::relay::HardwareStateRelay;
//! use cardlink_hardware::types::{AdapterBroadcast, AdapterState};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let relay = HardwareStateRelay::new(16);
//! let mut events = relay.subscribe();
//!
//! relay.publish(&AdapterBroadcast::state_changed(AdapterState::Off));
//! assert!(!events.recv().await.unwrap().enabled);
//! # }
//! ```

use cardlink_core::NfcStateEvent;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::types::{AdapterBroadcast, AdapterState};

/// Decode a broadcast into the event it should produce, if any.
///
/// A state-change broadcast without a state extra is read as "off".
pub fn decode_broadcast(broadcast: &AdapterBroadcast) -> Option<NfcStateEvent> {
    if !broadcast.is_state_change() {
        return None;
    }

    AdapterState::from_raw(broadcast.raw_state())
        .and_then(|state| state.settled_enabled())
        .map(NfcStateEvent::new)
}

/// Relays adapter broadcasts to every subscriber.
#[derive(Debug, Clone)]
pub struct HardwareStateRelay {
    events: broadcast::Sender<NfcStateEvent>,
}

impl HardwareStateRelay {
    /// Create a relay whose channel keeps up to `capacity` undelivered events.
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self { events }
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<NfcStateEvent> {
        self.events.subscribe()
    }

    /// Decode and publish one broadcast.
    ///
    /// Returns the event that was emitted, `None` if the broadcast was
    /// ignored. An emitted event with no live subscribers is dropped.
    pub fn publish(&self, broadcast: &AdapterBroadcast) -> Option<NfcStateEvent> {
        let Some(event) = decode_broadcast(broadcast) else {
            trace!(action = %broadcast.action, state = ?broadcast.state, "Ignoring adapter broadcast");
            return None;
        };

        debug!(enabled = event.enabled, "Adapter state changed");
        if self.events.send(event).is_err() {
            trace!("No subscribers for {}", NfcStateEvent::NAME);
        }
        Some(event)
    }

    /// Consume broadcasts from `source` on a background task until the
    /// sender side is dropped or the handle is shut down.
    pub fn spawn(&self, mut source: mpsc::Receiver<AdapterBroadcast>) -> RelayHandle {
        let relay = self.clone();
        let task = tokio::spawn(async move {
            while let Some(broadcast) = source.recv().await {
                relay.publish(&broadcast);
            }
            debug!("Adapter broadcast source closed");
        });

        RelayHandle { task }
    }
}

/// Handle for a running relay task.
#[derive(Debug)]
pub struct RelayHandle {
    task: JoinHandle<()>,
}

impl RelayHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop relaying and wait for the task to end.
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ACTION_ADAPTER_STATE_CHANGED, STATE_ON};
    use rstest::rstest;
    use tokio::sync::broadcast::error::TryRecvError;

    #[rstest]
    #[case(AdapterState::Off, Some(false))]
    #[case(AdapterState::On, Some(true))]
    #[case(AdapterState::TurningOn, None)]
    #[case(AdapterState::TurningOff, None)]
    fn test_decode_state_change(#[case] state: AdapterState, #[case] expected: Option<bool>) {
        let event = decode_broadcast(&AdapterBroadcast::state_changed(state));
        assert_eq!(event.map(|e| e.enabled), expected);
    }

    #[test]
    fn test_decode_ignores_other_actions() {
        let broadcast = AdapterBroadcast::new("android.intent.action.SCREEN_ON", Some(STATE_ON));
        assert_eq!(decode_broadcast(&broadcast), None);
    }

    #[test]
    fn test_decode_unknown_raw_state() {
        let broadcast = AdapterBroadcast::new(ACTION_ADAPTER_STATE_CHANGED, Some(99));
        assert_eq!(decode_broadcast(&broadcast), None);
    }

    #[test]
    fn test_decode_missing_extra_is_off() {
        let broadcast = AdapterBroadcast::new(ACTION_ADAPTER_STATE_CHANGED, None);
        assert_eq!(decode_broadcast(&broadcast), Some(NfcStateEvent::new(false)));
    }

    #[tokio::test]
    async fn test_publish_emits_exactly_once() {
        let relay = HardwareStateRelay::new(8);
        let mut rx = relay.subscribe();

        relay.publish(&AdapterBroadcast::state_changed(AdapterState::Off));

        assert_eq!(rx.recv().await.unwrap(), NfcStateEvent::new(false));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_publish_transitional_emits_nothing() {
        let relay = HardwareStateRelay::new(8);
        let mut rx = relay.subscribe();

        assert_eq!(
            relay.publish(&AdapterBroadcast::state_changed(AdapterState::TurningOff)),
            None
        );
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_publish_without_subscribers_does_not_fail() {
        let relay = HardwareStateRelay::new(8);
        let event = relay.publish(&AdapterBroadcast::state_changed(AdapterState::On));
        assert_eq!(event, Some(NfcStateEvent::new(true)));
    }

    #[tokio::test]
    async fn test_spawned_relay_preserves_order() {
        let relay = HardwareStateRelay::new(8);
        let mut rx = relay.subscribe();
        let (tx, source) = mpsc::channel(8);
        let handle = relay.spawn(source);

        for state in [
            AdapterState::TurningOff,
            AdapterState::Off,
            AdapterState::TurningOn,
            AdapterState::On,
        ] {
            tx.send(AdapterBroadcast::state_changed(state)).await.unwrap();
        }

        assert_eq!(rx.recv().await.unwrap(), NfcStateEvent::new(false));
        assert_eq!(rx.recv().await.unwrap(), NfcStateEvent::new(true));

        drop(tx);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_relay_task_ends_when_source_closes() {
        let relay = HardwareStateRelay::new(8);
        let (tx, source) = mpsc::channel(1);
        let handle = relay.spawn(source);

        drop(tx);
        for _ in 0..50 {
            if handle.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(handle.is_finished());
    }
}
