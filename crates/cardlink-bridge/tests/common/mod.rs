//! Shared helpers for bridge integration tests.
//!
//! Every test drives a real [`CardBridge`] wired to a [`MockPlatform`]. The
//! mock command layer answers from its own threads, so results are awaited
//! with a timeout rather than assumed.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cardlink_bridge::mock::MockPlatform;
use cardlink_bridge::{BridgeConfig, CardBridge, Outcome, PendingResponse};
use cardlink_core::ErrorRecord;
use tokio::time::timeout;

/// Bridge plus the platform it was built on.
pub struct Harness {
    pub bridge: CardBridge,
    pub platform: Arc<MockPlatform>,
}

/// Bridge initialized against a foreground context with an enabled adapter.
pub fn harness() -> Harness {
    harness_with(MockPlatform::new(), BridgeConfig::default())
}

pub fn harness_with(platform: MockPlatform, config: BridgeConfig) -> Harness {
    let platform = Arc::new(platform);
    let bridge = CardBridge::new(platform.clone(), config);
    Harness { bridge, platform }
}

/// Await an invocation, failing the test if it never resolves.
pub async fn settle(pending: PendingResponse) -> Outcome {
    timeout(Duration::from_secs(5), pending)
        .await
        .expect("invocation did not resolve")
}

/// Await an invocation expected to fail.
pub async fn settle_err(pending: PendingResponse) -> ErrorRecord {
    settle(pending).await.expect_err("invocation unexpectedly succeeded")
}

/// Poll `condition` until it holds or a second has passed.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
