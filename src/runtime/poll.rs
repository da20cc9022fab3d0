//! Completion primitive and options for long-poll reads.

use hashbrown::HashMap;
use parking_lot::Mutex;
use tokio::{
    sync::oneshot,
    time::{Duration, timeout},
};

use crate::{
    doc::Patch,
    runtime::bus::SubscriptionBus,
    types::{SubscriptionId, Version},
};

/// Default long-poll deadline in milliseconds.
pub const DEFAULT_READ_BLOCK_TIME_MS: u64 = 50_000;

/// Options for [`crate::core::store::DocStore::poll`].
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// How long the poll may block waiting for a qualifying patch.
    pub read_block_time_ms: u64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            read_block_time_ms: DEFAULT_READ_BLOCK_TIME_MS,
        }
    }
}

/// Poll result: per key, the patches newer than the caller's floor.
pub type KeyedPatches = Vec<(String, Vec<Patch>)>;

/// Outcome of waiting for a live patch.
pub(crate) enum WaitOutcome {
    /// A qualifying patch arrived before the deadline.
    Resolved(KeyedPatches),
    /// The deadline elapsed with nothing qualifying.
    TimedOut,
}

/// One-shot subscription that completes on the first patch above a
/// per-key version floor.
///
/// Registration happens in `register`, before the caller's storage scan,
/// so a commit landing between scan and wait cannot be missed. Dropping
/// the waiter deregisters the handler, which covers every exit path.
pub(crate) struct PatchWaiter<'a> {
    bus: &'a SubscriptionBus,
    id: SubscriptionId,
    rx: Option<oneshot::Receiver<(String, Patch)>>,
}

impl<'a> PatchWaiter<'a> {
    pub(crate) fn register(bus: &'a SubscriptionBus, floors: &[(String, Version)]) -> Self {
        let floors: HashMap<String, Version> = floors.iter().cloned().collect();
        let (tx, rx) = oneshot::channel();
        let slot = Mutex::new(Some(tx));

        let id = bus.subscribe(Box::new(move |key, patch| {
            let Some(floor) = floors.get(key) else {
                return;
            };
            if patch.version > *floor {
                if let Some(tx) = slot.lock().take() {
                    let _ = tx.send((key.to_string(), patch.clone()));
                }
            }
        }));

        Self {
            bus,
            id,
            rx: Some(rx),
        }
    }

    /// Waits up to `block` for the handler to fire.
    pub(crate) async fn wait(mut self, block: Duration) -> WaitOutcome {
        let Some(rx) = self.rx.take() else {
            return WaitOutcome::TimedOut;
        };
        match timeout(block, rx).await {
            Ok(Ok((key, patch))) => WaitOutcome::Resolved(vec![(key, vec![patch])]),
            Ok(Err(_)) | Err(_) => WaitOutcome::TimedOut,
        }
    }
}

impl Drop for PatchWaiter<'_> {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}
