//! In-process publish/subscribe of committed `(key, patch)` events.
//!
//! Invariants:
//! - fan-out is synchronous: `publish` returns only after every registered
//!   handler has run
//! - handlers must not block and must not subscribe or unsubscribe from
//!   inside their callback
//! - events for one key arrive in version order (commits are serialized)

use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::{doc::Patch, types::SubscriptionId};

/// Callback invoked with each committed `(key, patch)` event.
pub type PatchHandler = Box<dyn Fn(&str, &Patch) + Send + Sync>;

/// Registry of patch handlers with synchronous fan-out.
#[derive(Default)]
pub struct SubscriptionBus {
    handlers: Mutex<HashMap<SubscriptionId, PatchHandler>>,
    next_id: AtomicU64,
}

impl SubscriptionBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` and returns its id.
    pub fn subscribe(&self, handler: PatchHandler) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().insert(id, handler);
        id
    }

    /// Removes a handler. Returns false when the id is already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.handlers.lock().remove(&id).is_some()
    }

    /// Delivers one event to every registered handler.
    pub fn publish(&self, key: &str, patch: &Patch) {
        let handlers = self.handlers.lock();
        for handler in handlers.values() {
            handler(key, patch);
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().len()
    }
}
