//! Per-socket inbound datagram fan-out.
//!
//! Several discovery networks may share one socket.  Each subscribes its own
//! handler here, and every received datagram is delivered to all of them, so
//! two networks on the same port each see every response.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback invoked with a datagram payload and its source address.
pub type DatagramHandler = Arc<dyn Fn(&[u8], SocketAddr) + Send + Sync>;

/// Handle returned by [`InboundFanout::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Subscriber list for one socket.
#[derive(Default)]
pub struct InboundFanout {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, DatagramHandler)>>,
}

impl InboundFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler` to the list.  It receives every datagram dispatched
    /// after this call returns.
    pub fn subscribe(&self, handler: DatagramHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, handler));
        id
    }

    /// Removes a handler.  Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Delivers one datagram to every current subscriber, in subscription
    /// order, and returns how many handlers were invoked.
    ///
    /// Handlers run without the list locked, so they may subscribe or
    /// unsubscribe.
    pub fn dispatch(&self, payload: &[u8], source: SocketAddr) -> usize {
        let snapshot: Vec<DatagramHandler> =
            self.lock().iter().map(|(_, h)| Arc::clone(h)).collect();
        for handler in &snapshot {
            handler(payload, source);
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    // Handlers never run under this lock, so a poisoned list is still consistent.
    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, DatagramHandler)>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for InboundFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundFanout")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
