//! In-process channel linking an editor and a renderer.
//!
//! Both ends share one item table, standing in for the data layer, and each
//! end delivers its writes as events to the other.

use super::{ChannelError, DataChannel};
use async_trait::async_trait;
use facesync_types::ChannelEvent;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

type Items = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

/// One end of an in-process channel pair.
///
/// Dropping an end closes the other end's `recv()`.
#[derive(Debug)]
pub struct LoopbackChannel {
    items: Items,
    peer: mpsc::UnboundedSender<ChannelEvent>,
    incoming: tokio::sync::Mutex<mpsc::UnboundedReceiver<ChannelEvent>>,
    // Events in flight towards the peer, and towards this end.
    outbox: Arc<AtomicUsize>,
    inbox: Arc<AtomicUsize>,
}

impl LoopbackChannel {
    /// Create two connected ends.
    pub fn pair() -> (Self, Self) {
        let items: Items = Arc::default();
        let (to_b, from_a) = mpsc::unbounded_channel();
        let (to_a, from_b) = mpsc::unbounded_channel();
        let a_bound = Arc::new(AtomicUsize::new(0));
        let b_bound = Arc::new(AtomicUsize::new(0));

        let a = Self {
            items: Arc::clone(&items),
            peer: to_b,
            incoming: tokio::sync::Mutex::new(from_b),
            outbox: Arc::clone(&b_bound),
            inbox: Arc::clone(&a_bound),
        };
        let b = Self {
            items,
            peer: to_a,
            incoming: tokio::sync::Mutex::new(from_a),
            outbox: a_bound,
            inbox: b_bound,
        };
        (a, b)
    }

    fn items(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether an item is currently stored at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.items().contains_key(path)
    }

    /// Current item at `path`.
    pub fn item(&self, path: &str) -> Option<Vec<u8>> {
        self.items().get(path).cloned()
    }

    /// Paths currently holding an item.
    pub fn paths(&self) -> Vec<String> {
        self.items().keys().cloned().collect()
    }

    /// Events sent to this end that `recv()` has not returned yet.
    pub fn undelivered(&self) -> usize {
        self.inbox.load(Ordering::Acquire)
    }

    fn send(&self, event: ChannelEvent) -> bool {
        self.outbox.fetch_add(1, Ordering::AcqRel);
        if self.peer.send(event).is_err() {
            self.outbox.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        true
    }
}

#[async_trait]
impl DataChannel for LoopbackChannel {
    async fn publish(&self, path: &str, payload: Vec<u8>) -> Result<(), ChannelError> {
        self.items().insert(path.to_string(), payload.clone());
        let sent = self.send(ChannelEvent::Changed {
            path: path.to_string(),
            payload,
        });
        if !sent {
            return Err(ChannelError::PublishFailed("peer dropped".into()));
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ChannelError> {
        self.items().remove(path);
        let sent = self.send(ChannelEvent::Deleted {
            path: path.to_string(),
        });
        if !sent {
            return Err(ChannelError::DeleteFailed("peer dropped".into()));
        }
        Ok(())
    }

    async fn recv(&self) -> Result<ChannelEvent, ChannelError> {
        let event = self
            .incoming
            .lock()
            .await
            .recv()
            .await
            .ok_or(ChannelError::Closed)?;
        self.inbox.fetch_sub(1, Ordering::AcqRel);
        Ok(event)
    }
}
