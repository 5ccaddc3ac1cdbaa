//! Mock channel for testing.
//!
//! Records published and deleted paths and replays queued events.

use super::{ChannelError, DataChannel};
use async_trait::async_trait;
use facesync_types::ChannelEvent;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mock channel for testing.
///
/// `recv()` drains the queued events and then reports `Closed`, so a
/// listener fed by a mock runs to completion on its own.
#[derive(Debug, Default, Clone)]
pub struct MockChannel {
    inner: Arc<Mutex<MockChannelInner>>,
}

#[derive(Debug, Default)]
struct MockChannelInner {
    published: Vec<(String, Vec<u8>)>,
    deleted: Vec<String>,
    incoming: VecDeque<ChannelEvent>,
    fail_next_publish: Option<String>,
    fail_next_delete: Option<String>,
    fail_next_recv: Option<String>,
}

impl MockChannel {
    /// Create a new mock channel.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockChannelInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an event to be returned by a later `recv()` call.
    pub fn queue_event(&self, event: ChannelEvent) {
        self.lock().incoming.push_back(event);
    }

    /// Queue a change event carrying `payload` at `path`.
    pub fn queue_change(&self, path: &str, payload: Vec<u8>) {
        self.queue_event(ChannelEvent::Changed {
            path: path.to_string(),
            payload,
        });
    }

    /// Get every `(path, payload)` that was published.
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.lock().published.clone()
    }

    /// Get the last `(path, payload)` that was published.
    pub fn last_published(&self) -> Option<(String, Vec<u8>)> {
        self.lock().published.last().cloned()
    }

    /// Get every path that was deleted.
    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    /// Cause the next publish() to fail with the given error.
    pub fn fail_next_publish(&self, error: &str) {
        self.lock().fail_next_publish = Some(error.to_string());
    }

    /// Cause the next delete() to fail with the given error.
    pub fn fail_next_delete(&self, error: &str) {
        self.lock().fail_next_delete = Some(error.to_string());
    }

    /// Cause the next recv() to fail with the given error.
    pub fn fail_next_recv(&self, error: &str) {
        self.lock().fail_next_recv = Some(error.to_string());
    }

    /// Clear all recorded traffic and queued events.
    pub fn reset(&self) {
        *self.lock() = MockChannelInner::default();
    }
}

#[async_trait]
impl DataChannel for MockChannel {
    async fn publish(&self, path: &str, payload: Vec<u8>) -> Result<(), ChannelError> {
        let mut inner = self.lock();

        if let Some(error) = inner.fail_next_publish.take() {
            return Err(ChannelError::PublishFailed(error));
        }

        inner.published.push((path.to_string(), payload));
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ChannelError> {
        let mut inner = self.lock();

        if let Some(error) = inner.fail_next_delete.take() {
            return Err(ChannelError::DeleteFailed(error));
        }

        inner.deleted.push(path.to_string());
        Ok(())
    }

    async fn recv(&self) -> Result<ChannelEvent, ChannelError> {
        let mut inner = self.lock();

        if let Some(error) = inner.fail_next_recv.take() {
            return Err(ChannelError::ReceiveFailed(error));
        }

        inner.incoming.pop_front().ok_or(ChannelError::Closed)
    }
}
