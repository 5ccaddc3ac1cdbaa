//! Pub/sub channel abstraction for facesync.
//!
//! This module provides a pluggable, path-addressed channel between the
//! editor and the renderer (mock for testing, in-process loopback).
//!
//! # Design
//!
//! The channel trait is async and path-oriented:
//! - `publish()` writes an encoded [`DataItem`](facesync_types::DataItem) at a path
//! - `delete()` removes the item at a path
//! - `recv()` yields the next [`ChannelEvent`] from the other device
//!
//! Delivery is at-least-once with no ordering across paths.
//!
//! # Example
//!
//! ```ignore
//! let (editor, renderer) = LoopbackChannel::pair();
//! editor.publish("/text_color", payload).await?;
//! let event = renderer.recv().await?;
//! ```

mod loopback;
mod mock;

pub use loopback::LoopbackChannel;
pub use mock::MockChannel;

use std::sync::Arc;

use async_trait::async_trait;
use facesync_types::ChannelEvent;
use thiserror::Error;

/// Channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The other side is gone; no further events will arrive.
    #[error("channel closed")]
    Closed,

    /// Publish failed.
    #[error("publish failed: {0}")]
    PublishFailed(String),

    /// Delete failed.
    #[error("delete failed: {0}")]
    DeleteFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Path-addressed pub/sub channel between two devices.
#[async_trait]
pub trait DataChannel: Send + Sync {
    /// Write `payload` at `path`, replacing any previous item.
    async fn publish(&self, path: &str, payload: Vec<u8>) -> Result<(), ChannelError>;

    /// Remove the item at `path`.
    async fn delete(&self, path: &str) -> Result<(), ChannelError>;

    /// Wait for the next event from the other device.
    ///
    /// Returns `Closed` once no further events can arrive.
    async fn recv(&self) -> Result<ChannelEvent, ChannelError>;
}

#[async_trait]
impl<T: DataChannel + ?Sized> DataChannel for Arc<T> {
    async fn publish(&self, path: &str, payload: Vec<u8>) -> Result<(), ChannelError> {
        (**self).publish(path, payload).await
    }

    async fn delete(&self, path: &str) -> Result<(), ChannelError> {
        (**self).delete(path).await
    }

    async fn recv(&self) -> Result<ChannelEvent, ChannelError> {
        (**self).recv().await
    }
}
