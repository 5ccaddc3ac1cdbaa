//! Change event listener (renderer side).
//!
//! Two tasks per listener: one ingests events from the channel into a
//! bounded queue, the other applies them to the local store one at a time.
//! A slow asset transfer therefore never stops the channel from being read.
//!
//! ```text
//! channel.recv → [ingest task] → bounded queue → [apply task] → store.set
//!                                                     ↓
//!                                              AssetTransfer::fetch
//! ```
//!
//! Every event is applied in isolation: a payload that fails to decode or a
//! transfer that fails is logged and the worker moves on to the next event.

use std::time::{SystemTime, UNIX_EPOCH};

use facesync_content::{AssetChannel, AssetTransfer};
use facesync_core::face::color;
use facesync_core::{keys, registry, BackgroundMode, RegistryError};
use facesync_types::{AssetHandle, ChannelEvent, DataItem, SettingValue, TypesError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::channel::{ChannelError, DataChannel};
use crate::store::{ConfigStore, StoreError};

/// Default capacity of the queue between ingestion and application.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Errors from applying a single event.
#[derive(Debug, Error)]
pub enum ListenError {
    /// The payload is not a valid item.
    #[error("decode failed for {path}: {source}")]
    Decode {
        /// Path the event arrived on.
        path: String,
        /// Underlying decode error.
        source: TypesError,
    },

    /// The item's payload key does not belong to its path.
    #[error("unexpected key {key} at {path}")]
    KeyMismatch {
        /// Path the event arrived on.
        path: String,
        /// Key found in the item.
        key: String,
    },

    /// The value is of the wrong type or out of range.
    #[error(transparent)]
    Invalid(#[from] RegistryError),

    /// The local write failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// What applying an event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// Nothing changed (deletion, or a path this build does not know).
    Ignored,
    /// A scalar setting was stored.
    Stored(&'static str),
    /// The background image was fetched and is now active.
    ImageFetched(AssetHandle),
    /// The image transfer failed; the fallback color is now active.
    ImageFallback,
}

/// Renderer-side listener.
pub struct ChangeListener<S: ConfigStore, A: AssetChannel> {
    store: S,
    transfer: AssetTransfer<A>,
    queue_capacity: usize,
}

impl<S, A> ChangeListener<S, A>
where
    S: ConfigStore + 'static,
    A: AssetChannel + 'static,
{
    /// Create a listener writing into `store` and fetching images with `transfer`.
    pub fn new(store: S, transfer: AssetTransfer<A>) -> Self {
        Self {
            store,
            transfer,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Set the capacity of the ingestion queue.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Get a reference to the local store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the asset transfer client.
    pub fn transfer(&self) -> &AssetTransfer<A> {
        &self.transfer
    }

    /// Start consuming `channel`.
    ///
    /// Both tasks stop once the channel reports `Closed` and the queue has
    /// drained. Must be called from within a Tokio runtime.
    pub fn spawn<C: DataChannel + 'static>(self, channel: C) -> ListenerHandle {
        let (tx, mut rx) = mpsc::channel::<ChannelEvent>(self.queue_capacity);

        let ingest = tokio::spawn(async move {
            loop {
                match channel.recv().await {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(ChannelError::Closed) => {
                        tracing::info!("Channel closed, listener stopping");
                        break;
                    }
                    Err(e) => tracing::warn!("Receive error: {}", e),
                }
            }
        });

        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let path = event.path().to_string();
                match self.apply(event).await {
                    Ok(applied) => tracing::debug!("Applied {}: {:?}", path, applied),
                    Err(e) => tracing::warn!("Dropped event for {}: {}", path, e),
                }
            }
        });

        ListenerHandle { ingest, worker }
    }

    /// Apply one event to the local store.
    ///
    /// Transfer failures are not errors: they switch the background to the
    /// fallback color and return [`Applied::ImageFallback`].
    pub async fn apply(&self, event: ChannelEvent) -> Result<Applied, ListenError> {
        let (path, payload) = match event {
            ChannelEvent::Changed { path, payload } => (path, payload),
            ChannelEvent::Deleted { path } => {
                // The counterpart of a background switch; the change itself
                // arrives on the other path.
                tracing::debug!("Ignoring deletion of {}", path);
                return Ok(Applied::Ignored);
            }
        };

        let Some(setting) = registry().by_path(&path) else {
            tracing::debug!("Ignoring unknown path {}", path);
            return Ok(Applied::Ignored);
        };

        let item = DataItem::from_bytes(&payload).map_err(|e| ListenError::Decode {
            path: path.clone(),
            source: e,
        })?;
        if setting.remote.map(|r| r.payload_key) != Some(item.key.as_str()) {
            return Err(ListenError::KeyMismatch {
                path,
                key: item.key,
            });
        }
        setting.validate(&item.value)?;

        match item.value {
            SettingValue::Asset(handle) => self.apply_image(handle).await,
            value => {
                self.store.set(setting.name, value)?;
                if setting.name == keys::BACKGROUND_COLOR {
                    self.store.set(
                        keys::BACKGROUND_TYPE,
                        SettingValue::Int32(BackgroundMode::Color.code()),
                    )?;
                    self.clear_image().await?;
                }
                Ok(Applied::Stored(setting.name))
            }
        }
    }

    async fn apply_image(&self, handle: AssetHandle) -> Result<Applied, ListenError> {
        match self.transfer.fetch(&handle).await {
            Ok(path) => {
                tracing::info!("Background image {} ready at {}", handle, path.display());
                self.store.set(
                    keys::BACKGROUND_TYPE,
                    SettingValue::Int32(BackgroundMode::Image.code()),
                )?;
                self.store.set(keys::BACKGROUND_ASSET, handle.into())?;
                self.store
                    .set(keys::BACKGROUND_LAST_CHANGED, SettingValue::Int64(now_ms()))?;
                Ok(Applied::ImageFetched(handle))
            }
            Err(e) => {
                tracing::warn!("Background image {} unavailable, using fallback: {}", handle, e);
                self.store.set(
                    keys::BACKGROUND_TYPE,
                    SettingValue::Int32(BackgroundMode::Color.code()),
                )?;
                self.store.set(
                    keys::BACKGROUND_COLOR,
                    SettingValue::Int32(color::FALLBACK_BACKGROUND),
                )?;
                self.clear_image().await?;
                Ok(Applied::ImageFallback)
            }
        }
    }

    /// Forget the image record: the stored handle and the local file.
    async fn clear_image(&self) -> Result<(), ListenError> {
        self.store
            .set(keys::BACKGROUND_ASSET, AssetHandle::empty().into())?;
        if let Err(e) = self.transfer.discard().await {
            tracing::warn!("Failed to remove background image: {}", e);
        }
        Ok(())
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Handle to a running listener.
pub struct ListenerHandle {
    ingest: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl ListenerHandle {
    /// Wait for both tasks to finish.
    pub async fn join(self) {
        if let Err(e) = self.ingest.await {
            tracing::warn!("Listener ingestion ended abnormally: {}", e);
        }
        if let Err(e) = self.worker.await {
            tracing::warn!("Listener worker ended abnormally: {}", e);
        }
    }

    /// Stop both tasks without draining the queue.
    pub fn abort(&self) {
        self.ingest.abort();
        self.worker.abort();
    }

    /// Whether both tasks have finished.
    pub fn is_finished(&self) -> bool {
        self.ingest.is_finished() && self.worker.is_finished()
    }
}
