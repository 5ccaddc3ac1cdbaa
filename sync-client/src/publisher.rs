//! Outbound sync publisher (editor side).
//!
//! Every edit is validated against the registry, written through to the
//! local store, and queued for a single background worker that talks to the
//! channel. The caller never waits on the network and gets no delivery
//! acknowledgment.
//!
//! ```text
//! edit → validate → store.set → queue → worker → channel.publish / delete
//! ```
//!
//! Selecting a background color also deletes the image path, and selecting
//! an image deletes the color path, so only one background representation
//! is ever live on the channel.

use facesync_core::{keys, registry, BackgroundMode, RegistryError};
use facesync_types::{DataItem, SettingValue, TypesError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::channel::DataChannel;
use crate::store::{ConfigStore, StoreError};

/// Publisher errors. All of them are raised before any I/O.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Unknown setting, wrong type or out-of-range value.
    #[error(transparent)]
    Invalid(#[from] RegistryError),

    /// The setting is device-local and has no remote path.
    #[error("setting {0} is local to this device")]
    LocalOnly(String),

    /// The payload could not be encoded.
    #[error("encode failed: {0}")]
    Encode(#[from] TypesError),

    /// The local write-through failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The worker has shut down.
    #[error("publisher closed")]
    Closed,
}

#[derive(Debug)]
enum Outbound {
    Publish { path: &'static str, payload: Vec<u8> },
    Delete { path: &'static str },
}

/// Editor-side publisher.
pub struct SyncPublisher<S: ConfigStore> {
    store: S,
    outbound: mpsc::UnboundedSender<Outbound>,
    worker: JoinHandle<()>,
}

impl<S: ConfigStore> SyncPublisher<S> {
    /// Create a publisher and spawn its channel worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<C: DataChannel + 'static>(store: S, channel: C) -> Self {
        let (outbound, queue) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(channel, queue));
        Self {
            store,
            outbound,
            worker,
        }
    }

    /// Get a reference to the local store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Publish a new value for a synced setting.
    ///
    /// Returns once the value is in the local store and queued for sending.
    ///
    /// # Errors
    ///
    /// - `Invalid` for unknown settings or values outside the setting's domain
    /// - `LocalOnly` for device-local settings
    /// - `Encode`/`Store` if the payload or the local write fails
    /// - `Closed` after [`shutdown`](Self::shutdown)
    pub fn publish(&self, name: &str, value: SettingValue) -> Result<(), PublishError> {
        let setting = registry().resolve(name)?;
        let remote = setting
            .remote
            .ok_or_else(|| PublishError::LocalOnly(setting.name.to_string()))?;
        setting.validate(&value)?;

        if self.outbound.is_closed() {
            return Err(PublishError::Closed);
        }

        let payload = DataItem::new(remote.payload_key, value.clone())?.to_bytes()?;

        self.store.set(setting.name, value)?;
        let counterpart = match setting.name {
            keys::BACKGROUND_COLOR => Some((BackgroundMode::Color, keys::BACKGROUND_ASSET)),
            keys::BACKGROUND_ASSET => Some((BackgroundMode::Image, keys::BACKGROUND_COLOR)),
            _ => None,
        };
        if let Some((mode, _)) = counterpart {
            self.store
                .set(keys::BACKGROUND_TYPE, SettingValue::Int32(mode.code()))?;
        }

        self.send(Outbound::Publish {
            path: remote.path,
            payload,
        })?;
        if let Some((_, other)) = counterpart {
            let other = registry().resolve(other)?;
            if let Some(other_remote) = other.remote {
                self.send(Outbound::Delete {
                    path: other_remote.path,
                })?;
            }
        }

        tracing::debug!("Queued {} for {}", setting.name, remote.path);
        Ok(())
    }

    fn send(&self, op: Outbound) -> Result<(), PublishError> {
        self.outbound.send(op).map_err(|_| PublishError::Closed)
    }

    /// Stop accepting edits and wait until every queued operation was sent.
    pub async fn shutdown(self) {
        let Self {
            outbound, worker, ..
        } = self;
        drop(outbound);
        if let Err(e) = worker.await {
            tracing::warn!("Publisher worker ended abnormally: {}", e);
        }
    }
}

async fn run_worker<C: DataChannel>(channel: C, mut queue: mpsc::UnboundedReceiver<Outbound>) {
    while let Some(op) = queue.recv().await {
        let result = match &op {
            Outbound::Publish { path, payload } => channel.publish(path, payload.clone()).await,
            Outbound::Delete { path } => channel.delete(path).await,
        };
        match result {
            Ok(()) => tracing::trace!("Sent {}", op_path(&op)),
            // Best effort: no retry, the next write to the same path heals it
            Err(e) => tracing::warn!("Failed to send {}: {}", op_path(&op), e),
        }
    }
    tracing::debug!("Publisher worker stopped");
}

fn op_path(op: &Outbound) -> &'static str {
    match op {
        Outbound::Publish { path, .. } | Outbound::Delete { path } => *path,
    }
}
