//! Asset transfer channel.
//!
//! This module provides the trait the transfer client pulls bytes through,
//! plus an in-memory implementation shared by the editor and renderer in
//! tests and in the CLI's loopback mode.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use sync_types::AssetHandle;
use tokio::io::AsyncRead;

use crate::error::TransferError;

/// Byte stream for one asset.
pub type AssetStream = Box<dyn AsyncRead + Send + Unpin>;

/// Connection-oriented source of asset bytes.
///
/// A caller connects, opens zero or more streams and disconnects. The
/// deadline is imposed by the caller, not the channel.
#[async_trait]
pub trait AssetChannel: Send + Sync {
    /// Establish the transfer connection.
    async fn connect(&self) -> Result<(), TransferError>;

    /// Open the byte stream for `handle`.
    ///
    /// Returns `Ok(None)` when the channel has no such asset.
    async fn open(&self, handle: &AssetHandle) -> Result<Option<AssetStream>, TransferError>;

    /// Release the transfer connection.
    ///
    /// Must be safe to call when not connected.
    fn disconnect(&self);
}

/// In-memory asset channel.
///
/// Clones share state, so the uploading side can `put` assets that the
/// fetching side later opens.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssetChannel {
    inner: Arc<Mutex<MemoryAssetInner>>,
}

#[derive(Debug, Default)]
struct MemoryAssetInner {
    assets: HashMap<AssetHandle, Vec<u8>>,
    connected: bool,
    connects: usize,
    disconnects: usize,
    fail_next_connect: Option<String>,
    stall_connect: bool,
}

impl MemoryAssetChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryAssetInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Upload bytes and return their content handle.
    pub fn put(&self, bytes: &[u8]) -> AssetHandle {
        let handle = AssetHandle::for_content(bytes);
        self.lock().assets.insert(handle, bytes.to_vec());
        handle
    }

    /// Store bytes under an arbitrary handle, bypassing content addressing.
    pub fn insert_raw(&self, handle: AssetHandle, bytes: Vec<u8>) {
        self.lock().assets.insert(handle, bytes);
    }

    /// Remove an asset. Returns whether it was present.
    pub fn remove(&self, handle: &AssetHandle) -> bool {
        self.lock().assets.remove(handle).is_some()
    }

    /// Whether the asset is stored.
    pub fn contains(&self, handle: &AssetHandle) -> bool {
        self.lock().assets.contains_key(handle)
    }

    /// Number of stored assets.
    pub fn len(&self) -> usize {
        self.lock().assets.len()
    }

    /// Whether no assets are stored.
    pub fn is_empty(&self) -> bool {
        self.lock().assets.is_empty()
    }

    /// Whether a connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Number of successful `connect()` calls.
    pub fn connect_count(&self) -> usize {
        self.lock().connects
    }

    /// Number of `disconnect()` calls.
    pub fn disconnect_count(&self) -> usize {
        self.lock().disconnects
    }

    /// Cause the next `connect()` to fail with the given error.
    pub fn fail_next_connect(&self, error: &str) {
        self.lock().fail_next_connect = Some(error.to_string());
    }

    /// Make every `connect()` hang until the caller gives up.
    pub fn stall_connect(&self, stall: bool) {
        self.lock().stall_connect = stall;
    }
}

#[async_trait]
impl AssetChannel for MemoryAssetChannel {
    async fn connect(&self) -> Result<(), TransferError> {
        let stall = {
            let mut inner = self.lock();
            if let Some(error) = inner.fail_next_connect.take() {
                return Err(TransferError::Connection(error));
            }
            inner.stall_connect
        };

        if stall {
            std::future::pending::<()>().await;
        }

        let mut inner = self.lock();
        inner.connected = true;
        inner.connects += 1;
        Ok(())
    }

    async fn open(&self, handle: &AssetHandle) -> Result<Option<AssetStream>, TransferError> {
        let inner = self.lock();
        if !inner.connected {
            return Err(TransferError::Connection("not connected".into()));
        }
        Ok(inner
            .assets
            .get(handle)
            .cloned()
            .map(|bytes| Box::new(std::io::Cursor::new(bytes)) as AssetStream))
    }

    fn disconnect(&self) {
        let mut inner = self.lock();
        inner.connected = false;
        inner.disconnects += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    // ===========================================
    // Asset Table Tests
    // ===========================================

    #[test]
    fn put_is_content_addressed() {
        let channel = MemoryAssetChannel::new();
        let a = channel.put(b"png bytes");
        let b = channel.put(b"png bytes");

        assert_eq!(a, b);
        assert_eq!(a, AssetHandle::for_content(b"png bytes"));
        assert_eq!(channel.len(), 1);
    }

    #[test]
    fn remove_and_contains() {
        let channel = MemoryAssetChannel::new();
        let handle = channel.put(b"image");
        assert!(channel.contains(&handle));

        assert!(channel.remove(&handle));
        assert!(!channel.remove(&handle));
        assert!(channel.is_empty());
    }

    // ===========================================
    // Connection Tests
    // ===========================================

    #[tokio::test]
    async fn open_requires_connection() {
        let channel = MemoryAssetChannel::new();
        let handle = channel.put(b"image");

        let result = channel.open(&handle).await;
        assert!(matches!(result, Err(TransferError::Connection(_))));
    }

    #[tokio::test]
    async fn open_streams_stored_bytes() {
        let channel = MemoryAssetChannel::new();
        let handle = channel.put(b"image");
        channel.connect().await.unwrap();

        let mut stream = channel.open(&handle).await.unwrap().unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();

        assert_eq!(out, b"image");
    }

    #[tokio::test]
    async fn open_missing_asset_is_none() {
        let channel = MemoryAssetChannel::new();
        channel.connect().await.unwrap();

        let stream = channel.open(&AssetHandle::for_content(b"nope")).await.unwrap();
        assert!(stream.is_none());
    }

    #[tokio::test]
    async fn forced_connect_failure_is_one_shot() {
        let channel = MemoryAssetChannel::new();
        channel.fail_next_connect("radio off");

        assert!(matches!(
            channel.connect().await,
            Err(TransferError::Connection(_))
        ));
        assert!(!channel.is_connected());

        channel.connect().await.unwrap();
        assert!(channel.is_connected());
        assert_eq!(channel.connect_count(), 1);
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let uploader = MemoryAssetChannel::new();
        let fetcher = uploader.clone();

        let handle = uploader.put(b"shared");
        assert!(fetcher.contains(&handle));

        fetcher.connect().await.unwrap();
        fetcher.disconnect();
        assert_eq!(uploader.disconnect_count(), 1);
    }
}
