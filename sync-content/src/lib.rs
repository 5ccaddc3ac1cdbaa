//! # sync-content
//!
//! Out-of-band asset transfer for facesync.
//!
//! Scalar settings travel inline on the pub/sub channel; the background image
//! does not. The channel only carries an [`AssetHandle`], the BLAKE3 hash of
//! the image bytes, and the renderer pulls the bytes separately through an
//! [`AssetChannel`].
//!
//! ## Fetch Pipeline
//!
//! ```text
//! connect (deadline) → open(handle) → stream → BLAKE3 verify → rename into place
//!         ↓                 ↓                         ↓
//!   ConnectTimeout   StreamUnavailable          HashMismatch
//! ```
//!
//! 1. Connect within the deadline
//! 2. Open the byte stream for the handle
//! 3. Stream to `<destination>.part`, hashing as bytes arrive
//! 4. Compare against the handle, then rename over the destination
//!
//! The connection is released on every exit path, and a failed fetch never
//! leaves the partial file behind.
//!
//! ## Example
//!
//! ```rust,ignore
//! use facesync_content::{AssetTransfer, MemoryAssetChannel};
//!
//! let channel = MemoryAssetChannel::new();
//! let handle = channel.put(&png_bytes);
//!
//! let transfer = AssetTransfer::new(channel, "/data/background_image.png");
//! let path = transfer.fetch(&handle).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod channel;
mod error;

pub use channel::{AssetChannel, AssetStream, MemoryAssetChannel};
pub use error::TransferError;

use std::path::{Path, PathBuf};
use std::time::Duration;

use sync_types::AssetHandle;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Default deadline for establishing the transfer connection.
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(5000);

const CHUNK_SIZE: usize = 8 * 1024;

/// Fetches assets into a fixed local file.
pub struct AssetTransfer<C: AssetChannel> {
    channel: C,
    destination: PathBuf,
    deadline: Duration,
}

/// Releases the transfer connection when dropped.
struct ConnectionGuard<'a, C: AssetChannel> {
    channel: &'a C,
}

impl<C: AssetChannel> Drop for ConnectionGuard<'_, C> {
    fn drop(&mut self) {
        self.channel.disconnect();
    }
}

impl<C: AssetChannel> AssetTransfer<C> {
    /// Create a transfer client writing to `destination`.
    pub fn new(channel: C, destination: impl Into<PathBuf>) -> Self {
        Self {
            channel,
            destination: destination.into(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Override the deadline.
    ///
    /// The same deadline bounds the connect and, separately, the stream.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Local file the asset is written to.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Current deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Whether a fetched asset is present on disk.
    pub fn is_present(&self) -> bool {
        self.destination.is_file()
    }

    /// Get a reference to the underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Fetch the asset behind `handle` into the destination file.
    ///
    /// # Errors
    ///
    /// - `ConnectTimeout` if the connection is not up within the deadline
    /// - `Connection` if the channel refuses to connect
    /// - `StreamUnavailable` if the channel has no stream for `handle`
    /// - `StreamTimeout` if the stream does not open, or its bytes do not
    ///   arrive, within the deadline
    /// - `HashMismatch` if the bytes do not match `handle`
    /// - `Io` on local file errors
    ///
    /// On any error the destination keeps its previous content.
    pub async fn fetch(&self, handle: &AssetHandle) -> Result<PathBuf, TransferError> {
        let timeout_ms = self.deadline.as_millis() as u64;
        let _connection = ConnectionGuard {
            channel: &self.channel,
        };

        match tokio::time::timeout(self.deadline, self.channel.connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Asset connection failed: {}", e);
                return Err(e);
            }
            Err(_) => {
                tracing::warn!("Asset connect timeout ({} ms) for {}", timeout_ms, handle);
                return Err(TransferError::ConnectTimeout { timeout_ms });
            }
        }

        let opened = match tokio::time::timeout(self.deadline, self.channel.open(handle)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("Asset open timeout ({} ms) for {}", timeout_ms, handle);
                return Err(TransferError::StreamTimeout { timeout_ms });
            }
        };
        let stream = opened.ok_or_else(|| TransferError::StreamUnavailable {
            handle: handle.to_string(),
        })?;

        let part = part_path(&self.destination);
        let written = match tokio::time::timeout(
            self.deadline,
            write_verified(stream, handle, &part, &self.destination),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TransferError::StreamTimeout { timeout_ms }),
        };

        match written {
            Ok(len) => {
                tracing::debug!(
                    "Fetched asset {} ({} bytes) to {}",
                    handle,
                    len,
                    self.destination.display()
                );
                Ok(self.destination.clone())
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&part).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        tracing::debug!("Failed to remove {}: {}", part.display(), cleanup);
                    }
                }
                tracing::warn!("Asset fetch failed for {}: {}", handle, e);
                Err(e)
            }
        }
    }

    /// Remove the fetched asset, if any.
    ///
    /// Returns `Ok(true)` if a file was removed, `Ok(false)` if none existed.
    pub async fn discard(&self) -> Result<bool, TransferError> {
        match tokio::fs::remove_file(&self.destination).await {
            Ok(()) => {
                tracing::debug!("Discarded {}", self.destination.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

/// Stream into `part`, verify against `handle`, then rename over `destination`.
async fn write_verified(
    mut stream: AssetStream,
    handle: &AssetHandle,
    part: &Path,
    destination: &Path,
) -> Result<u64, TransferError> {
    if let Some(parent) = part.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = tokio::fs::File::create(part).await?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut len = 0u64;

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n]).await?;
        len += n as u64;
    }
    file.sync_all().await?;
    drop(file);

    let actual = hasher.finalize();
    if actual.as_bytes() != handle.as_bytes() {
        return Err(TransferError::HashMismatch {
            expected: hex::encode(handle.as_bytes()),
            actual: hex::encode(actual.as_bytes()),
        });
    }

    tokio::fs::rename(part, destination).await?;
    Ok(len)
}
