//! Error types for sync-content.

use thiserror::Error;

/// Errors that can occur while fetching an asset.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The transfer connection was not established within the deadline.
    #[error("connect timed out after {timeout_ms} ms")]
    ConnectTimeout {
        /// Deadline that elapsed.
        timeout_ms: u64,
    },

    /// The byte stream did not finish within the deadline.
    #[error("stream timed out after {timeout_ms} ms")]
    StreamTimeout {
        /// Deadline that elapsed.
        timeout_ms: u64,
    },

    /// The transfer connection could not be established.
    #[error("asset connection failed: {0}")]
    Connection(String),

    /// The channel has no byte stream for this asset.
    #[error("no stream for asset {handle}")]
    StreamUnavailable {
        /// Display form of the requested handle.
        handle: String,
    },

    /// Received bytes do not hash to the requested handle.
    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Expected hash (hex-encoded).
        expected: String,
        /// Actual hash (hex-encoded).
        actual: String,
    },

    /// Reading the stream or writing the local file failed.
    #[error("asset I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// Whether the failure was a deadline expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransferError::ConnectTimeout { .. } | TransferError::StreamTimeout { .. }
        )
    }
}
