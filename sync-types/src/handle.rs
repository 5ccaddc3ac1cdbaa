//! Asset handles.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle referencing a binary asset (background image).
///
/// The handle is the BLAKE3 hash of the asset bytes, so a receiver can
/// verify what it streamed. Displayed as URL-safe base64.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle([u8; 32]);

impl AssetHandle {
    /// Compute the handle for the given asset bytes.
    pub fn for_content(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// The empty handle (no asset selected).
    pub const fn empty() -> Self {
        Self([0u8; 32])
    }

    /// Check if this is the empty handle.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Create a handle from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() == 32 {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(bytes);
            Some(Self(arr))
        } else {
            None
        }
    }

    /// Get the raw bytes of this handle.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check whether `bytes` are the content this handle refers to.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        *self == Self::for_content(bytes)
    }
}

impl Default for AssetHandle {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", URL_SAFE_NO_PAD.encode(self.0))
    }
}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetHandle({})", &self.to_string()[..8])
    }
}
