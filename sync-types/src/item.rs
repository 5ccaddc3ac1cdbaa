//! DataItem - the payload published at a channel path.

use serde::{Deserialize, Serialize};

use crate::{SettingValue, TypesError};

/// Current payload format version.
pub const PAYLOAD_VERSION: u8 = 1;

/// A type-tagged key/value payload.
///
/// The channel addresses items by path; the item itself carries the payload
/// key and the tagged value so the receiver can decode without guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    /// Payload format version (currently 1)
    pub version: u8,
    /// Payload key inside the item
    pub key: String,
    /// The tagged value
    pub value: SettingValue,
    /// Unix timestamp (milliseconds) - informational only, not trusted
    pub timestamp: u64,
}

impl DataItem {
    /// Create a new item for publishing.
    ///
    /// Fails with `NotTransmittable` for device-local value types.
    pub fn new(key: &str, value: SettingValue) -> Result<Self, TypesError> {
        let value_type = value.value_type();
        if !value_type.is_transmittable() {
            return Err(TypesError::NotTransmittable(value_type));
        }
        Ok(Self {
            version: PAYLOAD_VERSION,
            key: key.to_string(),
            value,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        })
    }

    /// Serialize to MessagePack bytes (field names included).
    pub fn to_bytes(&self) -> Result<Vec<u8>, TypesError> {
        rmp_serde::to_vec_named(self).map_err(TypesError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    ///
    /// Rejects payloads from a newer format version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        let item: Self = rmp_serde::from_slice(bytes).map_err(TypesError::Deserialization)?;
        if item.version != PAYLOAD_VERSION {
            return Err(TypesError::UnsupportedVersion(item.version));
        }
        Ok(item)
    }
}
