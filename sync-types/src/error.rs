//! Error types for facesync wire types.

use thiserror::Error;

use crate::ValueType;

/// Errors that can occur while encoding or decoding wire types.
#[derive(Debug, Error)]
pub enum TypesError {
    /// MessagePack serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] rmp_serde::encode::Error),

    /// MessagePack deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] rmp_serde::decode::Error),

    /// Invalid payload version
    #[error("unsupported payload version: {0}")]
    UnsupportedVersion(u8),

    /// Value type that only exists in the local store
    #[error("value type {0} cannot be sent over a channel")]
    NotTransmittable(ValueType),

    /// Invalid data format
    #[error("invalid data: {0}")]
    InvalidData(String),
}
