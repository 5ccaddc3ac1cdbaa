//! Tagged setting values.
//!
//! Every setting carries exactly one of these variants. The variant is the
//! type tag: encoders and decoders match on it instead of inspecting the
//! value at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::AssetHandle;

/// Declared type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// 32-bit signed integer (colors, enumerations)
    Int32,
    /// 64-bit signed integer (timestamps; local store only)
    Int64,
    /// 32-bit float (text size)
    Float32,
    /// Boolean flag
    Bool,
    /// UTF-8 string
    Utf8,
    /// Handle to an out-of-band binary asset
    Asset,
}

impl ValueType {
    /// Lowercase name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Int32 => "int32",
            ValueType::Int64 => "int64",
            ValueType::Float32 => "float32",
            ValueType::Bool => "bool",
            ValueType::Utf8 => "utf8",
            ValueType::Asset => "asset",
        }
    }

    /// Whether values of this type may travel over a pub/sub channel.
    ///
    /// `Int64` is reserved for device-local bookkeeping such as the
    /// background image timestamp.
    pub fn is_transmittable(self) -> bool {
        !matches!(self, ValueType::Int64)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A setting value with its type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SettingValue {
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit float
    Float32(f32),
    /// Boolean flag
    Bool(bool),
    /// UTF-8 string
    Utf8(String),
    /// Asset handle
    Asset(AssetHandle),
}

impl SettingValue {
    /// Get the type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            SettingValue::Int32(_) => ValueType::Int32,
            SettingValue::Int64(_) => ValueType::Int64,
            SettingValue::Float32(_) => ValueType::Float32,
            SettingValue::Bool(_) => ValueType::Bool,
            SettingValue::Utf8(_) => ValueType::Utf8,
            SettingValue::Asset(_) => ValueType::Asset,
        }
    }

    /// Get the value as an `i32`, if it is one.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            SettingValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an `i64`, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an `f32`, if it is one.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            SettingValue::Float32(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as a `bool`, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Utf8(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as an asset handle, if it is one.
    pub fn as_asset(&self) -> Option<&AssetHandle> {
        match self {
            SettingValue::Asset(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Int32(v) => write!(f, "{}", v),
            SettingValue::Int64(v) => write!(f, "{}", v),
            SettingValue::Float32(v) => write!(f, "{}", v),
            SettingValue::Bool(v) => write!(f, "{}", v),
            SettingValue::Utf8(v) => write!(f, "{:?}", v),
            SettingValue::Asset(v) => write!(f, "asset:{}", v),
        }
    }
}

impl From<i32> for SettingValue {
    fn from(v: i32) -> Self {
        SettingValue::Int32(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int64(v)
    }
}

impl From<f32> for SettingValue {
    fn from(v: f32) -> Self {
        SettingValue::Float32(v)
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Utf8(v.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        SettingValue::Utf8(v)
    }
}

impl From<AssetHandle> for SettingValue {
    fn from(v: AssetHandle) -> Self {
        SettingValue::Asset(v)
    }
}
