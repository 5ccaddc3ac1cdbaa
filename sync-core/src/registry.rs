//! Config path registry.
//!
//! The single catalog mapping logical setting names to their remote path,
//! payload key, value type and default. Publisher and listener both resolve
//! through here so they can never disagree on encoding.

use std::sync::OnceLock;

use facesync_types::{AssetHandle, SettingValue, ValueType};
use thiserror::Error;

use crate::face::{color, BackgroundMode, Font, TextCase, TextPosition, TextStyle, TEXT_SIZE_LARGE};

/// Logical setting names.
pub mod keys {
    /// Solid background color (ARGB).
    pub const BACKGROUND_COLOR: &str = "background_color";
    /// Background image handle.
    pub const BACKGROUND_ASSET: &str = "background_asset";
    /// Text color (ARGB).
    pub const TEXT_COLOR: &str = "text_color";
    /// Text style (normal/bold/italic/bold-italic).
    pub const TEXT_STYLE: &str = "text_style";
    /// Whether the text has a drop shadow.
    pub const TEXT_SHADOW: &str = "text_shadow";
    /// Text size in scaled pixels.
    pub const TEXT_SIZE: &str = "text_size";
    /// Text position on a 3x3 grid.
    pub const TEXT_POSITION: &str = "text_position";
    /// Text capitalization.
    pub const TEXT_CASE: &str = "text_case";
    /// Font code.
    pub const TEXT_FONT: &str = "text_font";
    /// Active background mode (device-local).
    pub const BACKGROUND_TYPE: &str = "background_type";
    /// When the background image last changed, ms since epoch (device-local).
    pub const BACKGROUND_LAST_CHANGED: &str = "background_last_changed";
}

/// Errors from registry lookups and value validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// No setting with this logical name.
    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    /// The value's type differs from the declared type.
    #[error("type mismatch for {name}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Setting name.
        name: String,
        /// Declared type.
        expected: ValueType,
        /// Type of the offered value.
        actual: ValueType,
    },

    /// The value has the right type but is outside the allowed domain.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue {
        /// Setting name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Remote binding of a synced setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remote {
    /// Channel path the item is published at.
    pub path: &'static str,
    /// Key of the value inside the published item.
    pub payload_key: &'static str,
}

/// A setting definition. Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    /// Logical name, also the local store key.
    pub name: &'static str,
    /// Remote binding, `None` for device-local settings.
    pub remote: Option<Remote>,
    /// Declared value type.
    pub value_type: ValueType,
    /// Value returned by a store when the setting was never written.
    pub default: SettingValue,
}

impl Setting {
    fn synced(name: &'static str, path: &'static str, default: SettingValue) -> Self {
        Self {
            name,
            remote: Some(Remote {
                path,
                payload_key: name,
            }),
            value_type: default.value_type(),
            default,
        }
    }

    fn local(name: &'static str, default: SettingValue) -> Self {
        Self {
            name,
            remote: None,
            value_type: default.value_type(),
            default,
        }
    }

    /// Whether this setting is published to the other device.
    pub fn is_synced(&self) -> bool {
        self.remote.is_some()
    }

    /// Check a value's type against the declared type.
    pub fn check_type(&self, value: &SettingValue) -> Result<(), RegistryError> {
        let actual = value.value_type();
        if actual != self.value_type {
            return Err(RegistryError::TypeMismatch {
                name: self.name.to_string(),
                expected: self.value_type,
                actual,
            });
        }
        Ok(())
    }

    /// Check type and value domain.
    pub fn validate(&self, value: &SettingValue) -> Result<(), RegistryError> {
        self.check_type(value)?;

        let reason = match (self.name, value) {
            (keys::TEXT_STYLE, SettingValue::Int32(v)) if TextStyle::from_code(*v).is_none() => {
                Some(format!("style {} not in 0..=3", v))
            }
            (keys::TEXT_POSITION, SettingValue::Int32(v))
                if TextPosition::from_code(*v).is_none() =>
            {
                Some(format!("position {} not in 0..=8", v))
            }
            (keys::TEXT_CASE, SettingValue::Int32(v)) if TextCase::from_code(*v).is_none() => {
                Some(format!("case {} not in 0..=2", v))
            }
            (keys::BACKGROUND_TYPE, SettingValue::Int32(v))
                if BackgroundMode::from_code(*v).is_none() =>
            {
                Some(format!("background type {} not in 0..=1", v))
            }
            (keys::TEXT_SIZE, SettingValue::Float32(v)) if !v.is_finite() || *v <= 0.0 => {
                Some(format!("size {} must be positive", v))
            }
            (keys::TEXT_FONT, SettingValue::Utf8(code)) if !Font::is_known(code) => {
                Some(format!("unknown font code {:?}", code))
            }
            _ => None,
        };

        match reason {
            Some(reason) => Err(RegistryError::InvalidValue {
                name: self.name.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// The catalog of settings.
#[derive(Debug, Clone)]
pub struct Registry {
    settings: Vec<Setting>,
}

impl Registry {
    /// Build the watch-face settings catalog.
    pub fn standard() -> Self {
        let settings = vec![
            Setting::synced(
                keys::BACKGROUND_COLOR,
                "/background_color",
                SettingValue::Int32(color::HOLO_BLUE_DARK),
            ),
            Setting::synced(
                keys::BACKGROUND_ASSET,
                "/background_asset",
                SettingValue::Asset(AssetHandle::empty()),
            ),
            Setting::synced(
                keys::TEXT_COLOR,
                "/text_color",
                SettingValue::Int32(color::WHITE),
            ),
            Setting::synced(
                keys::TEXT_STYLE,
                "/text_style",
                SettingValue::Int32(TextStyle::Bold.code()),
            ),
            Setting::synced(keys::TEXT_SHADOW, "/text_shadow", SettingValue::Bool(true)),
            Setting::synced(
                keys::TEXT_SIZE,
                "/text_size",
                SettingValue::Float32(TEXT_SIZE_LARGE),
            ),
            Setting::synced(
                keys::TEXT_POSITION,
                "/text_position",
                SettingValue::Int32(TextPosition::CenterCenter.code()),
            ),
            Setting::synced(
                keys::TEXT_CASE,
                "/text_case",
                SettingValue::Int32(TextCase::NoCaps.code()),
            ),
            Setting::synced(
                keys::TEXT_FONT,
                "/text_font",
                SettingValue::from(Font::DEFAULT_CODE),
            ),
            Setting::local(
                keys::BACKGROUND_TYPE,
                SettingValue::Int32(BackgroundMode::Color.code()),
            ),
            Setting::local(keys::BACKGROUND_LAST_CHANGED, SettingValue::Int64(0)),
        ];
        Self { settings }
    }

    /// Resolve a logical name.
    pub fn resolve(&self, name: &str) -> Result<&Setting, RegistryError> {
        self.settings
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| RegistryError::UnknownSetting(name.to_string()))
    }

    /// Reverse lookup from a remote path.
    ///
    /// Returns `None` for paths this build does not know about.
    pub fn by_path(&self, path: &str) -> Option<&Setting> {
        self.settings
            .iter()
            .find(|s| s.remote.map(|r| r.path) == Some(path))
    }

    /// All settings, in catalog order.
    pub fn settings(&self) -> &[Setting] {
        &self.settings
    }

    /// Settings that are published to the other device.
    pub fn synced(&self) -> impl Iterator<Item = &Setting> {
        self.settings.iter().filter(|s| s.is_synced())
    }
}

/// The process-wide settings catalog.
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::standard)
}
