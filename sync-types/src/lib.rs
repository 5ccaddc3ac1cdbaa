//! # sync-types
//!
//! Wire format types for facesync watch-face configuration sync.
//!
//! This crate provides the foundational types shared by the editor and the
//! renderer:
//! - [`SettingValue`], [`ValueType`] - Tagged setting values
//! - [`AssetHandle`] - Content address of a background image
//! - [`DataItem`] - Type-tagged payload published on a channel path
//! - [`ChannelEvent`] - Change/delete notification delivered by a channel
//! - [`TypesError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod event;
mod handle;
mod item;
mod value;

pub use error::TypesError;
pub use event::ChannelEvent;
pub use handle::AssetHandle;
pub use item::{DataItem, PAYLOAD_VERSION};
pub use value::{SettingValue, ValueType};
