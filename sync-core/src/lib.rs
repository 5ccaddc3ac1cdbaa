//! # sync-core
//!
//! Pure logic for facesync (no I/O, instant tests).
//!
//! This crate holds the parts of the sync engine that need no network or
//! disk access:
//! - [`registry`] - the catalog of settings, their remote paths and types
//! - [`face`] - typed views of the watch-face vocabulary
//! - [`display`] - the display-mode state machine behind change observation
//!
//! The actual I/O (channels, stores, asset transfers) is performed by
//! `sync-client` and `sync-content`, which interpret what these modules
//! produce.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod display;
pub mod face;
pub mod registry;

pub use display::{DisplayEvent, DisplayState, RenderAction, VisualProperty};
pub use face::{BackgroundMode, Font, TextCase, TextPosition, TextStyle};
pub use registry::{keys, registry, Registry, RegistryError, Remote, Setting};
