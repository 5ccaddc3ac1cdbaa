//! # sync-client
//!
//! Sync engine for facesync watch-face configuration.
//!
//! This is the library the editor and the renderer embed. It wires the pure
//! logic from `sync-core` to a local store, a pub/sub channel and the asset
//! transfer client from `sync-content`.
//!
//! ## Components
//!
//! - **Local Config Store**: [`ConfigStore`] with memory and JSON-file backends
//! - **Outbound Sync Publisher**: [`SyncPublisher`], validate, write through, publish
//! - **Change Event Listener**: [`ChangeListener`], bounded queue, one worker
//! - **Local Change Observer**: [`LocalChangeObserver`], dimmed-mode aware refreshes
//! - **Channel Abstraction**: [`DataChannel`] (mock, in-process loopback)
//!
//! ## Example
//!
//! ```ignore
//! use facesync_client::{ChangeListener, LoopbackChannel, MemoryStore, SyncPublisher};
//! use facesync_content::{AssetTransfer, MemoryAssetChannel};
//!
//! let (editor_link, renderer_link) = LoopbackChannel::pair();
//!
//! let publisher = SyncPublisher::new(MemoryStore::new(), editor_link);
//! let transfer = AssetTransfer::new(MemoryAssetChannel::new(), "background_image.png");
//! let listener = ChangeListener::new(MemoryStore::new(), transfer).spawn(renderer_link);
//!
//! publisher.publish("text_color", SettingValue::Int32(0x00FF_FFFF))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod listener;
pub mod observer;
pub mod publisher;
pub mod store;

pub use channel::{ChannelError, DataChannel, LoopbackChannel, MockChannel};
pub use config::{ConfigError, EngineConfig};
pub use listener::{Applied, ChangeListener, ListenError, ListenerHandle};
pub use observer::{
    Background, FaceSettings, HookCall, LocalChangeObserver, RecordingHook, RenderHook, Typeface,
    VisualUpdate,
};
pub use publisher::{PublishError, SyncPublisher};
pub use store::{ConfigStore, FileStore, MemoryStore, StoreError, StoreListener, SubscriptionId};
