//! End-to-end sync between an editor and a renderer over an in-process link.

use std::sync::Arc;
use std::time::Duration;

use facesync_client::{
    Background, ChangeListener, ConfigStore, HookCall, ListenerHandle, LocalChangeObserver,
    LoopbackChannel, MemoryStore, RecordingHook, SyncPublisher,
};
use facesync_content::{AssetTransfer, MemoryAssetChannel};
use facesync_core::face::color;
use facesync_core::{keys, BackgroundMode};
use facesync_types::{AssetHandle, SettingValue};

struct Rig {
    dir: tempfile::TempDir,
    editor: SyncPublisher<MemoryStore>,
    editor_store: MemoryStore,
    renderer_store: MemoryStore,
    assets: MemoryAssetChannel,
    link: Arc<LoopbackChannel>,
    listener: ListenerHandle,
}

impl Rig {
    fn start() -> Self {
        Self::start_with(MemoryAssetChannel::new(), Duration::from_millis(5000))
    }

    fn start_with(assets: MemoryAssetChannel, deadline: Duration) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let (editor_link, renderer_link) = LoopbackChannel::pair();
        let renderer_link = Arc::new(renderer_link);

        let editor_store = MemoryStore::new();
        let renderer_store = MemoryStore::new();

        let editor = SyncPublisher::new(editor_store.clone(), editor_link);
        let transfer = AssetTransfer::new(assets.clone(), dir.path().join("background_image.png"))
            .with_deadline(deadline);
        let listener =
            ChangeListener::new(renderer_store.clone(), transfer).spawn(Arc::clone(&renderer_link));

        Self {
            dir,
            editor,
            editor_store,
            renderer_store,
            assets,
            link: renderer_link,
            listener,
        }
    }

    fn image_path(&self) -> std::path::PathBuf {
        self.dir.path().join("background_image.png")
    }

    /// Flush the editor and wait until the renderer applied everything.
    async fn settle(self) -> Settled {
        let Rig {
            dir,
            editor,
            editor_store,
            renderer_store,
            link,
            listener,
            ..
        } = self;
        editor.shutdown().await;
        listener.join().await;
        Settled {
            dir,
            editor_store,
            renderer_store,
            link,
        }
    }
}

struct Settled {
    dir: tempfile::TempDir,
    editor_store: MemoryStore,
    renderer_store: MemoryStore,
    link: Arc<LoopbackChannel>,
}

impl Settled {
    fn image_path(&self) -> std::path::PathBuf {
        self.dir.path().join("background_image.png")
    }
}

fn image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 256) as u8).collect()
}

// ===========================================
// Scalar Propagation
// ===========================================

#[tokio::test]
async fn text_color_reaches_renderer() {
    let rig = Rig::start();
    rig.editor
        .publish(keys::TEXT_COLOR, SettingValue::Int32(0x00FF_FFFF))
        .unwrap();

    let done = rig.settle().await;
    assert_eq!(done.renderer_store.get_i32(keys::TEXT_COLOR).unwrap(), 0x00FF_FFFF);
}

#[tokio::test]
async fn every_value_type_round_trips() {
    let rig = Rig::start();
    let handle = rig.assets.put(&image(512));
    let values: Vec<(&str, SettingValue)> = vec![
        (keys::TEXT_STYLE, SettingValue::Int32(3)),
        (keys::TEXT_SHADOW, SettingValue::Bool(false)),
        (keys::TEXT_SIZE, SettingValue::Float32(15.0)),
        (keys::TEXT_FONT, SettingValue::from("dancing-script")),
        (keys::BACKGROUND_ASSET, SettingValue::Asset(handle)),
    ];
    for (name, value) in &values {
        rig.editor.publish(name, value.clone()).unwrap();
    }

    let done = rig.settle().await;
    for (name, value) in values {
        assert_eq!(done.renderer_store.get(name).unwrap(), value, "{}", name);
    }
}

#[tokio::test]
async fn republishing_overwrites() {
    let rig = Rig::start();
    rig.editor.publish(keys::TEXT_CASE, SettingValue::Int32(1)).unwrap();
    rig.editor.publish(keys::TEXT_CASE, SettingValue::Int32(2)).unwrap();

    let done = rig.settle().await;
    assert_eq!(done.renderer_store.get_i32(keys::TEXT_CASE).unwrap(), 2);
    assert_eq!(done.link.paths(), vec!["/text_case".to_string()]);
}

// ===========================================
// Background Mode
// ===========================================

#[tokio::test]
async fn ten_kilobyte_image_becomes_background() {
    let rig = Rig::start();
    let bytes = image(10 * 1024);
    let handle = rig.assets.put(&bytes);
    rig.editor
        .publish(keys::BACKGROUND_ASSET, handle.into())
        .unwrap();

    let done = rig.settle().await;
    assert_eq!(
        done.renderer_store.get_i32(keys::BACKGROUND_TYPE).unwrap(),
        BackgroundMode::Image.code()
    );
    let written = std::fs::metadata(done.image_path()).unwrap();
    assert_eq!(written.len(), 10 * 1024);
}

#[tokio::test]
async fn switching_color_to_image_leaves_one_representation() {
    let rig = Rig::start();
    let handle = rig.assets.put(&image(2048));

    rig.editor
        .publish(keys::BACKGROUND_COLOR, SettingValue::Int32(0x0033_6699))
        .unwrap();
    rig.editor
        .publish(keys::BACKGROUND_ASSET, SettingValue::Asset(handle))
        .unwrap();

    let done = rig.settle().await;

    // Remote
    assert!(done.link.contains("/background_asset"));
    assert!(!done.link.contains("/background_color"));

    // Editor
    assert_eq!(
        done.editor_store.get_i32(keys::BACKGROUND_TYPE).unwrap(),
        BackgroundMode::Image.code()
    );

    // Renderer
    assert_eq!(
        done.renderer_store.get_i32(keys::BACKGROUND_TYPE).unwrap(),
        BackgroundMode::Image.code()
    );
    assert_eq!(done.renderer_store.get_asset(keys::BACKGROUND_ASSET).unwrap(), handle);
    assert!(done.image_path().is_file());
}

#[tokio::test]
async fn switching_image_to_color_removes_image() {
    let rig = Rig::start();
    let handle = rig.assets.put(&image(2048));

    rig.editor
        .publish(keys::BACKGROUND_ASSET, SettingValue::Asset(handle))
        .unwrap();
    rig.editor
        .publish(keys::BACKGROUND_COLOR, SettingValue::Int32(0x0033_6699))
        .unwrap();

    let done = rig.settle().await;
    assert!(done.link.contains("/background_color"));
    assert!(!done.link.contains("/background_asset"));
    assert_eq!(
        done.renderer_store.get_i32(keys::BACKGROUND_TYPE).unwrap(),
        BackgroundMode::Color.code()
    );
    assert_eq!(done.renderer_store.get_i32(keys::BACKGROUND_COLOR).unwrap(), 0x0033_6699);
    assert!(!done.image_path().exists());
    assert!(done.renderer_store.get_asset(keys::BACKGROUND_ASSET).unwrap().is_empty());
}

// ===========================================
// Transfer Failures
// ===========================================

#[tokio::test]
async fn transfer_connect_failure_falls_back_to_black() {
    let assets = MemoryAssetChannel::new();
    let handle = assets.put(&image(1024));
    assets.fail_next_connect("peer unreachable");

    let rig = Rig::start_with(assets, Duration::from_millis(5000));
    rig.editor
        .publish(keys::BACKGROUND_ASSET, handle.into())
        .unwrap();

    let done = rig.settle().await;
    assert_eq!(
        done.renderer_store.get_i32(keys::BACKGROUND_TYPE).unwrap(),
        BackgroundMode::Color.code()
    );
    assert_eq!(
        done.renderer_store.get_i32(keys::BACKGROUND_COLOR).unwrap(),
        0x0000_0000
    );
}

#[tokio::test]
async fn transfer_beyond_deadline_leaves_no_partial_file() {
    let assets = MemoryAssetChannel::new();
    let handle = assets.put(&image(1024));
    assets.stall_connect(true);

    let rig = Rig::start_with(assets, Duration::from_millis(100));
    let part = {
        let mut name = rig.image_path().into_os_string();
        name.push(".part");
        std::path::PathBuf::from(name)
    };
    rig.editor
        .publish(keys::BACKGROUND_ASSET, handle.into())
        .unwrap();

    let done = rig.settle().await;
    assert_eq!(
        done.renderer_store.get_i32(keys::BACKGROUND_TYPE).unwrap(),
        BackgroundMode::Color.code()
    );
    assert_eq!(
        done.renderer_store.get_i32(keys::BACKGROUND_COLOR).unwrap(),
        color::FALLBACK_BACKGROUND
    );
    assert!(!done.image_path().exists());
    assert!(!part.exists());
}

#[tokio::test]
async fn failed_transfer_does_not_block_later_events() {
    let assets = MemoryAssetChannel::new();
    assets.fail_next_connect("peer unreachable");

    let rig = Rig::start_with(assets, Duration::from_millis(5000));
    rig.editor
        .publish(keys::BACKGROUND_ASSET, AssetHandle::for_content(b"gone").into())
        .unwrap();
    rig.editor
        .publish(keys::TEXT_SIZE, SettingValue::Float32(20.0))
        .unwrap();

    let done = rig.settle().await;
    assert_eq!(done.renderer_store.get_f32(keys::TEXT_SIZE).unwrap(), 20.0);
}

#[tokio::test]
async fn ingestion_continues_during_slow_transfer() {
    let assets = MemoryAssetChannel::new();
    let handle = assets.put(&image(1024));
    assets.stall_connect(true);

    let rig = Rig::start_with(assets, Duration::from_millis(1000));
    rig.editor
        .publish(keys::BACKGROUND_ASSET, handle.into())
        .unwrap();
    rig.editor
        .publish(keys::TEXT_SIZE, SettingValue::Float32(25.0))
        .unwrap();

    // The worker is stuck connecting, yet the channel is drained.
    let mut waited = Duration::ZERO;
    while rig.link.undelivered() > 0 && waited < Duration::from_millis(500) {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }
    assert_eq!(rig.link.undelivered(), 0);
    assert_eq!(rig.renderer_store.get_f32(keys::TEXT_SIZE).unwrap(), 30.0);

    let done = rig.settle().await;
    assert_eq!(done.renderer_store.get_f32(keys::TEXT_SIZE).unwrap(), 25.0);
    assert_eq!(
        done.renderer_store.get_i32(keys::BACKGROUND_TYPE).unwrap(),
        BackgroundMode::Color.code()
    );
}

// ===========================================
// Dimmed Mode
// ===========================================

#[tokio::test]
async fn dimmed_renderer_resyncs_once_on_wake() {
    let rig = Rig::start();
    let hook = RecordingHook::new();
    let observer =
        LocalChangeObserver::new(rig.renderer_store.clone(), hook.clone(), rig.image_path());
    observer.attach();

    observer.dim();
    rig.editor
        .publish(keys::TEXT_COLOR, SettingValue::Int32(0x00FF_FFFF))
        .unwrap();
    let _done = rig.settle().await;

    assert_eq!(hook.changed_count(), 0);
    assert_eq!(hook.calls(), vec![HookCall::Ambient]);

    observer.wake();
    assert_eq!(hook.changed_count(), 0);
    assert_eq!(hook.resync_count(), 1);
    match hook.calls().last() {
        Some(HookCall::FullResync(face)) => {
            assert_eq!(face.text_color, 0x00FF_FFFF);
            assert_eq!(face.background, Background::Color(color::HOLO_BLUE_DARK));
        }
        other => panic!("expected a full resync, got {:?}", other),
    }
}

#[tokio::test]
async fn interactive_renderer_sees_each_change() {
    let rig = Rig::start();
    let hook = RecordingHook::new();
    let observer =
        LocalChangeObserver::new(rig.renderer_store.clone(), hook.clone(), rig.image_path());
    observer.attach();

    rig.editor
        .publish(keys::TEXT_COLOR, SettingValue::Int32(1))
        .unwrap();
    rig.editor
        .publish(keys::TEXT_SHADOW, SettingValue::Bool(false))
        .unwrap();
    let _done = rig.settle().await;

    assert_eq!(hook.changed_count(), 2);
    assert_eq!(hook.resync_count(), 0);
}
