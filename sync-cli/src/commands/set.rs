//! Edit a setting and sync it to the renderer.
//!
//! Each invocation runs one sync session: the editor publishes over an
//! in-process channel, the renderer applies the change and both stores are
//! flushed before the command returns.

use anyhow::{bail, Context, Result};
use facesync_client::{
    ChangeListener, ConfigStore, EngineConfig, FaceSettings, FileStore, LocalChangeObserver,
    LoopbackChannel, RenderHook, SyncPublisher, VisualUpdate,
};
use facesync_content::{AssetTransfer, MemoryAssetChannel};
use facesync_core::{keys, registry, Setting};
use facesync_types::{SettingValue, ValueType};
use std::path::Path;

/// Logs what the renderer would redraw.
struct TracingHook;

impl RenderHook for TracingHook {
    fn on_setting_changed(&self, name: &str, update: &VisualUpdate) {
        tracing::info!("Renderer updated {}: {:?}", name, update);
    }

    fn on_full_resync(&self, face: &FaceSettings) {
        tracing::info!("Renderer resynced: {:?}", face);
    }
}

/// Run the set command for a scalar value.
pub async fn run_value(
    data_dir: &Path,
    config: &EngineConfig,
    name: &str,
    raw: &str,
) -> Result<()> {
    let setting = registry().resolve(name)?;
    let value = parse_value(setting, raw)?;
    let assets = MemoryAssetChannel::new();
    sync_once(data_dir, config, assets, setting.name, value).await?;

    println!("{} synced", setting.name);
    Ok(())
}

/// Run the set-image command.
pub async fn run_image(data_dir: &Path, config: &EngineConfig, bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        bail!("Image file is empty");
    }

    let assets = MemoryAssetChannel::new();
    let handle = assets.put(bytes);
    sync_once(
        data_dir,
        config,
        assets,
        keys::BACKGROUND_ASSET,
        SettingValue::Asset(handle),
    )
    .await?;

    println!("Background image synced ({} bytes, {})", bytes.len(), handle);
    Ok(())
}

async fn sync_once(
    data_dir: &Path,
    config: &EngineConfig,
    assets: MemoryAssetChannel,
    name: &str,
    value: SettingValue,
) -> Result<()> {
    let editor = FileStore::open(config.editor_store(data_dir))?;
    let renderer = FileStore::open(config.renderer_store(data_dir))?;
    let asset_path = config.asset_path(data_dir);

    let (editor_end, renderer_end) = LoopbackChannel::pair();

    let observer = LocalChangeObserver::new(renderer.clone(), TracingHook, &asset_path);
    let subscription = observer.attach();

    let transfer =
        AssetTransfer::new(assets, &asset_path).with_deadline(config.transfer.deadline());
    let listener = ChangeListener::new(renderer.clone(), transfer)
        .with_queue_capacity(config.listener.queue_capacity);
    let handle = listener.spawn(renderer_end);

    let publisher = SyncPublisher::new(editor.clone(), editor_end);
    let published = publisher.publish(name, value);

    // Closing the editor end lets the listener drain and stop.
    publisher.shutdown().await;
    handle.join().await;
    observer.detach(subscription);

    published.with_context(|| format!("Failed to publish {}", name))?;

    editor.flush().context("Failed to save editor store")?;
    renderer.flush().context("Failed to save renderer store")?;
    tracing::debug!("Session for {} complete", name);
    Ok(())
}

/// Parse a command-line value for `setting`.
///
/// `int32` accepts decimal, `0x` hex or `#RRGGBB`/`#AARRGGBB` colors (an
/// omitted alpha means opaque).
pub fn parse_value(setting: &Setting, raw: &str) -> Result<SettingValue> {
    if !setting.is_synced() {
        bail!("{} is maintained by the renderer and cannot be set", setting.name);
    }

    let raw = raw.trim();
    let value = match setting.value_type {
        ValueType::Int32 => SettingValue::Int32(parse_int32(raw)?),
        ValueType::Float32 => SettingValue::Float32(
            raw.parse()
                .with_context(|| format!("Not a number: {}", raw))?,
        ),
        ValueType::Bool => SettingValue::Bool(match raw.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => true,
            "false" | "off" | "no" | "0" => false,
            _ => bail!("Not a boolean: {}", raw),
        }),
        ValueType::Utf8 => SettingValue::Utf8(raw.to_string()),
        ValueType::Asset => bail!("Use `facesync set-image` for {}", setting.name),
        ValueType::Int64 => bail!("{} cannot be set", setting.name),
    };

    setting.validate(&value)?;
    Ok(value)
}

fn parse_int32(raw: &str) -> Result<i32> {
    if let Some(hex) = raw.strip_prefix('#') {
        let argb = u32::from_str_radix(hex, 16)
            .with_context(|| format!("Not a color: {}", raw))?;
        return match hex.len() {
            6 => Ok((0xFF00_0000 | argb) as i32),
            8 => Ok(argb as i32),
            _ => bail!("Colors are #RRGGBB or #AARRGGBB: {}", raw),
        };
    }
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        let bits = u32::from_str_radix(hex, 16)
            .with_context(|| format!("Not a hex number: {}", raw))?;
        return Ok(bits as i32);
    }
    raw.parse()
        .with_context(|| format!("Not an integer: {}", raw))
}
