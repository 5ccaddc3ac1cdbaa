//! Show a device's current values.

use anyhow::Result;
use facesync_client::{Background, ConfigStore, EngineConfig, FaceSettings, FileStore};
use std::path::Path;

use crate::Device;

/// Run the show command.
pub fn run(data_dir: &Path, config: &EngineConfig, device: Device) -> Result<()> {
    let path = match device {
        Device::Editor => config.editor_store(data_dir),
        Device::Renderer => config.renderer_store(data_dir),
    };
    let store = FileStore::open(&path)?;

    println!("=== {:?} ({}) ===", device, path.display());
    println!();
    for (name, value) in store.snapshot() {
        println!("  {:<24} {}", name, value);
    }

    if device == Device::Renderer {
        let face = FaceSettings::load(&store, &config.asset_path(data_dir))?;
        println!();
        println!("Background: {}", describe_background(&face.background));
        println!(
            "Typeface:   {} ({:?})",
            face.typeface.font.display_name, face.typeface.style
        );
    }

    Ok(())
}

fn describe_background(background: &Background) -> String {
    match background {
        Background::Color(argb) => format!("color #{:08X}", *argb as u32),
        Background::Image(path) => format!("image {}", path.display()),
    }
}
