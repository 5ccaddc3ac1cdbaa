//! List the settings catalog.

use facesync_core::{registry, Setting};

/// Run the settings command.
pub fn run() {
    println!("=== facesync settings ===");
    println!();

    for setting in registry().settings() {
        println!("{}", describe(setting));
    }
}

fn describe(setting: &Setting) -> String {
    let path = setting
        .remote
        .map(|r| r.path)
        .unwrap_or("(local only)");
    format!(
        "  {:<24} {:<8} {:<20} default {}",
        setting.name,
        setting.value_type.name(),
        path,
        setting.default
    )
}
