//! CLI command implementations.

pub mod set;
pub mod settings;
pub mod show;
