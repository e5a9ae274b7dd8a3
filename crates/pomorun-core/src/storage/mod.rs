mod backend;
mod config;
pub mod database;
pub mod migrations;

pub use backend::RunBackend;
pub use config::Config;
pub use database::Database;

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/pomorun[-dev]/` based on POMORUN_ENV.
///
/// Set POMORUN_ENV=dev to use the development data directory, and
/// POMORUN_HOME to replace `~/.config` altogether.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = match std::env::var_os("POMORUN_HOME") {
        Some(home) => PathBuf::from(home),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config"),
    };

    let env = std::env::var("POMORUN_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pomorun-dev")
    } else {
        base_dir.join("pomorun")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
