//! Well-known directories for configuration, caches and telemetry data.
//!
//! Each location honors an environment override first (trimmed, empty values
//! ignored) and otherwise falls back to a directory under the user's home.

use crate::{Error, Result};
use directories::BaseDirs;
use std::path::PathBuf;

/// Overrides the configuration directory (`config.toml`, `plugins.toml`).
pub const CONFIG_DIR_ENV: &str = "TANZU_CONFIG_DIR";
/// Overrides the command-tree cache directory. Intended for tests.
pub const COMMAND_TREE_CACHE_DIR_ENV: &str = "TANZU_CLI_COMMAND_TREE_CACHE_DIR";
/// Overrides the telemetry directory holding the metrics database.
pub const TELEMETRY_DIR_ENV: &str = "TANZU_CLI_TELEMETRY_DIR";

/// Directory holding the CLI configuration and the plugin catalog.
pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = env_dir(CONFIG_DIR_ENV) {
        return Ok(dir);
    }
    Ok(home_dir()?.join(".config").join("tanzu"))
}

/// Directory holding the persisted plugin command trees and docs scratch space.
pub fn command_tree_cache_dir() -> Result<PathBuf> {
    if let Some(dir) = env_dir(COMMAND_TREE_CACHE_DIR_ENV) {
        return Ok(dir);
    }
    Ok(home_dir()?
        .join(".cache")
        .join("tanzu")
        .join("plugin_command_tree"))
}

/// Directory holding the local metrics database and its lock file.
pub fn telemetry_dir() -> Result<PathBuf> {
    if let Some(dir) = env_dir(TELEMETRY_DIR_ENV) {
        return Ok(dir);
    }
    Ok(home_dir()?.join(".config").join("tanzu-cli-telemetry"))
}

fn env_dir(name: &str) -> Option<PathBuf> {
    let value = std::env::var(name).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

fn home_dir() -> Result<PathBuf> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or_else(|| Error::Config("Failed to determine home directory".into()))
}
