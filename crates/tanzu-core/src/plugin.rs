//! Installed plugin records and the on-disk plugin catalog.
//!
//! The catalog is written by the plugin installation subsystem; this crate
//! only reads it. Each record carries the plugin's target, its installation
//! path (which also keys the command-tree cache) and an optional command
//! remapping table.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Catalog file name inside the configuration directory.
pub const CATALOG_FILENAME: &str = "plugins.toml";

/// Command group a plugin is installed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Target {
    /// `kubernetes` (alias `k8s`); commands are also reachable at the root.
    Kubernetes,
    /// `mission-control` (alias `tmc`).
    MissionControl,
    /// `operations` (alias `ops`).
    Operations,
    /// Root-level plugins with no target group.
    #[default]
    Global,
    /// A target this CLI version does not know about.
    Other(String),
}

impl Target {
    /// Literal command-path segment for this target.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::MissionControl => "mission-control",
            Self::Operations => "operations",
            Self::Global => "global",
            Self::Other(name) => name,
        }
    }

    /// Whether this is the root-level target.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "kubernetes" | "k8s" => Self::Kubernetes,
            "mission-control" | "tmc" => Self::MissionControl,
            "operations" | "ops" => Self::Operations,
            "" | "global" => Self::Global,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Target> for String {
    fn from(value: Target) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a plugin's command remapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMapEntry {
    /// Space-separated command path inside the plugin. Empty maps the plugin root.
    #[serde(default)]
    pub source_command_path: String,
    /// Space-separated CLI command path (without the root command) the source is exposed at.
    pub destination_command_path: String,
    /// Optional help description for the remapped command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CommandMapEntry {
    /// Destination path split into segments.
    #[must_use]
    pub fn destination_segments(&self) -> Vec<&str> {
        self.destination_command_path.split_whitespace().collect()
    }
}

/// An installed plugin as recorded by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Plugin name, also its command name under the target group.
    pub name: String,
    /// Installed version.
    #[serde(default)]
    pub version: String,
    /// Target group the plugin belongs to.
    #[serde(default)]
    pub target: Target,
    /// Path to the plugin executable. Distinct installs have distinct paths.
    pub installation_path: PathBuf,
    /// Command remapping table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command_map: Vec<CommandMapEntry>,
}

impl PluginInfo {
    /// Installation path rendered as the command-tree cache key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        self.installation_path.to_string_lossy().into_owned()
    }

    /// Whether `segments` (a CLI path without the root command) starts at a remapped destination.
    #[must_use]
    pub fn is_remapped_path(&self, segments: &[&str]) -> bool {
        self.command_map.iter().any(|entry| {
            let destination = entry.destination_segments();
            !destination.is_empty() && segments.starts_with(&destination)
        })
    }
}

/// Read-only view over the installed plugins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginCatalog {
    /// Installed plugins in catalog order.
    #[serde(default)]
    pub plugins: Vec<PluginInfo>,
}

impl PluginCatalog {
    /// Load the catalog from `path`. A missing file yields an empty catalog.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                Error::Config(format!(
                    "Failed to parse plugin catalog {}: {e}",
                    path.display()
                ))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(Error::Io(err)),
        }
    }

    /// Persist the catalog to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Find the plugin installed at `installation_path`.
    #[must_use]
    pub fn find_by_installation_path(&self, installation_path: &str) -> Option<&PluginInfo> {
        self.plugins
            .iter()
            .find(|plugin| plugin.installation_path.as_os_str() == installation_path)
    }

    /// Find a plugin by name, optionally restricted to a target.
    #[must_use]
    pub fn find_by_name(&self, name: &str, target: Option<&Target>) -> Option<&PluginInfo> {
        self.plugins
            .iter()
            .find(|plugin| plugin.name == name && target.is_none_or(|t| &plugin.target == t))
    }
}
