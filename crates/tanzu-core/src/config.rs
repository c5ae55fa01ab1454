//! CLI configuration file (`config.toml`).
//!
//! Holds the CEIP opt-in choice, the stable CLI instance id, the telemetry
//! settings and the contexts the user has logged into. Only the fields the
//! telemetry subsystem reads are modeled.

use crate::paths;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Configuration file name inside the configuration directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Kind of server a context talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextType {
    /// A kubeconfig-backed cluster context.
    Kubernetes,
    /// A Tanzu Mission Control endpoint.
    MissionControl,
    /// A Tanzu Platform (organization/project/space) endpoint.
    Tanzu,
}

impl ContextType {
    /// Canonical literal, also the key under `[current_context]`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::MissionControl => "mission-control",
            Self::Tanzu => "tanzu",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server context the user has logged into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Context name, unique per type.
    pub name: String,
    /// Context kind.
    #[serde(rename = "type")]
    pub context_type: ContextType,
    /// Server endpoint URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    /// Refresh token (Mission Control contexts).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    /// Organization id (Tanzu contexts).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub org_id: String,
    /// Project name (Tanzu contexts).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    /// Space name (Tanzu contexts).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub space: String,
    /// Cluster group name (Tanzu contexts).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_group: String,
    /// Kubeconfig file backing the context.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kube_config_path: String,
    /// Context name inside the kubeconfig.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kube_context: String,
}

impl Context {
    /// Empty context of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, context_type: ContextType) -> Self {
        Self {
            name: name.into(),
            context_type,
            endpoint: String::new(),
            refresh_token: String::new(),
            org_id: String::new(),
            project: String::new(),
            space: String::new(),
            cluster_group: String::new(),
            kube_config_path: String::new(),
            kube_context: String::new(),
        }
    }
}

/// `[telemetry]` settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryOptions {
    /// Metrics database the telemetry plugin reads from.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// Whether this CLI is used by an internal (employee) user.
    #[serde(default)]
    pub is_internal: bool,
}

/// The CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Customer Experience Improvement Program opt-in. `None` means never asked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceip_opt_in: Option<bool>,
    /// Stable id of this CLI installation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_id: Option<String>,
    /// Telemetry settings.
    #[serde(default)]
    pub telemetry: TelemetryOptions,
    /// Known contexts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<Context>,
    /// Active context name per context type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub current_context: BTreeMap<String, String>,
}

impl CliConfig {
    /// Default location of the configuration file.
    pub fn default_path() -> Result<PathBuf> {
        Ok(paths::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config: {e}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(Error::Config(format!("Failed to read config: {err}"))),
        }
    }

    /// Persist to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;
        Ok(())
    }

    /// Return the CLI id, generating one if none is stored yet.
    ///
    /// The boolean is `true` when a new id was generated and the config
    /// needs to be saved.
    pub fn ensure_cli_id(&mut self) -> (String, bool) {
        match self.cli_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => (id.to_string(), false),
            _ => {
                let id = Uuid::new_v4().to_string();
                self.cli_id = Some(id.clone());
                (id, true)
            },
        }
    }

    /// Whether the user opted into CEIP.
    #[must_use]
    pub fn ceip_opted_in(&self) -> bool {
        self.ceip_opt_in == Some(true)
    }

    /// The active context of `context_type`, if one is set and still exists.
    #[must_use]
    pub fn active_context(&self, context_type: ContextType) -> Option<&Context> {
        let name = self.current_context.get(context_type.as_str())?;
        self.contexts
            .iter()
            .find(|ctx| ctx.context_type == context_type && &ctx.name == name)
    }

    /// Add or replace a context and make it the active one of its type.
    pub fn set_current_context(&mut self, context: Context) {
        self.current_context
            .insert(context.context_type.as_str().to_string(), context.name.clone());
        self.contexts
            .retain(|ctx| !(ctx.context_type == context.context_type && ctx.name == context.name));
        self.contexts.push(context);
    }
}
