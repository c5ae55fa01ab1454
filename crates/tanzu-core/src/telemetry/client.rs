use super::endpoint::endpoint_hash;
use super::flags::{flag_names, flag_names_json};
use super::payload::OperationMetricsPayload;
use super::sha256_hex;
use crate::cli_tree::{ANNOTATION_PLUGIN_INSTALLATION_PATH, CliCommand};
use crate::command_tree::{CommandTreeCache, parse_plugin_command_path};
use crate::config::CliConfig;
use crate::invoker::PluginInvoker;
use crate::metrics::MetricsDb;
use crate::plugin::{PluginCatalog, PluginInfo};
use crate::{Error, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Plugin that collects and transmits stored metrics.
pub const TELEMETRY_PLUGIN_NAME: &str = "cli-usage-analytics";
/// Minimum stored rows before metrics are handed to the collector plugin.
pub const SEND_THRESHOLD: usize = 10;
/// Optional collector timeout in seconds.
pub const SEND_TIMEOUT_ENV: &str = "TANZU_CLI_TELEMETRY_SEND_TIMEOUT";
/// Enables logging of command-path resolution failures.
pub const TELEMETRY_DEBUG_ENV: &str = "TANZU_CLI_TELEMETRY_DEBUG";

/// Command paths whose flag values are stored in clear text.
const CLEAR_TEXT_FLAG_COMMANDS: &[&str] = &["plugin"];

/// A flag the user set explicitly on a core command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetFlag {
    /// Long flag name without dashes.
    pub name: String,
    /// Value as typed, or `true` for switches.
    pub value: String,
    /// Whether the flag is a boolean switch.
    pub is_bool: bool,
}

/// What the CLI parsed for the command being run.
#[derive(Debug, Clone)]
pub struct CommandInvocation<'a> {
    /// The matched command in the live CLI tree.
    pub command: &'a CliCommand,
    /// Canonical command path, root command first.
    pub path: Vec<String>,
    /// Positional arguments (core commands) or the raw residual arguments
    /// handed to the plugin (plugin commands).
    pub args: Vec<String>,
    /// Explicitly set flags (core commands).
    pub flags: Vec<SetFlag>,
}

impl CommandInvocation<'_> {
    /// Command path without the root command.
    fn command_name(&self) -> String {
        self.path.get(1..).unwrap_or_default().join(" ")
    }
}

/// Collaborators a [`TelemetryClient`] is built from.
pub struct TelemetryClientOptions {
    /// Where `config` is persisted when the CLI id or source changes.
    pub config_path: PathBuf,
    /// Loaded CLI configuration.
    pub config: CliConfig,
    /// Installed plugins.
    pub catalog: PluginCatalog,
    /// Plugin command-tree cache.
    pub cache: CommandTreeCache,
    /// Local metrics database.
    pub metrics_db: MetricsDb,
    /// Runs plugins (tree building, metric collection).
    pub invoker: Arc<dyn PluginInvoker>,
    /// Version of the running CLI.
    pub cli_version: String,
}

impl std::fmt::Debug for TelemetryClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryClientOptions")
            .field("config_path", &self.config_path)
            .field("cache", &self.cache)
            .field("metrics_db", &self.metrics_db)
            .field("cli_version", &self.cli_version)
            .finish_non_exhaustive()
    }
}

/// Per-invocation telemetry recorder.
///
/// Constructed once per process and passed through the run pipeline:
/// [`update_cmd_pre_run_metrics`](Self::update_cmd_pre_run_metrics) before
/// the command executes, [`update_cmd_post_run_metrics`](Self::update_cmd_post_run_metrics)
/// after, then [`save_metrics`](Self::save_metrics) and
/// [`send_metrics`](Self::send_metrics).
pub struct TelemetryClient {
    config_path: PathBuf,
    config: CliConfig,
    catalog: PluginCatalog,
    cache: CommandTreeCache,
    metrics_db: MetricsDb,
    invoker: Arc<dyn PluginInvoker>,
    cli_version: String,
    payload: Option<OperationMetricsPayload>,
}

impl std::fmt::Debug for TelemetryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryClient")
            .field("config_path", &self.config_path)
            .field("metrics_db", &self.metrics_db)
            .field("cli_version", &self.cli_version)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

impl TelemetryClient {
    /// Build a client from its collaborators.
    #[must_use]
    pub fn new(options: TelemetryClientOptions) -> Self {
        Self {
            config_path: options.config_path,
            config: options.config,
            catalog: options.catalog,
            cache: options.cache,
            metrics_db: options.metrics_db,
            invoker: options.invoker,
            cli_version: options.cli_version,
            payload: None,
        }
    }

    /// Current CLI configuration.
    #[must_use]
    pub const fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Installed plugins.
    #[must_use]
    pub const fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    /// Plugin command-tree cache.
    pub const fn cache_mut(&mut self) -> &mut CommandTreeCache {
        &mut self.cache
    }

    /// Local metrics database.
    #[must_use]
    pub const fn metrics_db(&self) -> &MetricsDb {
        &self.metrics_db
    }

    /// Payload captured for this invocation, if any.
    #[must_use]
    pub const fn payload(&self) -> Option<&OperationMetricsPayload> {
        self.payload.as_ref()
    }

    /// Capture everything known before the command runs.
    pub async fn update_cmd_pre_run_metrics(
        &mut self,
        root_cli: &CliCommand,
        invocation: &CommandInvocation<'_>,
    ) -> Result<()> {
        self.ensure_telemetry_source()?;
        let cli_id = self.ensure_cli_id()?;

        let mut payload = OperationMetricsPayload {
            cli_id,
            cli_version: self.cli_version.clone(),
            start_time: Some(Utc::now()),
            ..OperationMetricsPayload::default()
        };

        if invocation.command.is_plugin_command() {
            self.fill_plugin_command(&mut payload, root_cli, invocation).await?;
        } else {
            fill_core_command(&mut payload, invocation)?;
        }

        self.payload = Some(payload);
        Ok(())
    }

    /// Record the command's outcome.
    pub fn update_cmd_post_run_metrics(
        &mut self,
        exit_status: i32,
        error: Option<&str>,
    ) -> Result<()> {
        let payload = self
            .payload
            .as_mut()
            .ok_or_else(|| Error::Other("metrics payload is not available".to_string()))?;
        payload.exit_status = exit_status;
        payload.end_time = Some(Utc::now());
        payload.error = error.unwrap_or_default().to_string();
        Ok(())
    }

    /// Store the captured payload. Does nothing if pre-run never populated it.
    pub fn save_metrics(&mut self) -> Result<()> {
        let Some(payload) = self.payload.take() else {
            return Ok(());
        };
        if !payload.is_populated() {
            debug!("metrics payload was never populated, skipping save");
            return Ok(());
        }
        self.metrics_db.create_schema()?;
        self.metrics_db.save_operation_metric(&payload)
    }

    /// Hand stored metrics to the collector plugin once enough have piled up.
    ///
    /// Requires the user to have opted into CEIP.
    pub async fn send_metrics(&self) -> Result<()> {
        if !self.config.ceip_opted_in() {
            debug!("CEIP opt-in not set, not sending metrics");
            return Ok(());
        }
        let rows = self.metrics_db.get_row_count()?;
        if rows < SEND_THRESHOLD {
            debug!(rows, threshold = SEND_THRESHOLD, "not enough metrics to send");
            return Ok(());
        }
        let Some(plugin) = self.catalog.find_by_name(TELEMETRY_PLUGIN_NAME, None) else {
            info!(
                plugin = TELEMETRY_PLUGIN_NAME,
                "telemetry plugin is not installed, skipping send"
            );
            return Ok(());
        };

        let mut args = vec!["collect".to_string(), "-q".to_string()];
        if let Some(timeout) = send_timeout_secs() {
            args.push("--timeout".to_string());
            args.push(timeout.to_string());
        }
        self.invoker.invoke(plugin, &args).await?;
        Ok(())
    }

    /// Point the configured telemetry source at the local database.
    fn ensure_telemetry_source(&mut self) -> Result<()> {
        let source = self.metrics_db.db_path().to_string_lossy().into_owned();
        if self.config.telemetry.source != source {
            self.config.telemetry.source = source;
            self.config.save(&self.config_path)?;
        }
        Ok(())
    }

    fn ensure_cli_id(&mut self) -> Result<String> {
        let (cli_id, generated) = self.config.ensure_cli_id();
        if generated {
            self.config.save(&self.config_path)?;
        }
        Ok(cli_id)
    }

    async fn fill_plugin_command(
        &mut self,
        payload: &mut OperationMetricsPayload,
        root_cli: &CliCommand,
        invocation: &CommandInvocation<'_>,
    ) -> Result<()> {
        payload.is_internal = self.config.telemetry.is_internal;
        payload.flags = flag_names_json(&flag_names(&invocation.args))?;

        let prefix = invocation.command_name();
        payload.command_name.clone_from(&prefix);

        let plugin = invocation
            .command
            .annotation(ANNOTATION_PLUGIN_INSTALLATION_PATH)
            .and_then(|path| self.catalog.find_by_installation_path(path))
            .cloned();
        let Some(plugin) = plugin else {
            debug!(command = %prefix, "no installed plugin matches the command");
            return Ok(());
        };

        payload.plugin_name.clone_from(&plugin.name);
        payload.plugin_version.clone_from(&plugin.version);
        payload.target = plugin.target.to_string();
        payload.endpoint = endpoint_hash(&self.config, &plugin.target);

        match self.resolve_subcommand(root_cli, &plugin, invocation).await {
            Ok(suffix) => payload.command_name.push_str(&suffix),
            Err(err) => {
                if telemetry_debug_enabled() {
                    warn!(plugin = %plugin.name, %err, "failed to resolve plugin command path");
                }
            },
        }
        Ok(())
    }

    async fn resolve_subcommand(
        &mut self,
        root_cli: &CliCommand,
        plugin: &PluginInfo,
        invocation: &CommandInvocation<'_>,
    ) -> Result<String> {
        let tree = self.cache.get_tree(root_cli, plugin).await?;
        let cli_path = invocation.path.get(1..).unwrap_or_default();
        let node = tree.descend(cli_path).ok_or_else(|| {
            Error::NotFound(format!(
                "command '{}' in the command tree of plugin '{}'",
                cli_path.join(" "),
                plugin.name
            ))
        })?;
        Ok(parse_plugin_command_path(node, &invocation.args))
    }
}

fn fill_core_command(
    payload: &mut OperationMetricsPayload,
    invocation: &CommandInvocation<'_>,
) -> Result<()> {
    payload.command_name = invocation.command_name();
    if let Some(first) = invocation.args.first() {
        payload.name_arg = sha256_hex(first);
    }

    let clear_text = stores_clear_text_flags(&payload.command_name);
    let flags: BTreeMap<&str, String> = invocation
        .flags
        .iter()
        .map(|flag| {
            let value = if clear_text || flag.is_bool || flag.value.is_empty() {
                flag.value.clone()
            } else {
                sha256_hex(&flag.value)
            };
            (flag.name.as_str(), value)
        })
        .collect();
    payload.flags = serde_json::to_string(&flags)?;
    Ok(())
}

fn stores_clear_text_flags(command_name: &str) -> bool {
    CLEAR_TEXT_FLAG_COMMANDS.iter().any(|allowed| {
        command_name == *allowed
            || command_name
                .strip_prefix(allowed)
                .is_some_and(|rest| rest.starts_with(' '))
    })
}

fn telemetry_debug_enabled() -> bool {
    std::env::var(TELEMETRY_DEBUG_ENV).is_ok_and(|value| {
        matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
    })
}

fn send_timeout_secs() -> Option<u64> {
    std::env::var(SEND_TIMEOUT_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
}
