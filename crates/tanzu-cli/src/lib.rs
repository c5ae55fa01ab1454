//! tanzu CLI - plugin-based command line with local usage telemetry
//!
//! Built-in commands live in [`cli`]; everything else is dispatched to an
//! installed plugin. Every invocation runs through the same pipeline:
//! telemetry pre-run, execution, post-run, save and send. Telemetry is best
//! effort: its failures are logged and never change the exit code. When the
//! telemetry client cannot be assembled the command runs without it.

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, FromArgMatches};
use std::sync::Arc;
use tanzu_core::paths;
use tanzu_core::plugin::CATALOG_FILENAME;
use tanzu_core::{
    CliCommand, CliConfig, CommandInvocation, CommandTreeCache, MetricsDb, PluginCatalog,
    PluginInvoker, ProcessInvoker, TelemetryClient, TelemetryClientOptions,
};
use tracing::{debug, warn};

mod cli;
mod commands;
mod utils;

use cli::{Cli, Commands, PluginCommands, TelemetryCommands};
use utils::{PluginCall, build_live_tree, initialize_logging, parse_command, resolve_plugin_call};

/// What the pipeline is about to run.
enum Execution<'a> {
    Builtin,
    Plugin(PluginCall<'a>),
}

/// Execute the tanzu CLI and return the process exit code.
///
/// # Errors
///
/// Returns an error if start-up fails or the selected command fails.
pub async fn run() -> Result<i32> {
    let mut definition = Cli::command();
    definition.build();
    let matches = definition.clone().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    initialize_logging(&cli)?;

    let catalog = PluginCatalog::load(&paths::config_dir()?.join(CATALOG_FILENAME))
        .context("Failed to load the plugin catalog")?;
    let invoker: Arc<dyn PluginInvoker> = Arc::new(ProcessInvoker::new());
    let mut telemetry = match telemetry_client(&catalog, Arc::clone(&invoker)) {
        Ok(client) => Some(client),
        Err(err) => {
            warn!(category = err.category(), "telemetry disabled for this command: {err}");
            None
        },
    };
    let root_cli = build_live_tree(&definition, &catalog);

    let (execution, invocation) = match &cli.command {
        Commands::External(args) => {
            let call = resolve_plugin_call(&root_cli, args)
                .ok_or_else(|| anyhow!("unknown command \"{}\" for \"tanzu\"", args.join(" ")))?;
            let invocation = CommandInvocation {
                command: call.command,
                path: call.path.clone(),
                args: call.residual.clone(),
                flags: Vec::new(),
            };
            (Execution::Plugin(call), invocation)
        },
        _ => {
            let parsed = parse_command(&definition, &matches);
            let command = root_cli
                .find(parsed.path.get(1..).unwrap_or_default())
                .unwrap_or(&root_cli);
            let invocation = CommandInvocation {
                command,
                path: parsed.path,
                args: parsed.args,
                flags: parsed.flags,
            };
            (Execution::Builtin, invocation)
        },
    };

    if let Some(client) = telemetry.as_mut() {
        if let Err(err) = client.update_cmd_pre_run_metrics(&root_cli, &invocation).await {
            warn!(category = err.category(), "failed to capture command metrics: {err}");
        }
    }

    let outcome = match execution {
        Execution::Plugin(call) => commands::plugin::dispatch(&catalog, &call).await,
        Execution::Builtin => {
            execute_builtin(&cli.command, &catalog, &invoker, telemetry.as_mut(), &root_cli)
                .await
                .map(|()| 0)
        },
    };

    if let Some(client) = telemetry.as_mut() {
        finish_telemetry(client, &outcome).await;
    }
    outcome
}

async fn execute_builtin(
    command: &Commands,
    catalog: &PluginCatalog,
    invoker: &Arc<dyn PluginInvoker>,
    telemetry: Option<&mut TelemetryClient>,
    root_cli: &CliCommand,
) -> Result<()> {
    match command {
        Commands::Plugin { command } => match command {
            PluginCommands::List => commands::plugin::list(catalog),
            PluginCommands::CleanTreeCache => match telemetry {
                Some(client) => commands::plugin::clean_tree_cache(client.cache_mut())?,
                None => {
                    let mut cache = open_tree_cache(Arc::clone(invoker))?;
                    commands::plugin::clean_tree_cache(&mut cache)?;
                },
            },
            PluginCommands::Tree { name, target } => {
                let target = target.as_deref();
                match telemetry {
                    Some(client) => {
                        commands::plugin::tree(client.cache_mut(), catalog, root_cli, name, target)
                            .await?;
                    },
                    None => {
                        let mut cache = open_tree_cache(Arc::clone(invoker))?;
                        commands::plugin::tree(&mut cache, catalog, root_cli, name, target).await?;
                    },
                }
            },
        },
        Commands::Telemetry { command } => match command {
            TelemetryCommands::Status => match telemetry {
                Some(client) => commands::telemetry::status(client.config(), client.metrics_db())?,
                None => {
                    let config = CliConfig::default_path()
                        .and_then(|path| CliConfig::load(&path))
                        .unwrap_or_default();
                    commands::telemetry::status(&config, &MetricsDb::from_default_dir()?)?;
                },
            },
            TelemetryCommands::Clear => {
                let metrics_db = match telemetry {
                    Some(client) => client.metrics_db().clone(),
                    None => MetricsDb::from_default_dir()?,
                };
                commands::telemetry::clear(&metrics_db)?;
            },
            TelemetryCommands::Send => {
                let client = telemetry
                    .ok_or_else(|| anyhow!("telemetry is not available, see the warnings above"))?;
                commands::telemetry::send(client).await?;
            },
        },
        Commands::External(_) => {},
    }
    Ok(())
}

async fn finish_telemetry(client: &mut TelemetryClient, outcome: &Result<i32>) {
    let (exit_status, error) = match outcome {
        Ok(code) => (*code, None),
        Err(err) => (1, Some(format!("{err:#}"))),
    };

    if let Err(err) = client.update_cmd_post_run_metrics(exit_status, error.as_deref()) {
        debug!("skipping metrics save: {err}");
        return;
    }
    if let Err(err) = client.save_metrics() {
        warn!(category = err.category(), "failed to save command metrics: {err}");
    }
    if let Err(err) = client.send_metrics().await {
        debug!(category = err.category(), "failed to send metrics: {err}");
    }
}

/// Assemble the telemetry client and its collaborators from disk.
///
/// An unreadable `config.toml` disables telemetry rather than being replaced,
/// since the client rewrites the config when it assigns a CLI id.
fn telemetry_client(
    catalog: &PluginCatalog,
    invoker: Arc<dyn PluginInvoker>,
) -> tanzu_core::Result<TelemetryClient> {
    let config_path = CliConfig::default_path()?;
    let config = CliConfig::load(&config_path)?;
    let cache = open_tree_cache(Arc::clone(&invoker))?;
    let metrics_db = MetricsDb::from_default_dir()?;

    Ok(TelemetryClient::new(TelemetryClientOptions {
        config_path,
        config,
        catalog: catalog.clone(),
        cache,
        metrics_db,
        invoker,
        cli_version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Open the command-tree cache, discarding a cache file that cannot be read.
fn open_tree_cache(invoker: Arc<dyn PluginInvoker>) -> tanzu_core::Result<CommandTreeCache> {
    let cache_dir = paths::command_tree_cache_dir()?;
    match CommandTreeCache::new(&cache_dir, Arc::clone(&invoker)) {
        Ok(cache) => Ok(cache),
        Err(err) => {
            warn!("discarding unreadable plugin command tree cache: {err}");
            let path = cache_dir.join(tanzu_core::command_tree::TREE_FILENAME);
            if let Err(remove_err) = std::fs::remove_file(&path) {
                debug!(path = %path.display(), "failed to remove tree cache: {remove_err}");
            }
            CommandTreeCache::new(cache_dir, invoker)
        },
    }
}
