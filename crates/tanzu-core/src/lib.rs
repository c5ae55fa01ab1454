//! # tanzu-core
//!
//! Core functionality for the `tanzu` CLI: plugin command trees, usage
//! telemetry and the local metrics store.
//!
//! Plugins are separate executables, so the CLI's own argument parser stops
//! at the plugin boundary. This crate recovers what lies beyond it and
//! records anonymized usage about which commands were run.
//!
//! ## Architecture
//!
//! - **Plugin model**: installed plugins, their targets and remapping tables
//!   ([`PluginInfo`], [`PluginCatalog`]), and a seam for running them
//!   ([`PluginInvoker`])
//! - **Command trees**: discovery, caching and best-effort resolution of a
//!   plugin's subcommands ([`command_tree`])
//! - **Telemetry**: two-phase capture of one usage record per invocation
//!   ([`TelemetryClient`])
//! - **Metrics store**: row-capped SQLite event log guarded by a
//!   cross-process lock ([`MetricsDb`], [`MetricsDbLock`])
//!
//! ## Quick Start
//!
//! ```rust
//! use tanzu_core::{CommandNode, parse_plugin_command_path};
//!
//! let mut cluster = CommandNode::new();
//! let mut get = CommandNode::new();
//! get.aliases.insert("g".to_string());
//! cluster.subcommands.insert("get".to_string(), get);
//!
//! let path = parse_plugin_command_path(&cluster, &["--verbose", "g", "prod"]);
//! assert_eq!(path, " g");
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`]. Telemetry failures are meant
//! to be logged by the caller, never to fail the user's command:
//!
//! ```rust
//! use tanzu_core::Error;
//!
//! let err = Error::ThresholdReached { limit: 10_000 };
//! assert_eq!(err.category(), "threshold");
//! assert!(!err.is_recoverable());
//! ```

/// Live CLI command tree with plugin annotations
pub mod cli_tree;
/// Plugin command-tree discovery, cache and resolver
pub mod command_tree;
/// CLI configuration file
pub mod config;
/// Error types and result aliases
pub mod error;
/// Running plugin executables
pub mod invoker;
/// Local metrics database and its lock
pub mod metrics;
/// Well-known directories with environment overrides
pub mod paths;
/// Installed plugin records and catalog
pub mod plugin;
/// Usage telemetry client
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use cli_tree::CliCommand;
pub use command_tree::{
    CommandNode, CommandTreeCache, PluginCommandTree, build_plugin_tree, parse_plugin_command_path,
    target_aliases,
};
pub use config::{CliConfig, Context, ContextType, TelemetryOptions};
pub use error::{Error, Result};
pub use invoker::{PluginInvoker, PluginOutput, ProcessInvoker};
pub use metrics::{MetricsDb, MetricsDbGuard, MetricsDbLock};
pub use plugin::{CommandMapEntry, PluginCatalog, PluginInfo, Target};
pub use telemetry::{
    CommandInvocation, OperationMetricsPayload, SetFlag, TelemetryClient, TelemetryClientOptions,
};
