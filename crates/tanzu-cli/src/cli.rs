//! # CLI Structure and Argument Parsing
//!
//! Built-in commands are declared here with clap's derive macros. Anything
//! clap does not recognize is captured as an external subcommand and routed
//! to an installed plugin:
//!
//! ```bash
//! # Built-in commands
//! tanzu plugin list
//! tanzu plugin tree cluster --target kubernetes
//! tanzu telemetry status
//!
//! # Plugin commands, nested under their target or at the root
//! tanzu kubernetes cluster get my-cluster
//! tanzu k8s cluster np ls
//! tanzu builder init
//! ```

use clap::{Parser, Subcommand};

/// Main CLI structure for the `tanzu` command.
#[derive(Parser, Clone, Debug)]
#[command(name = "tanzu")]
#[command(version)]
#[command(about = "tanzu - plugin-based command line for the Tanzu platform", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress warnings (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Top-level commands.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Inspect installed plugins and their command trees
    Plugin {
        #[command(subcommand)]
        command: PluginCommands,
    },

    /// Inspect and manage locally recorded usage metrics
    Telemetry {
        #[command(subcommand)]
        command: TelemetryCommands,
    },

    /// Run an installed plugin: `[<target>] <plugin> [args]...`
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// `tanzu plugin ...`
#[derive(Subcommand, Clone, Debug)]
pub enum PluginCommands {
    /// List installed plugins
    #[command(alias = "ls")]
    List,

    /// Remove every cached plugin command tree
    CleanTreeCache,

    /// Print a plugin's command tree, building it if needed
    Tree {
        /// Plugin name
        name: String,

        /// Only consider plugins installed for this target
        #[arg(long, short = 't')]
        target: Option<String>,
    },
}

/// `tanzu telemetry ...`
#[derive(Subcommand, Clone, Debug)]
pub enum TelemetryCommands {
    /// Show CEIP participation, CLI id and the number of stored metrics
    Status,

    /// Delete all stored metrics
    Clear,

    /// Hand stored metrics to the collector plugin
    Send,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn unknown_commands_become_external() {
        let cli = Cli::try_parse_from(["tanzu", "kubernetes", "cluster", "get", "--all"]).unwrap();
        match cli.command {
            Commands::External(args) => assert_eq!(args, ["kubernetes", "cluster", "get", "--all"]),
            other => unreachable!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn plugin_tree_accepts_target() {
        let cli =
            Cli::try_parse_from(["tanzu", "plugin", "tree", "cluster", "--target", "k8s"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Plugin {
                command: PluginCommands::Tree { ref name, target: Some(ref target) }
            } if name == "cluster" && target == "k8s"
        ));
    }
}
