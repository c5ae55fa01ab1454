//! Plugin command trees.
//!
//! A plugin is an opaque executable, so the CLI cannot see past the point
//! where it hands over the arguments. This module recovers the plugin's
//! command hierarchy by asking it to generate docs and `-h` text
//! ([`build_plugin_tree`]), keeps one tree per installation in a YAML cache
//! ([`CommandTreeCache`]), and walks a cached tree to label the subcommand a
//! user actually ran ([`parse_plugin_command_path`]).

mod builder;
mod cache;
mod node;
mod resolver;
mod targets;

pub use builder::build_plugin_tree;
pub use cache::{CommandTreeCache, DOCS_DIRNAME, PluginCommandTree, TREE_FILENAME};
pub use node::CommandNode;
pub use resolver::parse_plugin_command_path;
pub use targets::target_aliases;
