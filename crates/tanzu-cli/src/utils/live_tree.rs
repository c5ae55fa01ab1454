//! The CLI's own command tree, as plugins and telemetry see it.
//!
//! Built-in commands come from the clap definition. Installed plugins are
//! grafted on from the catalog: under their target group, at the root for
//! kubernetes and global plugins, and at every remapped destination.

use tanzu_core::cli_tree::{
    ANNOTATION_PLUGIN_INSTALLATION_PATH, ANNOTATION_REMAPPED_SOURCE_PATH, ANNOTATION_TYPE,
    COMMAND_TYPE_PLUGIN,
};
use tanzu_core::{CliCommand, PluginCatalog, PluginInfo, Target, target_aliases};

/// Build the live tree from the clap definition and the installed plugins.
pub fn build_live_tree(definition: &clap::Command, catalog: &PluginCatalog) -> CliCommand {
    let mut root = from_clap(definition);
    for plugin in &catalog.plugins {
        graft_plugin(&mut root, plugin);
    }
    root
}

fn from_clap(command: &clap::Command) -> CliCommand {
    let mut node = CliCommand::new(command.get_name())
        .with_aliases(command.get_all_aliases().map(ToString::to_string));
    node.subcommands = command.get_subcommands().map(from_clap).collect();
    node
}

fn plugin_command(name: &str, plugin: &PluginInfo) -> CliCommand {
    CliCommand::new(name)
        .with_annotation(ANNOTATION_TYPE, COMMAND_TYPE_PLUGIN)
        .with_annotation(
            ANNOTATION_PLUGIN_INSTALLATION_PATH,
            plugin.installation_path.to_string_lossy(),
        )
}

fn graft_plugin(root: &mut CliCommand, plugin: &PluginInfo) {
    if !plugin.target.is_global() {
        let group = root.child_or_insert(plugin.target.as_str());
        if group.aliases.is_empty() {
            group.aliases = target_aliases(&plugin.target)
                .unwrap_or_default()
                .into_iter()
                .filter(|alias| alias != plugin.target.as_str())
                .collect();
        }
        insert_unique(group, plugin_command(&plugin.name, plugin));
    }
    if matches!(plugin.target, Target::Kubernetes | Target::Global) {
        insert_unique(root, plugin_command(&plugin.name, plugin));
    }

    for entry in &plugin.command_map {
        let segments = entry.destination_segments();
        let Some((last, parents)) = segments.split_last() else {
            continue;
        };
        let parent = parents
            .iter()
            .fold(&mut *root, |node, segment| node.child_or_insert(segment));
        let remapped = plugin_command(last, plugin)
            .with_annotation(ANNOTATION_REMAPPED_SOURCE_PATH, entry.source_command_path.trim());
        parent.subcommands.retain(|cmd| cmd.name != *last);
        parent.subcommands.push(remapped);
    }
}

/// Built-in commands win over plugins with the same name.
fn insert_unique(parent: &mut CliCommand, command: CliCommand) {
    if parent.child(&command.name).is_none() {
        parent.subcommands.push(command);
    }
}

/// A plugin command located in the live tree.
#[derive(Debug)]
pub struct PluginCall<'a> {
    /// The plugin command node.
    pub command: &'a CliCommand,
    /// Canonical path to the node, root first.
    pub path: Vec<String>,
    /// Arguments after the plugin command.
    pub residual: Vec<String>,
}

impl PluginCall<'_> {
    /// Arguments to hand to the plugin executable.
    pub fn plugin_args(&self) -> Vec<String> {
        self.command
            .annotation(ANNOTATION_REMAPPED_SOURCE_PATH)
            .map(|source| {
                source
                    .split_whitespace()
                    .map(ToString::to_string)
                    .chain(self.residual.iter().cloned())
                    .collect()
            })
            .unwrap_or_else(|| self.residual.clone())
    }
}

/// Find the deepest plugin command matched by the leading `args`.
pub fn resolve_plugin_call<'a>(root: &'a CliCommand, args: &[String]) -> Option<PluginCall<'a>> {
    let mut current = root;
    let mut path = vec![root.name.clone()];
    let mut found = None;

    for (idx, token) in args.iter().enumerate() {
        let Some(next) = current.child(token) else {
            break;
        };
        path.push(next.name.clone());
        current = next;
        if next.is_plugin_command() {
            found = Some((next, path.clone(), idx + 1));
        }
    }

    found.map(|(command, path, consumed)| PluginCall {
        command,
        path,
        residual: args[consumed..].to_vec(),
    })
}
