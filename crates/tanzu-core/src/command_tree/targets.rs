//! Target alias table and remap-aware help invocation arguments.

use crate::cli_tree::{ANNOTATION_REMAPPED_SOURCE_PATH, CliCommand};
use crate::plugin::{PluginInfo, Target};
use std::collections::BTreeSet;
use tracing::warn;

/// Fixed alias set for a target group segment.
///
/// Returns `None` (after logging a warning) for targets without an entry;
/// an unknown target is not an error.
pub fn target_aliases(target: &Target) -> Option<BTreeSet<String>> {
    let aliases: &[&str] = match target {
        Target::Kubernetes => &["k8s", "kubernetes"],
        Target::MissionControl => &["tmc", "mission-control"],
        Target::Operations => &["ops", "operations"],
        Target::Global | Target::Other(_) => {
            warn!(target = %target, "no aliases are defined for target");
            return None;
        },
    };
    Some(aliases.iter().map(ToString::to_string).collect())
}

/// Arguments that make the plugin print help for the command at `path`.
///
/// `path` is the full CLI path including the root command. The root segment,
/// the target group segment and the plugin's own name are stripped. If the
/// live CLI tree shows the path passing through a remapped command, the
/// remapped destination prefix is replaced by the plugin-internal source path.
pub(crate) fn help_args(
    plugin: &PluginInfo,
    root_cli: &CliCommand,
    path: &[String],
) -> Vec<String> {
    let cli_path = path.get(1..).unwrap_or_default();

    let remap = root_cli
        .trail(cli_path)
        .iter()
        .enumerate()
        .rev()
        .find_map(|(idx, cmd)| {
            cmd.annotation(ANNOTATION_REMAPPED_SOURCE_PATH)
                .map(|source| (idx + 1, source.to_string()))
        });

    let mut args: Vec<String> = if let Some((consumed, source)) = remap {
        source
            .split_whitespace()
            .map(ToString::to_string)
            .chain(cli_path[consumed..].iter().cloned())
            .collect()
    } else {
        let mut rest = cli_path;
        if !plugin.target.is_global()
            && rest.first().map(String::as_str) == Some(plugin.target.as_str())
        {
            rest = &rest[1..];
        }
        if rest.first() == Some(&plugin.name) {
            rest = &rest[1..];
        }
        rest.to_vec()
    };

    args.push("-h".to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli_tree::{ANNOTATION_TYPE, COMMAND_TYPE_PLUGIN};
    use crate::plugin::CommandMapEntry;

    fn plugin(name: &str, target: Target) -> PluginInfo {
        PluginInfo {
            name: name.to_string(),
            version: "v1.0.0".to_string(),
            target,
            installation_path: format!("/plugins/{name}").into(),
            command_map: Vec::new(),
        }
    }

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn fixed_target_aliases() {
        let expected: BTreeSet<String> =
            ["k8s", "kubernetes"].iter().map(ToString::to_string).collect();
        assert_eq!(target_aliases(&Target::Kubernetes), Some(expected));
        assert!(target_aliases(&Target::MissionControl).is_some_and(|a| a.contains("tmc")));
        assert!(target_aliases(&Target::Operations).is_some_and(|a| a.contains("ops")));
        assert_eq!(target_aliases(&Target::Other("edge".into())), None);
        assert_eq!(target_aliases(&Target::Global), None);
    }

    #[test]
    fn help_args_strip_root_target_and_plugin() {
        let cluster = plugin("cluster", Target::Kubernetes);
        let root = CliCommand::new("tanzu");

        assert_eq!(
            help_args(&cluster, &root, &path(&["tanzu", "kubernetes", "cluster", "get"])),
            path(&["get", "-h"])
        );
        assert_eq!(
            help_args(&cluster, &root, &path(&["tanzu", "cluster", "get"])),
            path(&["get", "-h"])
        );
        assert_eq!(
            help_args(&cluster, &root, &path(&["tanzu", "cluster"])),
            path(&["-h"])
        );
    }

    #[test]
    fn help_args_global_plugin_keeps_segments() {
        let builder = plugin("builder", Target::Global);
        let root = CliCommand::new("tanzu");
        assert_eq!(
            help_args(&builder, &root, &path(&["tanzu", "builder", "init", "plugin"])),
            path(&["init", "plugin", "-h"])
        );
    }

    #[test]
    fn help_args_follow_remapped_source_path() {
        let mut apply = plugin("apply-plugin", Target::Operations);
        apply.command_map.push(CommandMapEntry {
            source_command_path: "workload apply".to_string(),
            destination_command_path: "apply".to_string(),
            description: None,
        });

        let mut root = CliCommand::new("tanzu");
        root.subcommands.push(
            CliCommand::new("apply")
                .with_annotation(ANNOTATION_TYPE, COMMAND_TYPE_PLUGIN)
                .with_annotation(ANNOTATION_REMAPPED_SOURCE_PATH, "workload apply"),
        );

        assert_eq!(
            help_args(&apply, &root, &path(&["tanzu", "apply", "file"])),
            path(&["workload", "apply", "file", "-h"])
        );
        assert_eq!(
            help_args(&apply, &root, &path(&["tanzu", "apply"])),
            path(&["workload", "apply", "-h"])
        );
    }

    #[test]
    fn help_args_remap_to_plugin_root() {
        let mut ops = plugin("ops-suite", Target::Operations);
        ops.command_map.push(CommandMapEntry {
            source_command_path: String::new(),
            destination_command_path: "ops-suite".to_string(),
            description: None,
        });
        let mut root = CliCommand::new("tanzu");
        root.subcommands
            .push(CliCommand::new("ops-suite").with_annotation(ANNOTATION_REMAPPED_SOURCE_PATH, ""));

        assert_eq!(
            help_args(&ops, &root, &path(&["tanzu", "ops-suite", "run"])),
            path(&["run", "-h"])
        );
    }
}
