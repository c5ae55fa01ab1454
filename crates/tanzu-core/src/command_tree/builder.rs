//! Reverse-engineering a plugin's command hierarchy.
//!
//! The plugin is asked to generate its documentation; every generated file
//! name encodes one command path (`tanzu_cluster_get.md`). Walking those
//! paths yields the tree structure, and one `-h` call per distinct node
//! yields the declared aliases.

use super::node::{BuildNode, CommandNode};
use super::targets::{help_args, target_aliases};
use crate::cli_tree::CliCommand;
use crate::invoker::PluginInvoker;
use crate::plugin::{PluginInfo, Target};
use crate::{Error, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument};

/// Upper bound on concurrently running help lookups for one plugin.
const MAX_CONCURRENT_HELP_LOOKUPS: usize = 16;

/// A pending help lookup: the node's full path and the plugin arguments.
struct AliasJob {
    path: Vec<String>,
    args: Vec<String>,
}

/// Build the command tree for `plugin`.
///
/// `docs_dir` is wiped and recreated before the plugin writes its docs into
/// it. Returns the subtree under the CLI root command, or `None` when the
/// generated docs never mention the root command.
#[instrument(level = "debug", skip_all, fields(plugin = %plugin.name))]
pub async fn build_plugin_tree(
    invoker: Arc<dyn PluginInvoker>,
    root_cli: &CliCommand,
    plugin: &PluginInfo,
    docs_dir: &Path,
) -> Result<Option<CommandNode>> {
    let build_error = |reason: String| Error::TreeBuild {
        plugin: plugin.name.clone(),
        reason,
    };

    reset_dir(docs_dir).await?;
    let docs_arg = docs_dir.to_string_lossy().into_owned();
    invoker
        .invoke(
            plugin,
            &["generate-docs".to_string(), "--docs-dir".to_string(), docs_arg],
        )
        .await
        .map_err(|e| build_error(format!("generate-docs failed: {e}")))?;

    let doc_paths = read_doc_paths(docs_dir).await?;
    debug!(files = doc_paths.len(), "discovered documented command paths");

    let mut root = BuildNode::default();
    let mut jobs = Vec::new();
    for segments in &doc_paths {
        for path in expand_target_paths(plugin, segments) {
            walk_path(&mut root, root_cli, plugin, &path, &mut jobs);
        }
    }

    let results = run_alias_jobs(&invoker, plugin, jobs)
        .await
        .map_err(|e| build_error(format!("alias lookup failed: {e}")))?;

    // An alias never shadows the node's own name or a literal sibling.
    for (path, aliases) in results {
        let Some((own_name, parent_path)) = path.split_last() else {
            continue;
        };
        let Some(parent) = root.descend_mut(parent_path) else {
            continue;
        };
        let aliases: BTreeSet<String> = aliases
            .into_iter()
            .filter(|alias| !parent.subcommands.contains_key(alias))
            .collect();
        if let Some(node) = parent.subcommands.get_mut(own_name) {
            node.aliases = aliases;
        }
    }

    Ok(root
        .subcommands
        .remove(&root_cli.name)
        .map(BuildNode::into_command_node))
}

async fn reset_dir(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {},
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
        Err(err) => return Err(Error::Io(err)),
    }
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

/// Command paths encoded in the `.md` file names under `docs_dir`, sorted.
async fn read_doc_paths(docs_dir: &Path) -> Result<Vec<Vec<String>>> {
    let mut entries = tokio::fs::read_dir(docs_dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            let segments = split_doc_name(stem);
            if !segments.is_empty() {
                paths.push(segments);
            }
        }
    }
    paths.sort();
    Ok(paths)
}

/// `tanzu_cluster_get` -> `["tanzu", "cluster", "get"]`.
fn split_doc_name(stem: &str) -> Vec<String> {
    stem.split('_')
        .filter(|segment| !segment.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// The path variants a documented path is inserted under.
///
/// Kubernetes commands are reachable both under the target group and at the
/// root; all other targets only under their group. Global plugins and
/// remapped commands never get the target segment.
fn expand_target_paths(plugin: &PluginInfo, segments: &[String]) -> Vec<Vec<String>> {
    let after_root: Vec<&str> = segments.iter().skip(1).map(String::as_str).collect();
    let with_target = if plugin.target.is_global() || plugin.is_remapped_path(&after_root) {
        segments.to_vec()
    } else {
        let mut path = Vec::with_capacity(segments.len() + 1);
        path.extend(segments.first().cloned());
        path.push(plugin.target.as_str().to_string());
        path.extend(segments.iter().skip(1).cloned());
        path
    };

    if plugin.target == Target::Kubernetes && with_target != segments {
        vec![with_target, segments.to_vec()]
    } else {
        vec![with_target]
    }
}

fn walk_path(
    root: &mut BuildNode,
    root_cli: &CliCommand,
    plugin: &PluginInfo,
    path: &[String],
    jobs: &mut Vec<AliasJob>,
) {
    let mut node = root;
    for (idx, segment) in path.iter().enumerate() {
        node = node.child_or_insert(segment);
        if idx == 0 || node.alias_processed {
            continue;
        }
        node.alias_processed = true;

        if idx == 1 && !plugin.target.is_global() && segment == plugin.target.as_str() {
            node.aliases = target_aliases(&plugin.target).unwrap_or_default();
            continue;
        }

        let prefix = path[..=idx].to_vec();
        let args = help_args(plugin, root_cli, &prefix);
        jobs.push(AliasJob { path: prefix, args });
    }
}

/// Run every help lookup concurrently and collect `(path, aliases)` pairs.
///
/// All tasks are drained even after a failure; the first failure is returned.
async fn run_alias_jobs(
    invoker: &Arc<dyn PluginInvoker>,
    plugin: &PluginInfo,
    jobs: Vec<AliasJob>,
) -> Result<Vec<(Vec<String>, BTreeSet<String>)>> {
    let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_HELP_LOOKUPS));
    let mut set = JoinSet::new();
    for job in jobs {
        let invoker = Arc::clone(invoker);
        let plugin = plugin.clone();
        let permits = Arc::clone(&permits);
        set.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| Error::Other(format!("help lookup scheduler closed: {e}")))?;
            let output = invoker.invoke(&plugin, &job.args).await?;
            Ok::<_, Error>((job.path, parse_aliases(&output.stdout)))
        });
    }

    let mut results = Vec::new();
    let mut first_error = None;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(result)) => results.push(result),
            Ok(Err(err)) => {
                first_error.get_or_insert(err);
            },
            Err(join_err) => {
                first_error.get_or_insert(Error::Other(format!(
                    "help lookup task failed: {join_err}"
                )));
            },
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(results),
    }
}

/// Aliases declared on the `Aliases:` line of a command's help text.
pub(crate) fn parse_aliases(help: &str) -> BTreeSet<String> {
    static ALIASES_RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    let re = ALIASES_RE
        .get_or_init(|| Regex::new(r"Aliases:\s*(.*)").expect("aliases regex is valid"));

    re.captures(help)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .split(',')
                .map(str::trim)
                .filter(|alias| !alias.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}
