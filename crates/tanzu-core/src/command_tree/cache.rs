//! Persistent per-plugin command-tree cache.
//!
//! One YAML file maps plugin installation paths to their command trees. The
//! file is loaded once when the cache is created and rewritten in full after
//! every change. Writers serialize on a sidecar lock file and replace the
//! data file atomically, so concurrent CLI invocations observe either the
//! old or the new contents; the last writer wins, which is acceptable because
//! every entry can be rebuilt from the plugin.

use super::builder::build_plugin_tree;
use super::node::CommandNode;
use crate::cli_tree::CliCommand;
use crate::invoker::PluginInvoker;
use crate::plugin::PluginInfo;
use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the persisted tree file inside the cache directory.
pub const TREE_FILENAME: &str = "plugin_command_tree.yaml";
/// Scratch directory plugins write generated docs into.
pub const DOCS_DIRNAME: &str = "plugin_docs";

/// On-disk aggregate: installation path -> plugin command tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCommandTree {
    /// Trees keyed by plugin installation path.
    #[serde(rename = "commandTree", default)]
    pub command_tree: BTreeMap<String, CommandNode>,
}

/// File-backed cache of plugin command trees.
pub struct CommandTreeCache {
    cache_dir: PathBuf,
    invoker: Arc<dyn PluginInvoker>,
    tree: PluginCommandTree,
}

impl std::fmt::Debug for CommandTreeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTreeCache")
            .field("cache_dir", &self.cache_dir)
            .field("plugins", &self.tree.command_tree.len())
            .finish_non_exhaustive()
    }
}

impl CommandTreeCache {
    /// Open the cache rooted at `cache_dir`.
    ///
    /// A missing tree file yields an empty cache; a file that exists but
    /// cannot be parsed is an error.
    pub fn new(cache_dir: impl Into<PathBuf>, invoker: Arc<dyn PluginInvoker>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        let tree = load_tree(&cache_dir.join(TREE_FILENAME))?;
        Ok(Self {
            cache_dir,
            invoker,
            tree,
        })
    }

    /// Directory holding the tree file and the docs scratch directory.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the persisted tree file.
    #[must_use]
    pub fn tree_file(&self) -> PathBuf {
        self.cache_dir.join(TREE_FILENAME)
    }

    /// Installation paths that currently have a cached tree.
    pub fn installation_paths(&self) -> impl Iterator<Item = &str> {
        self.tree.command_tree.keys().map(String::as_str)
    }

    /// Cached tree for `plugin`, without building it.
    #[must_use]
    pub fn tree(&self, plugin: &PluginInfo) -> Option<&CommandNode> {
        self.tree.command_tree.get(&plugin.cache_key())
    }

    /// Tree for `plugin`, building and persisting it on a cache miss.
    pub async fn get_tree(
        &mut self,
        root_cli: &CliCommand,
        plugin: &PluginInfo,
    ) -> Result<&CommandNode> {
        self.ensure_tree(root_cli, plugin).await?;
        self.tree
            .command_tree
            .get(&plugin.cache_key())
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "command tree for plugin '{}' at {}",
                    plugin.name,
                    plugin.installation_path.display()
                ))
            })
    }

    async fn ensure_tree(&mut self, root_cli: &CliCommand, plugin: &PluginInfo) -> Result<()> {
        let key = plugin.cache_key();
        if self.tree.command_tree.contains_key(&key) {
            return Ok(());
        }

        info!(plugin = %plugin.name, "building command tree for plugin");
        let docs_dir = self.cache_dir.join(DOCS_DIRNAME);
        let built =
            build_plugin_tree(Arc::clone(&self.invoker), root_cli, plugin, &docs_dir).await?;

        match built {
            Some(node) => {
                self.tree.command_tree.insert(key, node);
                self.save()
            },
            None => {
                debug!(plugin = %plugin.name, "plugin docs did not mention the root command");
                Ok(())
            },
        }
    }

    /// Drop the cached tree for `plugin`. Absent entries are not an error.
    pub fn delete_plugin_tree(&mut self, plugin: &PluginInfo) -> Result<()> {
        if self.tree.command_tree.remove(&plugin.cache_key()).is_none() {
            return Ok(());
        }
        self.save()
    }

    /// Drop every cached tree and remove the backing file.
    pub fn delete_tree(&mut self) -> Result<()> {
        let path = self.tree_file();
        let _lock = self.lock()?;
        self.tree.command_tree.clear();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn lock(&self) -> Result<fs::File> {
        fs::create_dir_all(&self.cache_dir)?;
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.tree_file().with_extension("lock"))?;
        lock.lock_exclusive()?;
        Ok(lock)
    }

    fn save(&self) -> Result<()> {
        let path = self.tree_file();
        let data = serde_yaml::to_string(&self.tree)?;

        let _lock = self.lock()?;
        let tmp_path = path.with_extension("yaml.tmp");
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut tmp = options.open(&tmp_path)?;
        tmp.write_all(data.as_bytes())?;
        tmp.sync_all()?;
        drop(tmp);

        if let Err(err) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::Io(err));
        }
        // `_lock` is released when dropped here.
        Ok(())
    }
}

fn load_tree(path: &Path) -> Result<PluginCommandTree> {
    match fs::read_to_string(path) {
        Ok(content) => serde_yaml::from_str(&content).map_err(|e| {
            Error::Serialization(format!(
                "failed to parse command tree cache {}: {e}",
                path.display()
            ))
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(PluginCommandTree::default()),
        Err(err) => Err(Error::Io(err)),
    }
}
