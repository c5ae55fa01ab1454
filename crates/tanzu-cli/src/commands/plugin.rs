//! `tanzu plugin` commands and plugin dispatch.

use anyhow::{Context, Result, anyhow};
use tanzu_core::cli_tree::ANNOTATION_PLUGIN_INSTALLATION_PATH;
use tanzu_core::{CliCommand, CommandTreeCache, PluginCatalog, ProcessInvoker, Target};
use tracing::debug;

use crate::utils::PluginCall;

/// Print the installed plugins as a table.
pub fn list(catalog: &PluginCatalog) {
    if catalog.plugins.is_empty() {
        println!("No plugins installed.");
        return;
    }

    let name_width = column_width("NAME", catalog.plugins.iter().map(|p| p.name.len()));
    let version_width = column_width("VERSION", catalog.plugins.iter().map(|p| p.version.len()));
    let target_width = column_width(
        "TARGET",
        catalog.plugins.iter().map(|p| p.target.as_str().len()),
    );

    println!(
        "{:name_width$}  {:version_width$}  {:target_width$}  PATH",
        "NAME", "VERSION", "TARGET"
    );
    for plugin in &catalog.plugins {
        println!(
            "{:name_width$}  {:version_width$}  {:target_width$}  {}",
            plugin.name,
            plugin.version,
            plugin.target.as_str(),
            plugin.installation_path.display()
        );
    }
}

fn column_width(header: &str, lengths: impl Iterator<Item = usize>) -> usize {
    lengths.max().unwrap_or(0).max(header.len())
}

/// Remove every cached command tree.
pub fn clean_tree_cache(cache: &mut CommandTreeCache) -> Result<()> {
    cache
        .delete_tree()
        .context("Failed to clean the plugin command tree cache")?;
    println!("Plugin command tree cache cleaned.");
    Ok(())
}

/// Print a plugin's command tree as YAML, building it on a cache miss.
pub async fn tree(
    cache: &mut CommandTreeCache,
    catalog: &PluginCatalog,
    root_cli: &CliCommand,
    name: &str,
    target: Option<&str>,
) -> Result<()> {
    let target = target.map(Target::from);
    let plugin = catalog
        .find_by_name(name, target.as_ref())
        .ok_or_else(|| anyhow!("Plugin '{name}' is not installed"))?;

    let tree = cache
        .get_tree(root_cli, plugin)
        .await
        .with_context(|| format!("Failed to get the command tree for plugin '{name}'"))?;
    print!("{}", serde_yaml::to_string(tree)?);
    Ok(())
}

/// Run a plugin with the terminal attached and return its exit code.
pub async fn dispatch(catalog: &PluginCatalog, call: &PluginCall<'_>) -> Result<i32> {
    let installation_path = call
        .command
        .annotation(ANNOTATION_PLUGIN_INSTALLATION_PATH)
        .unwrap_or_default();
    let plugin = catalog
        .find_by_installation_path(installation_path)
        .ok_or_else(|| anyhow!("No installed plugin provides '{}'", call.path.join(" ")))?;

    let args = call.plugin_args();
    debug!(plugin = %plugin.name, ?args, "dispatching to plugin");
    let code = ProcessInvoker::new().run(plugin, &args).await?;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_width_respects_header() {
        assert_eq!(column_width("NAME", [2, 3].into_iter()), 4);
        assert_eq!(column_width("NAME", [12].into_iter()), 12);
        assert_eq!(column_width("TARGET", std::iter::empty()), 6);
    }
}
