//! Model of the CLI's own command tree.
//!
//! The front end builds this from its argument parser definition and the
//! plugin catalog. The command-tree builder reads remapping annotations from
//! it, and the telemetry client uses it to tell core commands from plugin
//! commands.

use std::collections::HashMap;

/// Annotation key holding the command type.
pub const ANNOTATION_TYPE: &str = "type";
/// Value of [`ANNOTATION_TYPE`] for commands served by a plugin.
pub const COMMAND_TYPE_PLUGIN: &str = "plugin";
/// Annotation key holding the installation path of the serving plugin.
pub const ANNOTATION_PLUGIN_INSTALLATION_PATH: &str = "pluginInstallationPath";
/// Annotation key holding the plugin-internal path of a remapped command.
pub const ANNOTATION_REMAPPED_SOURCE_PATH: &str = "remappedSourcePath";

/// A node of the live CLI command tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliCommand {
    /// Literal command name.
    pub name: String,
    /// Alternative names accepted by the parser.
    pub aliases: Vec<String>,
    /// Free-form metadata.
    pub annotations: HashMap<String, String>,
    /// Child commands.
    pub subcommands: Vec<CliCommand>,
}

impl CliCommand {
    /// Create a command with no children or annotations.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style helper to attach an annotation.
    #[must_use]
    pub fn with_annotation(mut self, key: &str, value: impl Into<String>) -> Self {
        self.annotations.insert(key.to_string(), value.into());
        self
    }

    /// Builder-style helper to attach aliases.
    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Read an annotation value.
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Whether this command is served by a plugin.
    #[must_use]
    pub fn is_plugin_command(&self) -> bool {
        self.annotation(ANNOTATION_TYPE) == Some(COMMAND_TYPE_PLUGIN)
    }

    /// Direct child matching `name` by literal name or alias.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.subcommands
            .iter()
            .find(|cmd| cmd.name == name)
            .or_else(|| {
                self.subcommands
                    .iter()
                    .find(|cmd| cmd.aliases.iter().any(|alias| alias == name))
            })
    }

    /// Mutable child by literal name, inserting an empty command if absent.
    pub fn child_or_insert(&mut self, name: &str) -> &mut Self {
        let idx = match self.subcommands.iter().position(|cmd| cmd.name == name) {
            Some(idx) => idx,
            None => {
                self.subcommands.push(Self::new(name));
                self.subcommands.len() - 1
            },
        };
        &mut self.subcommands[idx]
    }

    /// Follow `path` (not including this command's own name).
    #[must_use]
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |cmd, segment| cmd.child(segment.as_ref()))
    }

    /// Commands visited while following `path`, stopping at the first miss.
    #[must_use]
    pub fn trail<S: AsRef<str>>(&self, path: &[S]) -> Vec<&Self> {
        let mut visited = Vec::new();
        let mut current = self;
        for segment in path {
            match current.child(segment.as_ref()) {
                Some(next) => {
                    visited.push(next);
                    current = next;
                },
                None => break,
            }
        }
        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> CliCommand {
        let mut root = CliCommand::new("tanzu");
        root.subcommands.push(CliCommand::new("plugin"));
        let k8s = root.child_or_insert("kubernetes");
        k8s.aliases = vec!["k8s".to_string()];
        k8s.subcommands.push(
            CliCommand::new("cluster")
                .with_annotation(ANNOTATION_TYPE, COMMAND_TYPE_PLUGIN)
                .with_annotation(ANNOTATION_PLUGIN_INSTALLATION_PATH, "/p/cluster"),
        );
        root
    }

    #[test]
    fn find_follows_names_and_aliases() {
        let root = sample_tree();
        let by_name = root.find(&["kubernetes", "cluster"]);
        let by_alias = root.find(&["k8s", "cluster"]);
        assert!(by_name.is_some());
        assert_eq!(by_name, by_alias);
        assert!(root.find(&["kubernetes", "missing"]).is_none());
    }

    #[test]
    fn plugin_annotation_marks_plugin_commands() {
        let root = sample_tree();
        assert!(!root.find(&["plugin"]).is_some_and(CliCommand::is_plugin_command));
        let cluster = root.find(&["k8s", "cluster"]);
        assert!(cluster.is_some_and(CliCommand::is_plugin_command));
        assert_eq!(
            cluster.and_then(|c| c.annotation(ANNOTATION_PLUGIN_INSTALLATION_PATH)),
            Some("/p/cluster")
        );
    }

    #[test]
    fn trail_stops_at_first_miss() {
        let root = sample_tree();
        let trail = root.trail(&["kubernetes", "cluster", "get"]);
        let names: Vec<&str> = trail.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["kubernetes", "cluster"]);
    }

    #[test]
    fn child_or_insert_is_idempotent() {
        let mut root = CliCommand::new("tanzu");
        root.child_or_insert("operations");
        root.child_or_insert("operations");
        assert_eq!(root.subcommands.len(), 1);
    }
}
