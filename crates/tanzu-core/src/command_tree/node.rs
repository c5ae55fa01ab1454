use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One command in a plugin's command hierarchy.
///
/// `subcommands` is keyed by literal subcommand name; `aliases` holds the
/// alternative names that also resolve to this node. This is the persisted
/// shape: it is exactly what the command-tree cache file stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandNode {
    /// Children keyed by literal name.
    #[serde(default)]
    pub subcommands: BTreeMap<String, CommandNode>,
    /// Alternative literal names for this node.
    #[serde(default)]
    pub aliases: BTreeSet<String>,
}

impl CommandNode {
    /// Empty node with no children and no aliases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Child reachable through `token`, preferring a literal name over an alias.
    #[must_use]
    pub fn child(&self, token: &str) -> Option<&Self> {
        self.subcommands.get(token).or_else(|| {
            self.subcommands
                .values()
                .find(|child| child.aliases.contains(token))
        })
    }

    /// Follow `path` from this node, matching names or aliases at each step.
    #[must_use]
    pub fn descend<S: AsRef<str>>(&self, path: &[S]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |node, segment| node.child(segment.as_ref()))
    }
}

/// Build-time wrapper around a node under construction.
///
/// Carries the `alias_processed` bookkeeping flag that must never reach the
/// persisted tree.
#[derive(Debug, Default)]
pub(crate) struct BuildNode {
    pub(crate) subcommands: BTreeMap<String, BuildNode>,
    pub(crate) aliases: BTreeSet<String>,
    pub(crate) alias_processed: bool,
}

impl BuildNode {
    pub(crate) fn child_or_insert(&mut self, name: &str) -> &mut Self {
        self.subcommands.entry(name.to_string()).or_default()
    }

    pub(crate) fn descend_mut(&mut self, path: &[String]) -> Option<&mut Self> {
        let mut node = self;
        for segment in path {
            node = node.subcommands.get_mut(segment)?;
        }
        Some(node)
    }

    pub(crate) fn into_command_node(self) -> CommandNode {
        CommandNode {
            subcommands: self
                .subcommands
                .into_iter()
                .map(|(name, child)| (name, child.into_command_node()))
                .collect(),
            aliases: self.aliases,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn leaf(aliases: &[&str]) -> CommandNode {
        CommandNode {
            subcommands: BTreeMap::new(),
            aliases: aliases.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn new_node_is_empty() {
        let node = CommandNode::new();
        assert!(node.subcommands.is_empty());
        assert!(node.aliases.is_empty());
    }

    #[test]
    fn literal_name_beats_alias() {
        let mut node = CommandNode::new();
        node.subcommands.insert("get".to_string(), leaf(&["list"]));
        node.subcommands.insert("list".to_string(), leaf(&["ls"]));

        let via_list = node.child("list").unwrap();
        assert!(via_list.aliases.contains("ls"));
        assert!(node.child("ls").is_some());
        assert!(node.child("missing").is_none());
    }

    #[test]
    fn build_node_drops_bookkeeping_on_conversion() {
        let mut root = BuildNode::default();
        let child = root.child_or_insert("cluster");
        child.alias_processed = true;
        child.aliases.insert("cl".to_string());

        let node = root.into_command_node();
        let yaml = serde_yaml::to_string(&node).unwrap();
        assert!(!yaml.contains("processed"));
        assert!(node.descend(&["cl"]).is_some());
    }
}
