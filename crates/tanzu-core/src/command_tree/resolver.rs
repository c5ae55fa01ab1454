use super::node::CommandNode;

/// Reconstruct the subcommand path a user invoked below `node`.
///
/// Walks `args` in order, descending on a literal subcommand name or a
/// declared alias. Flags are skipped, `--` ends the walk, and so does the
/// first token that is neither (it is taken to be a positional argument).
/// Each matched token is appended with a leading space, exactly as typed.
#[must_use]
pub fn parse_plugin_command_path<S: AsRef<str>>(node: &CommandNode, args: &[S]) -> String {
    let mut path = String::new();
    let mut current = node;

    for arg in args {
        if current.subcommands.is_empty() {
            break;
        }
        let token = arg.as_ref();
        if token == "--" {
            break;
        }
        if is_flag(token) {
            continue;
        }
        match current.child(token) {
            Some(next) => {
                path.push(' ');
                path.push_str(token);
                current = next;
            },
            None => break,
        }
    }

    path
}

/// `--name`, `-n`, `--name=value` and `-n=value` are flags; `-` alone is not.
fn is_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn node(children: Vec<(&str, CommandNode)>, aliases: &[&str]) -> CommandNode {
        CommandNode {
            subcommands: children
                .into_iter()
                .map(|(name, child)| (name.to_string(), child))
                .collect::<BTreeMap<_, _>>(),
            aliases: aliases.iter().map(ToString::to_string).collect::<BTreeSet<_>>(),
        }
    }

    /// cluster -> {get (g), node-pool (np) -> {list (ls)}}
    fn cluster_tree() -> CommandNode {
        node(
            vec![
                ("get", node(vec![], &["g"])),
                (
                    "node-pool",
                    node(vec![("list", node(vec![], &["ls"]))], &["np"]),
                ),
            ],
            &[],
        )
    }

    #[test]
    fn literal_and_alias_tokens_descend() {
        let tree = cluster_tree();
        assert_eq!(parse_plugin_command_path(&tree, &["get", "my-cluster"]), " get");
        assert_eq!(parse_plugin_command_path(&tree, &["np", "ls"]), " np ls");
        assert_eq!(
            parse_plugin_command_path(&tree, &["node-pool", "list", "extra"]),
            " node-pool list"
        );
    }

    #[test]
    fn flags_are_skipped_and_double_dash_stops() {
        let tree = cluster_tree();
        assert_eq!(
            parse_plugin_command_path(&tree, &["--verbose", "-v", "--output=json", "-o=yaml", "node-pool", "list"]),
            " node-pool list"
        );
        assert_eq!(parse_plugin_command_path(&tree, &["--", "get"]), "");
        assert_eq!(parse_plugin_command_path(&tree, &["node-pool", "--", "list"]), " node-pool");
    }

    #[test]
    fn unknown_token_stops_resolution() {
        let tree = cluster_tree();
        assert_eq!(parse_plugin_command_path(&tree, &["my-cluster", "get"]), "");
        assert_eq!(parse_plugin_command_path::<&str>(&tree, &[]), "");
    }

    #[test]
    fn leaf_nodes_stop_resolution() {
        let tree = cluster_tree();
        assert_eq!(parse_plugin_command_path(&tree, &["get", "get"]), " get");
    }

    #[test]
    fn resolution_is_deterministic() {
        let tree = cluster_tree();
        let args = ["np", "-x", "ls", "foo"];
        let first = parse_plugin_command_path(&tree, &args);
        for _ in 0..10 {
            assert_eq!(parse_plugin_command_path(&tree, &args), first);
        }
    }
}
