//! What the user typed for a built-in command, in telemetry terms.

use clap::ArgMatches;
use clap::parser::ValueSource;
use tanzu_core::SetFlag;

/// Canonical path, positional arguments and explicitly set flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Command path, root first.
    pub path: Vec<String>,
    /// Positional argument values, in declaration order.
    pub args: Vec<String>,
    /// Flags set on the command line (defaults and env values excluded).
    pub flags: Vec<SetFlag>,
}

/// Walk `matches` down to the leaf subcommand and collect what was set there.
///
/// `definition` must be built (`clap::Command::build`) so global arguments
/// are visible on subcommands.
pub fn parse_command(definition: &clap::Command, matches: &ArgMatches) -> ParsedCommand {
    let mut path = vec![definition.get_name().to_string()];
    let mut command = definition;
    let mut leaf = matches;
    while let Some((name, sub_matches)) = leaf.subcommand() {
        let Some(next) = command.find_subcommand(name) else {
            break;
        };
        path.push(next.get_name().to_string());
        command = next;
        leaf = sub_matches;
    }

    let mut args = Vec::new();
    let mut flags = Vec::new();
    for arg in command.get_arguments() {
        let id = arg.get_id().as_str();
        if leaf.value_source(id) != Some(ValueSource::CommandLine) {
            continue;
        }
        let values: Vec<String> = leaf
            .try_get_raw(id)
            .ok()
            .flatten()
            .map(|raw| raw.map(|value| value.to_string_lossy().into_owned()).collect())
            .unwrap_or_default();

        if arg.is_positional() {
            args.extend(values);
            continue;
        }
        let is_bool = !arg.get_action().takes_values();
        flags.push(SetFlag {
            name: arg.get_long().unwrap_or(id).to_string(),
            value: if is_bool {
                "true".to_string()
            } else {
                values.join(",")
            },
            is_bool,
        });
    }

    ParsedCommand { path, args, flags }
}
