//! Shared helpers for the CLI pipeline.
//!
//! - [`logging`]: tracing subscriber setup
//! - [`live_tree`]: the CLI command tree with installed plugins grafted on
//! - [`invocation`]: built-in command path, arguments and flags for telemetry

pub mod invocation;
pub mod live_tree;
pub mod logging;

pub use invocation::{ParsedCommand, parse_command};
pub use live_tree::{PluginCall, build_live_tree, resolve_plugin_call};
pub use logging::initialize_logging;
