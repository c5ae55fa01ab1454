use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Usage record for one CLI invocation.
///
/// Filled in two phases: pre-run sets identity, command and flag fields;
/// post-run sets the exit status and end time. A payload whose
/// `start_time` is `None` was never populated and is not saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationMetricsPayload {
    /// Stable id of this CLI installation.
    pub cli_id: String,
    /// Version of the CLI binary.
    pub cli_version: String,
    /// When pre-run captured the invocation.
    pub start_time: Option<DateTime<Utc>>,
    /// When post-run captured completion.
    pub end_time: Option<DateTime<Utc>>,
    /// Process exit status of the command.
    pub exit_status: i32,
    /// Command path without the root command, e.g. `plugin list` or
    /// `cluster node-pool list`.
    pub command_name: String,
    /// SHA-256 hex digest of the first positional argument (core commands).
    pub name_arg: String,
    /// JSON object of the flags that were set.
    pub flags: String,
    /// Plugin name (plugin commands).
    pub plugin_name: String,
    /// Plugin version (plugin commands).
    pub plugin_version: String,
    /// Plugin target (plugin commands).
    pub target: String,
    /// `<context type>:<sha256>` of the active endpoint (plugin commands).
    pub endpoint: String,
    /// Whether the user is internal.
    pub is_internal: bool,
    /// Error text of a failed command.
    pub error: String,
}

impl OperationMetricsPayload {
    /// Whether pre-run populated this payload.
    #[must_use]
    pub const fn is_populated(&self) -> bool {
        self.start_time.is_some()
    }
}
