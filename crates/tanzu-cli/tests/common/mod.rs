#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Isolated config, cache and telemetry directories for one test.
pub struct TanzuHome {
    dir: TempDir,
}

#[allow(dead_code)]
impl TanzuHome {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tanzu home for tests"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root().join("config")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root().join("cache")
    }

    pub fn telemetry_dir(&self) -> PathBuf {
        self.root().join("telemetry")
    }

    pub fn metrics_db(&self) -> PathBuf {
        self.telemetry_dir().join("cli_metrics.db")
    }

    /// A configured `tanzu` command pointing at this home.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tanzu"));
        cmd.timeout(CMD_TIMEOUT);
        cmd.env("HOME", self.root());
        cmd.env("TANZU_CONFIG_DIR", self.config_dir());
        cmd.env("TANZU_CLI_COMMAND_TREE_CACHE_DIR", self.cache_dir());
        cmd.env("TANZU_CLI_TELEMETRY_DIR", self.telemetry_dir());
        cmd.env_remove("TANZU_CLI_TELEMETRY_DEBUG");
        cmd.env_remove("TANZU_CLI_TELEMETRY_SEND_TIMEOUT");
        cmd
    }

    /// Write the plugin catalog.
    pub fn write_catalog(&self, toml: &str) {
        std::fs::create_dir_all(self.config_dir()).unwrap();
        std::fs::write(self.config_dir().join("plugins.toml"), toml).unwrap();
    }

    /// Write `config.toml` verbatim.
    pub fn write_config(&self, content: &str) {
        std::fs::create_dir_all(self.config_dir()).unwrap();
        std::fs::write(self.config_dir().join("config.toml"), content).unwrap();
    }

    pub fn read_config(&self) -> String {
        std::fs::read_to_string(self.config_dir().join("config.toml")).unwrap()
    }

    /// Rows of `(command, plugin_name, exit_status)` in the metrics database.
    pub fn recorded_commands(&self) -> Vec<(String, String, i64)> {
        let conn = rusqlite::Connection::open(self.metrics_db()).unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT command, coalesce(plugin_name, ''), exit_status \
                 FROM tanzu_cli_operations ORDER BY command_start_ts",
            )
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }
}

/// Shell-script stand-in for a kubernetes `cluster` plugin.
///
/// Generates docs for `cluster {get, node-pool (np) {list (ls)}}`, answers
/// `-h` with alias lines, echoes other invocations and exits 3 on `fail`.
#[cfg(unix)]
#[allow(dead_code)]
pub fn write_cluster_plugin(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    const SCRIPT: &str = r#"#!/bin/sh
if [ "$1" = "generate-docs" ]; then
  mkdir -p "$3"
  for doc in tanzu_cluster tanzu_cluster_get tanzu_cluster_node-pool tanzu_cluster_node-pool_list; do
    : > "$3/$doc.md"
  done
  exit 0
fi
for last in "$@"; do :; done
if [ "$last" = "-h" ]; then
  case "$*" in
    "node-pool -h") printf 'Aliases:\n  node-pool, np\n' ;;
    "node-pool list -h") printf 'Aliases:\n  list, ls\n' ;;
  esac
  exit 0
fi
echo "cluster plugin: $*"
if [ "$1" = "fail" ]; then
  exit 3
fi
exit 0
"#;

    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("cluster");
    std::fs::write(&path, SCRIPT).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
