//! Running plugin executables as subprocesses.
//!
//! The command-tree builder and the telemetry sender only need "run this
//! plugin with these arguments and give me its output", which is captured by
//! the [`PluginInvoker`] trait so tests can substitute a fake.

use crate::plugin::PluginInfo;
use crate::{Error, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Captured output of a successful plugin run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginOutput {
    /// Standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Standard error, lossily decoded as UTF-8.
    pub stderr: String,
}

/// Capability to run a plugin and capture what it prints.
#[async_trait]
pub trait PluginInvoker: Send + Sync {
    /// Run `plugin` with `args` and wait for it to exit.
    ///
    /// A spawn failure or a non-zero exit is reported as
    /// [`Error::PluginInvocation`].
    async fn invoke(&self, plugin: &PluginInfo, args: &[String]) -> Result<PluginOutput>;
}

/// Invoker that spawns the plugin binary at its installation path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

impl ProcessInvoker {
    /// Create a new process invoker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Run the plugin with inherited stdio and return its exit code.
    ///
    /// Used for interactive dispatch, where the plugin owns the terminal.
    #[instrument(level = "debug", skip(self, plugin), fields(plugin = %plugin.name))]
    pub async fn run(&self, plugin: &PluginInfo, args: &[String]) -> Result<i32> {
        let status = Command::new(&plugin.installation_path)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| Error::PluginInvocation {
                plugin: plugin.name.clone(),
                reason: format!("failed to spawn {}: {e}", plugin.installation_path.display()),
            })?;

        // Killed by a signal: report the conventional shell failure code.
        Ok(status.code().unwrap_or(1))
    }
}

#[async_trait]
impl PluginInvoker for ProcessInvoker {
    #[instrument(level = "debug", skip(self, plugin), fields(plugin = %plugin.name))]
    async fn invoke(&self, plugin: &PluginInfo, args: &[String]) -> Result<PluginOutput> {
        let output = Command::new(&plugin.installation_path)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::PluginInvocation {
                plugin: plugin.name.clone(),
                reason: format!("failed to spawn {}: {e}", plugin.installation_path.display()),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |value| value.to_string());
            return Err(Error::PluginInvocation {
                plugin: plugin.name.clone(),
                reason: format!("exit code {code}: {}", stderr.trim()),
            });
        }

        debug!(bytes = stdout.len(), "plugin invocation succeeded");
        Ok(PluginOutput { stdout, stderr })
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::plugin::Target;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn script_plugin(dir: &Path, body: &str) -> PluginInfo {
        let path = dir.join("tanzu-plugin-fake");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        PluginInfo {
            name: "fake".to_string(),
            version: "v0.0.1".to_string(),
            target: Target::Global,
            installation_path: path,
            command_map: Vec::new(),
        }
    }

    #[tokio::test]
    async fn invoke_captures_stdout() {
        let dir = TempDir::new().unwrap();
        let plugin = script_plugin(dir.path(), r#"echo "args: $*""#);

        let output = ProcessInvoker::new()
            .invoke(&plugin, &["get".to_string(), "-h".to_string()])
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "args: get -h");
    }

    #[tokio::test]
    async fn invoke_reports_non_zero_exit() {
        let dir = TempDir::new().unwrap();
        let plugin = script_plugin(dir.path(), "echo boom >&2\nexit 3");

        let err = ProcessInvoker::new().invoke(&plugin, &[]).await.unwrap_err();
        match err {
            Error::PluginInvocation { plugin, reason } => {
                assert_eq!(plugin, "fake");
                assert!(reason.contains("exit code 3"));
                assert!(reason.contains("boom"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_returns_exit_code() {
        let dir = TempDir::new().unwrap();
        let plugin = script_plugin(dir.path(), "exit 7");
        assert_eq!(ProcessInvoker::new().run(&plugin, &[]).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn missing_binary_is_invocation_error() {
        let plugin = PluginInfo {
            name: "ghost".to_string(),
            version: String::new(),
            target: Target::Global,
            installation_path: "/nonexistent/tanzu-plugin-ghost".into(),
            command_map: Vec::new(),
        };
        let err = ProcessInvoker::new().invoke(&plugin, &[]).await.unwrap_err();
        assert_eq!(err.category(), "plugin");
    }
}
