//! Error types and handling for tanzu-core operations.
//!
//! Every fallible operation in this crate returns [`Result<T>`] with the
//! [`Error`] enum below. Errors are grouped into categories so callers can
//! decide whether a failure is worth surfacing or only worth logging.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: file system access for the tree cache, docs scratch
//!   directory and lock files
//! - **Plugin Errors**: spawning a plugin or a plugin exiting non-zero
//! - **Build Errors**: command-tree discovery for a plugin failed
//! - **Storage Errors**: metrics database and row-cap enforcement
//! - **Configuration Errors**: invalid or unreadable config/catalog files
//! - **Timeouts**: bounded waits such as the metrics database lock
//!
//! ## Recovery Hints
//!
//! ```rust
//! use tanzu_core::Error;
//!
//! let err = Error::Timeout("timeout waiting for lock".to_string());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "timeout");
//! ```

use thiserror::Error;

/// The main error type for tanzu-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers reading/writing the command-tree cache file, wiping the docs
    /// scratch directory and opening lock files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage operation failed.
    ///
    /// Covers cache persistence and metrics database housekeeping beyond
    /// plain file I/O.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is invalid or inaccessible.
    ///
    /// ## Common Causes
    ///
    /// - Malformed `config.toml` or `plugins.toml`
    /// - Home directory cannot be determined
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource was not found.
    ///
    /// Used for plugins missing from the catalog and command paths that do
    /// not exist in a cached tree.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation timed out.
    ///
    /// Returned by the metrics database lock when the bounded wait expires.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization or deserialization failed.
    ///
    /// Raised for YAML, JSON and TOML encoding problems, including an
    /// existing but corrupt command-tree cache file.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The embedded metrics database reported an error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A plugin executable could not be spawned or exited unsuccessfully.
    #[error("Plugin '{plugin}' invocation failed: {reason}")]
    PluginInvocation {
        /// Name of the plugin that was invoked.
        plugin: String,
        /// Exit status and captured stderr, or the spawn failure.
        reason: String,
    },

    /// Command-tree discovery for a plugin failed.
    #[error("failed to build command tree for plugin '{plugin}': {reason}")]
    TreeBuild {
        /// Name of the plugin whose tree could not be built.
        plugin: String,
        /// Underlying failure.
        reason: String,
    },

    /// The metrics table already holds the maximum number of rows.
    #[error("metrics row threshold reached ({limit} rows), not recording new metrics")]
    ThresholdReached {
        /// Configured row cap.
        limit: usize,
    },

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Lock timeouts and interrupted or timed-out I/O are transient; a later
    /// CLI invocation will usually succeed. Everything else is permanent for
    /// the current invocation.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            Self::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Useful for structured logging of telemetry failures, which are never
    /// surfaced to the user directly.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::Timeout(_) => "timeout",
            Self::Serialization(_) => "serialization",
            Self::Database(_) => "database",
            Self::PluginInvocation { .. } => "plugin",
            Self::TreeBuild { .. } => "tree_build",
            Self::ThresholdReached { .. } => "threshold",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
