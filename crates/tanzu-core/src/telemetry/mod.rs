//! Anonymized usage telemetry.
//!
//! [`TelemetryClient`] captures one [`OperationMetricsPayload`] per CLI
//! invocation in two phases around command execution, stores it in the
//! local metrics database and hands collection off to the
//! `cli-usage-analytics` plugin. Sensitive values (positional arguments,
//! flag values, endpoints) are only ever stored as SHA-256 digests.

mod client;
mod endpoint;
mod flags;
mod payload;

pub use client::{
    CommandInvocation, SEND_THRESHOLD, SEND_TIMEOUT_ENV, SetFlag, TELEMETRY_DEBUG_ENV,
    TELEMETRY_PLUGIN_NAME, TelemetryClient, TelemetryClientOptions,
};
pub use endpoint::{
    compute_endpoint_sha_for_k8s_context, compute_endpoint_sha_for_tanzu_context,
    compute_endpoint_sha_for_tmc_context, endpoint_context_types, endpoint_hash,
};
pub use flags::{flag_names, flag_names_json};
pub use payload::OperationMetricsPayload;

use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Lowercase hex SHA-256 digest of `data`.
pub(crate) fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    Sha256::digest(data.as_ref())
        .iter()
        .fold(String::with_capacity(64), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}
