//! Salted endpoint fingerprints for plugin telemetry.
//!
//! A plugin's target decides which active contexts may describe the server
//! it talks to. Candidates are tried in order; the first active one is
//! hashed and reported as `<context type>:<sha256 hex>`.

use super::sha256_hex;
use crate::Result;
use crate::config::{CliConfig, Context, ContextType};
use crate::plugin::Target;
use tracing::debug;

type ContextHasher = fn(&Context) -> Result<String>;

const KUBERNETES_CANDIDATES: &[(ContextType, ContextHasher)] = &[
    (ContextType::Kubernetes, compute_endpoint_sha_for_k8s_context),
    (ContextType::Tanzu, compute_endpoint_sha_for_tanzu_context),
];

const MISSION_CONTROL_CANDIDATES: &[(ContextType, ContextHasher)] = &[(
    ContextType::MissionControl,
    compute_endpoint_sha_for_tmc_context,
)];

const TANZU_CANDIDATES: &[(ContextType, ContextHasher)] = &[
    (ContextType::Tanzu, compute_endpoint_sha_for_tanzu_context),
    (ContextType::Kubernetes, compute_endpoint_sha_for_k8s_context),
];

/// Ordered context candidates for a plugin target.
fn candidates(target: &Target) -> &'static [(ContextType, ContextHasher)] {
    match target {
        Target::Kubernetes => KUBERNETES_CANDIDATES,
        Target::MissionControl => MISSION_CONTROL_CANDIDATES,
        Target::Operations | Target::Global | Target::Other(_) => TANZU_CANDIDATES,
    }
}

/// Context types consulted for `target`, in priority order.
#[must_use]
pub fn endpoint_context_types(target: &Target) -> Vec<ContextType> {
    candidates(target).iter().map(|(ty, _)| *ty).collect()
}

/// Fingerprint of the endpoint a `target` plugin talks to.
///
/// Empty when no candidate context is active.
#[must_use]
pub fn endpoint_hash(config: &CliConfig, target: &Target) -> String {
    for (context_type, hasher) in candidates(target) {
        let Some(context) = config.active_context(*context_type) else {
            continue;
        };
        match hasher(context) {
            Ok(digest) => return format!("{context_type}:{digest}"),
            Err(err) => debug!(%context_type, %err, "failed to hash active context"),
        }
    }
    String::new()
}

/// Hash of the whole serialized kubernetes context.
pub fn compute_endpoint_sha_for_k8s_context(context: &Context) -> Result<String> {
    Ok(sha256_hex(serde_json::to_vec(context)?))
}

/// Hash of endpoint, organization, project, space and cluster group.
pub fn compute_endpoint_sha_for_tanzu_context(context: &Context) -> Result<String> {
    let input = [
        context.endpoint.as_str(),
        context.org_id.as_str(),
        context.project.as_str(),
        context.space.as_str(),
        context.cluster_group.as_str(),
    ]
    .concat();
    Ok(sha256_hex(input))
}

/// Hash of endpoint and refresh token.
pub fn compute_endpoint_sha_for_tmc_context(context: &Context) -> Result<String> {
    Ok(sha256_hex(format!("{}{}", context.endpoint, context.refresh_token)))
}
