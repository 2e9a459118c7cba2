//! Mutation orchestrator for Pod admission requests.
//!
//! Sequences eligibility check, directory read, mutation, diff and
//! response construction. Every path through [`PodMutator::mutate`] is
//! total: each entry state ends in a fully populated admission response.

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use k8s_openapi::api::core::v1::{HostAlias, Pod};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::admission::{AdmissionRequest, AdmissionResponse};
use crate::config::{FailurePolicy, WebhookConfig};
use crate::directory::ServiceDirectory;
use crate::error::{Error, Result};
use crate::health::HealthState;
use crate::webhooks::eligibility;
use crate::{patch, response};

/// Orchestrates one Pod mutation per admission request.
///
/// Holds the directory capability and configuration for the process
/// lifetime; requests share nothing else.
pub struct PodMutator<D> {
    directory: D,
    config: WebhookConfig,
    health: Option<Arc<HealthState>>,
}

impl<D: ServiceDirectory> PodMutator<D> {
    pub fn new(directory: D, config: WebhookConfig) -> Self {
        Self {
            directory,
            config,
            health: None,
        }
    }

    /// Attach a health state so admission outcomes are recorded as metrics
    pub fn with_health_state(mut self, health: Arc<HealthState>) -> Self {
        self.health = Some(health);
        self
    }

    /// Handle one admission request, recording outcome metrics
    pub async fn mutate(&self, request: &AdmissionRequest) -> AdmissionResponse {
        let start = Instant::now();
        let response = self.admit(request).await;
        if let Some(health) = &self.health {
            health
                .metrics
                .record_admission(outcome(&response), start.elapsed().as_secs_f64());
        }
        response
    }

    async fn admit(&self, request: &AdmissionRequest) -> AdmissionResponse {
        let uid = request.uid.as_str();

        let Some(object) = request.object.as_ref() else {
            let err = Error::BadRequest("admission request has no object".to_string());
            warn!(uid = %uid, error = %err, "Rejecting admission request");
            return response::denied(uid, StatusCode::BAD_REQUEST.as_u16().into(), err.to_string());
        };

        let pod: Pod = match serde_json::from_value(object.clone())
            .map_err(|e| Error::BadRequest(format!("could not decode Pod: {e}")))
        {
            Ok(pod) => pod,
            Err(e) => {
                warn!(uid = %uid, error = %e, "Rejecting admission request");
                return response::denied(
                    uid,
                    StatusCode::BAD_REQUEST.as_u16().into(),
                    e.to_string(),
                );
            }
        };

        if !eligibility::is_watching(&pod, &self.config.watch_label) {
            debug!(uid = %uid, "Pod is not watching");
            return response::allowed_unchanged(uid, "Pod is not watching");
        }

        let aliases = match self.read_directory().await {
            Ok(aliases) => aliases,
            Err(e) => return self.directory_failure(uid, &e),
        };

        if aliases.is_empty() {
            debug!(uid = %uid, "No host aliases found");
            return response::allowed_unchanged(uid, "No host aliases found");
        }

        let (mutated, appended) =
            apply_host_aliases(&pod, aliases, self.config.dedupe_aliases);

        let patch = match self.diff_pods(object, &mutated) {
            Ok(patch) => patch,
            Err(e) => {
                error!(uid = %uid, error = %e, "Failed to synthesize patch");
                return response::denied(
                    uid,
                    StatusCode::INTERNAL_SERVER_ERROR.as_u16().into(),
                    e.to_string(),
                );
            }
        };

        match response::allowed_with_patch(uid, &patch) {
            Ok(resp) => {
                info!(
                    uid = %uid,
                    aliases = appended,
                    operations = patch.0.len(),
                    "Pod admitted with host-alias patch"
                );
                if let Some(health) = &self.health {
                    health.metrics.record_aliases_injected(appended as u64);
                }
                resp
            }
            Err(e) => {
                error!(uid = %uid, error = %e, "Failed to serialize patch");
                response::denied(
                    uid,
                    StatusCode::INTERNAL_SERVER_ERROR.as_u16().into(),
                    e.to_string(),
                )
            }
        }
    }

    /// List host aliases, bounded by the configured deadline
    async fn read_directory(&self) -> Result<Vec<HostAlias>> {
        match timeout(
            self.config.directory_timeout,
            self.directory.list_host_aliases(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::DirectoryUnavailable(format!(
                "Service listing timed out after {:?}",
                self.config.directory_timeout
            ))),
        }
    }

    /// Re-encode both sides and diff original against mutated
    fn diff_pods(&self, original: &serde_json::Value, mutated: &Pod) -> Result<json_patch::Patch> {
        let original_bytes = serde_json::to_vec(original)?;
        let mutated_bytes = serde_json::to_vec(mutated)?;
        patch::diff(&original_bytes, &mutated_bytes)
    }

    /// Apply the configured failure discipline for an unreadable directory
    fn directory_failure(&self, uid: &str, err: &Error) -> AdmissionResponse {
        let message = format!("failed to get host aliases: {err}");
        match self.config.failure_policy {
            FailurePolicy::Open => {
                warn!(uid = %uid, error = %err, "Directory read failed, allowing unmutated");
                response::allowed_with_warnings(uid, vec![message])
            }
            FailurePolicy::Closed => {
                error!(uid = %uid, error = %err, "Directory read failed, denying");
                response::denied(
                    uid,
                    StatusCode::INTERNAL_SERVER_ERROR.as_u16().into(),
                    message,
                )
            }
        }
    }
}

/// Append aliases to a copy of the Pod, preserving pre-existing entries.
/// With `dedupe` set, aliases already present on the Pod are skipped so
/// repeated admission of the same Pod converges instead of growing the
/// list. Returns the mutated copy and the number of entries appended.
fn apply_host_aliases(pod: &Pod, aliases: Vec<HostAlias>, dedupe: bool) -> (Pod, usize) {
    let mut mutated = pod.clone();
    let spec = mutated.spec.get_or_insert_with(Default::default);
    let existing = spec.host_aliases.get_or_insert_with(Vec::new);

    let mut appended = 0;
    for alias in aliases {
        if dedupe && existing.contains(&alias) {
            continue;
        }
        existing.push(alias);
        appended += 1;
    }
    (mutated, appended)
}

/// Classify a response for metrics labeling
fn outcome(response: &AdmissionResponse) -> &'static str {
    if !response.allowed {
        "denied"
    } else if response.patch.is_some() {
        "patched"
    } else if !response.warnings.is_empty() {
        "warned"
    } else {
        "unchanged"
    }
}
