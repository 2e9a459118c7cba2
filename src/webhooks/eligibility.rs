//! Eligibility policy for host-alias injection.

use k8s_openapi::api::core::v1::Pod;

/// A Pod opts into host-alias injection by carrying the marker label.
/// Only the key's presence matters; the value is irrelevant. Pods with
/// no labels map are not watching.
pub fn is_watching(pod: &Pod, label_key: &str) -> bool {
    pod.metadata
        .labels
        .as_ref()
        .is_some_and(|labels| labels.contains_key(label_key))
}
