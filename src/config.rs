//! Webhook configuration from environment variables.

use std::time::Duration;

use tracing::warn;

/// Label key that opts a Pod into host-alias injection
pub const DEFAULT_WATCH_LABEL: &str = "k8s-app";

/// Default bound on the Service directory listing call
const DEFAULT_DIRECTORY_TIMEOUT_SECS: u64 = 10;

/// What to do with a request when the Service directory cannot be listed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Allow the Pod unmutated and attach a warning
    Open,
    /// Deny the Pod with a server-error status
    Closed,
}

/// Runtime configuration for the mutating webhook
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// Marker label key; presence (any value) makes a Pod eligible
    pub watch_label: String,
    /// Discipline applied when the directory read fails
    pub failure_policy: FailurePolicy,
    /// Skip aliases already present on the Pod before appending.
    /// Off by default: repeated admission then appends duplicates, which
    /// matches the upstream behavior this webhook replaces.
    pub dedupe_aliases: bool,
    /// Deadline for the cluster-wide Service listing
    pub directory_timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            watch_label: DEFAULT_WATCH_LABEL.to_string(),
            failure_policy: FailurePolicy::Open,
            dedupe_aliases: false,
            directory_timeout: Duration::from_secs(DEFAULT_DIRECTORY_TIMEOUT_SECS),
        }
    }
}

impl WebhookConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults (with a warning) on unrecognized values.
    ///
    /// - `WATCH_LABEL_KEY`: marker label key (default `k8s-app`)
    /// - `FAILURE_POLICY`: `open` or `closed` (default `open`)
    /// - `DEDUPE_HOST_ALIASES`: `true`/`false` (default `false`)
    /// - `DIRECTORY_TIMEOUT_SECS`: integer seconds (default 10)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("WATCH_LABEL_KEY") {
            if key.is_empty() {
                warn!("WATCH_LABEL_KEY is empty, keeping default '{DEFAULT_WATCH_LABEL}'");
            } else {
                config.watch_label = key;
            }
        }

        if let Ok(policy) = std::env::var("FAILURE_POLICY") {
            match policy.to_ascii_lowercase().as_str() {
                "open" => config.failure_policy = FailurePolicy::Open,
                "closed" => config.failure_policy = FailurePolicy::Closed,
                other => warn!("Unrecognized FAILURE_POLICY '{other}', keeping fail-open"),
            }
        }

        if let Ok(dedupe) = std::env::var("DEDUPE_HOST_ALIASES") {
            match dedupe.parse::<bool>() {
                Ok(v) => config.dedupe_aliases = v,
                Err(_) => warn!("Unrecognized DEDUPE_HOST_ALIASES '{dedupe}', keeping disabled"),
            }
        }

        if let Ok(secs) = std::env::var("DIRECTORY_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(v) if v > 0 => config.directory_timeout = Duration::from_secs(v),
                _ => warn!(
                    "Unrecognized DIRECTORY_TIMEOUT_SECS '{secs}', keeping {}s",
                    DEFAULT_DIRECTORY_TIMEOUT_SECS
                ),
            }
        }

        config
    }
}
