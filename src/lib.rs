//! hostalias-webhook library crate
//!
//! A mutating admission webhook that injects Service-derived hostAliases
//! into Pods carrying the watch marker label.

pub mod admission;
pub mod config;
pub mod directory;
pub mod error;
pub mod health;
pub mod patch;
pub mod response;
pub mod webhooks;

pub use config::{FailurePolicy, WebhookConfig};
pub use directory::{KubeServiceDirectory, ServiceDirectory};
pub use error::{Error, Result};
pub use health::HealthState;
pub use webhooks::{
    MUTATE_POD_PATH, PodMutator, WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH, WEBHOOK_PORT, WebhookError,
    WebhookState, create_webhook_router, run_webhook_server,
};
