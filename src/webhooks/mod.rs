//! Mutating admission webhook for Pod host-alias injection.
//!
//! The mutation pipeline runs eligibility check, Service directory read,
//! host-alias append, structural diff, and response construction.

pub mod eligibility;
pub mod mutation;
mod server;

pub use mutation::PodMutator;
pub use server::{
    MUTATE_POD_PATH, WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH, WEBHOOK_PORT, WebhookError,
    WebhookState, create_webhook_router, run_webhook_server,
};
