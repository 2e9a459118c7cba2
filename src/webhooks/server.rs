//! Admission webhook server.
//!
//! Serves the mutating endpoint over TLS. The transport layer here only
//! decodes the AdmissionReview envelope and encodes the reply; all
//! admission semantics live in [`crate::webhooks::mutation`].
//!
//! To enable the webhook:
//! 1. Deploy cert-manager (or equivalent) for TLS certificates
//! 2. Create a MutatingWebhookConfiguration pointing at `/mutate-core-v1-pod`
//! 3. Mount the TLS certificate secret to the pod at /etc/webhook/certs/

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::admission::AdmissionReview;
use crate::directory::ServiceDirectory;
use crate::health::HealthState;
use crate::response;
use crate::webhooks::mutation::PodMutator;

/// Path of the Pod mutation endpoint
pub const MUTATE_POD_PATH: &str = "/mutate-core-v1-pod";
/// Default path to webhook TLS certificate
pub const WEBHOOK_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const WEBHOOK_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 9443;

/// Shared state for webhook handlers
pub struct WebhookState<D> {
    pub mutator: PodMutator<D>,
}

impl<D: ServiceDirectory> WebhookState<D> {
    pub fn new(mutator: PodMutator<D>) -> Self {
        Self { mutator }
    }
}

/// Create the webhook router
pub fn create_webhook_router<D>(state: Arc<WebhookState<D>>) -> Router
where
    D: ServiceDirectory + 'static,
{
    Router::new()
        .route(MUTATE_POD_PATH, post(mutate_pod::<D>))
        .with_state(state)
}

/// Pod mutation webhook handler
async fn mutate_pod<D: ServiceDirectory + 'static>(
    State(state): State<Arc<WebhookState<D>>>,
    Json(review): Json<AdmissionReview>,
) -> impl IntoResponse {
    let Some(request) = review.request else {
        error!("AdmissionReview has no request");
        return (
            StatusCode::BAD_REQUEST,
            Json(
                response::denied(
                    "",
                    StatusCode::BAD_REQUEST.as_u16().into(),
                    "AdmissionReview has no request",
                )
                .into_review(),
            ),
        );
    };

    debug!(
        uid = %request.uid,
        operation = ?request.operation,
        namespace = ?request.namespace,
        name = ?request.name,
        "Processing admission request"
    );

    let admission_response = state.mutator.mutate(&request).await;
    (StatusCode::OK, Json(admission_response.into_review()))
}

/// Errors that can occur when running the webhook server
#[derive(Debug)]
pub enum WebhookError {
    /// TLS configuration error
    TlsConfig(String),
    /// Server error
    Server(String),
}

impl std::fmt::Display for WebhookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebhookError::TlsConfig(msg) => write!(f, "TLS configuration error: {}", msg),
            WebhookError::Server(msg) => write!(f, "Webhook server error: {}", msg),
        }
    }
}

impl std::error::Error for WebhookError {}

/// Run the webhook server with TLS.
///
/// Binds to 0.0.0.0:9443 and serves the Pod mutation endpoint. TLS
/// certificates are loaded from the given PEM files. If a health state
/// is provided, readiness flips once the listener is configured.
pub async fn run_webhook_server<D>(
    state: Arc<WebhookState<D>>,
    health_state: Option<Arc<HealthState>>,
    cert_path: &str,
    key_path: &str,
) -> Result<(), WebhookError>
where
    D: ServiceDirectory + 'static,
{
    use axum_server::tls_rustls::RustlsConfig;
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let app = create_webhook_router(state);

    let config = RustlsConfig::from_pem_file(PathBuf::from(cert_path), PathBuf::from(key_path))
        .await
        .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    if let Some(health) = health_state {
        health.set_ready(true).await;
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], WEBHOOK_PORT));
    info!(port = WEBHOOK_PORT, "Webhook server listening with TLS");

    axum_server::bind_rustls(addr, config)
        .serve(app.into_make_service())
        .await
        .map_err(|e| WebhookError::Server(e.to_string()))?;

    Ok(())
}
