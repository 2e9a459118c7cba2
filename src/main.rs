//! hostalias-webhook - a mutating admission webhook that injects
//! Service-derived hostAliases into watched Pods.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Creates the Kubernetes client (fatal on failure; no request can be
//!   served without directory access)
//! - Starts the health server and the TLS webhook server

use std::sync::Arc;

use kube::Client;
use tokio::signal;
use tracing::{error, info};

use hostalias_webhook::health::{HealthState, run_health_server};
use hostalias_webhook::webhooks::{WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH, WebhookState};
use hostalias_webhook::{KubeServiceDirectory, PodMutator, WebhookConfig, run_webhook_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hostalias_webhook=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .json()
        .init();

    info!("Starting hostalias-webhook");

    let config = WebhookConfig::from_env();
    info!(
        watch_label = %config.watch_label,
        failure_policy = ?config.failure_policy,
        dedupe_aliases = config.dedupe_aliases,
        "Loaded configuration"
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Create shared health state
    let health_state = Arc::new(HealthState::new());

    // Start health server immediately (probes should work before the
    // webhook listener is up)
    let health_handle = {
        let health_state = health_state.clone();
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state).await {
                error!("Health server error: {}", e);
            }
        })
    };

    // Wire the mutation orchestrator with its directory capability
    let directory = KubeServiceDirectory::new(client);
    let mutator = PodMutator::new(directory, config).with_health_state(health_state.clone());
    let state = Arc::new(WebhookState::new(mutator));

    let webhook_handle = {
        let health_state = health_state.clone();
        tokio::spawn(async move {
            run_webhook_server(
                state,
                Some(health_state),
                WEBHOOK_CERT_PATH,
                WEBHOOK_KEY_PATH,
            )
            .await
        })
    };

    // Wait for a task to finish (or fail), or a shutdown signal
    tokio::select! {
        result = webhook_handle => {
            match result {
                Ok(Err(e)) => error!("Webhook server error: {}", e),
                Err(e) => error!("Webhook server task panicked: {}", e),
                Ok(Ok(())) => error!("Webhook server exited unexpectedly"),
            }
        }
        result = health_handle => {
            if let Err(e) = result {
                error!("Health server task panicked: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, shutting down");
            health_state.set_ready(false).await;
        }
    }

    info!("Webhook stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the webhook cannot shut
/// down gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
