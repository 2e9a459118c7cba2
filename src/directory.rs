//! Service directory: reduces the cluster's Service inventory to host
//! aliases.
//!
//! Each qualifying ClusterIP Service yields one alias mapping its cluster
//! IP to the three DNS names a Pod would normally resolve through
//! cluster DNS:
//! - `name.namespace.svc.cluster.local`
//! - `name.namespace.svc`
//! - `name.namespace`
//!
//! Headless Services (clusterIP absent, empty, or `"None"`) and
//! non-ClusterIP Services have no stable virtual address and contribute
//! nothing.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{HostAlias, Service};
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};
use tracing::debug;

use crate::error::{Error, Result};

/// Service type that carries a routable cluster IP
const SERVICE_TYPE_CLUSTER_IP: &str = "ClusterIP";
/// Sentinel clusterIP value for headless Services
const CLUSTER_IP_NONE: &str = "None";

/// Read-only access to the cluster's Service inventory.
///
/// Injected into the mutation orchestrator at construction time; tests
/// substitute a mock, production uses [`KubeServiceDirectory`].
#[async_trait]
pub trait ServiceDirectory: Send + Sync {
    /// List all Services cluster-wide and reduce them to host aliases.
    ///
    /// Result order follows the listing order. An empty cluster or zero
    /// qualifying Services yields an empty Vec, not an error.
    async fn list_host_aliases(&self) -> Result<Vec<HostAlias>>;
}

/// Derive the host alias for a single Service, if it qualifies
pub fn service_host_alias(service: &Service) -> Option<HostAlias> {
    let spec = service.spec.as_ref()?;
    if spec.type_.as_deref() != Some(SERVICE_TYPE_CLUSTER_IP) {
        return None;
    }
    let cluster_ip = spec
        .cluster_ip
        .as_deref()
        .filter(|ip| !ip.is_empty() && *ip != CLUSTER_IP_NONE)?;

    let name = service.name_any();
    let namespace = service.namespace()?;

    Some(HostAlias {
        ip: cluster_ip.to_string(),
        hostnames: Some(vec![
            format!("{name}.{namespace}.svc.cluster.local"),
            format!("{name}.{namespace}.svc"),
            format!("{name}.{namespace}"),
        ]),
    })
}

/// Reduce a Service listing to host aliases, preserving listing order
pub fn host_aliases_from_services<'a, I>(services: I) -> Vec<HostAlias>
where
    I: IntoIterator<Item = &'a Service>,
{
    services.into_iter().filter_map(service_host_alias).collect()
}

/// Directory backed by the Kubernetes API (one cluster-wide list call
/// per admission request, no caching).
#[derive(Clone)]
pub struct KubeServiceDirectory {
    services: Api<Service>,
}

impl KubeServiceDirectory {
    pub fn new(client: Client) -> Self {
        Self {
            services: Api::all(client),
        }
    }
}

#[async_trait]
impl ServiceDirectory for KubeServiceDirectory {
    async fn list_host_aliases(&self) -> Result<Vec<HostAlias>> {
        let services = self
            .services
            .list(&ListParams::default())
            .await
            .map_err(|e| Error::DirectoryUnavailable(e.to_string()))?;

        let aliases = host_aliases_from_services(&services.items);
        debug!(
            services = services.items.len(),
            aliases = aliases.len(),
            "Reduced Service listing to host aliases"
        );
        Ok(aliases)
    }
}
