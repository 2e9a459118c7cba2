//! Mock Service directory for functional tests.
//!
//! Instead of duplicating production logic, this mock builds real
//! `k8s_openapi` Service objects and runs them through the production
//! reduction (`host_aliases_from_services`). Only the network call is
//! simulated; the alias derivation under test is the real implementation.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{HostAlias, Service, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use hostalias_webhook::directory::host_aliases_from_services;
use hostalias_webhook::{Error, Result, ServiceDirectory};

/// A directory backed by an in-memory Service listing.
pub struct MockDirectory {
    services: Vec<Service>,
    fail_with: Option<String>,
}

impl MockDirectory {
    /// Directory serving the given Services
    pub fn with_services(services: Vec<Service>) -> Self {
        Self {
            services,
            fail_with: None,
        }
    }

    /// Empty directory
    pub fn empty() -> Self {
        Self::with_services(Vec::new())
    }

    /// Directory whose listing always fails
    pub fn failing(message: &str) -> Self {
        Self {
            services: Vec::new(),
            fail_with: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl ServiceDirectory for MockDirectory {
    async fn list_host_aliases(&self) -> Result<Vec<HostAlias>> {
        if let Some(message) = &self.fail_with {
            return Err(Error::DirectoryUnavailable(message.clone()));
        }
        Ok(host_aliases_from_services(&self.services))
    }
}

/// Build a Service with the given type and cluster IP
pub fn service(name: &str, namespace: &str, type_: &str, cluster_ip: Option<&str>) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some(type_.to_string()),
            cluster_ip: cluster_ip.map(str::to_string),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Shorthand for a routable ClusterIP Service
pub fn cluster_ip_service(name: &str, namespace: &str, ip: &str) -> Service {
    service(name, namespace, "ClusterIP", Some(ip))
}

/// Shorthand for a headless Service
pub fn headless_service(name: &str, namespace: &str) -> Service {
    service(name, namespace, "ClusterIP", Some("None"))
}
