//! End-to-end admission flow tests: AdmissionReview in, AdmissionReview out.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{HostAlias, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::json;

use hostalias_webhook::admission::{AdmissionRequest, AdmissionResponse, PatchType};
use hostalias_webhook::{FailurePolicy, PodMutator, ServiceDirectory, WebhookConfig};

use crate::mock_directory::{MockDirectory, cluster_ip_service, headless_service, service};

fn pod(labels: &[(&str, &str)]) -> Pod {
    let labels: BTreeMap<String, String> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Pod {
        metadata: ObjectMeta {
            name: Some("my-pod".to_string()),
            namespace: Some("default".to_string()),
            labels: if labels.is_empty() { None } else { Some(labels) },
            ..Default::default()
        },
        spec: Some(PodSpec::default()),
        ..Default::default()
    }
}

fn request(pod: &Pod) -> AdmissionRequest {
    AdmissionRequest {
        uid: "705ab4f5-6393-11e8-b7cc-42010a800002".to_string(),
        name: pod.metadata.name.clone(),
        namespace: pod.metadata.namespace.clone(),
        operation: Some("CREATE".to_string()),
        object: Some(serde_json::to_value(pod).expect("pod serializes")),
    }
}

async fn mutate<D: ServiceDirectory>(directory: D, pod: &Pod) -> AdmissionResponse {
    let mutator = PodMutator::new(directory, WebhookConfig::default());
    mutator.mutate(&request(pod)).await
}

fn patched_object(response: &AdmissionResponse, request: &AdmissionRequest) -> serde_json::Value {
    let patch: json_patch::Patch =
        serde_json::from_slice(response.patch.as_deref().expect("patch present")).unwrap();
    let mut doc = request.object.clone().unwrap();
    json_patch::patch(&mut doc, &patch).unwrap();
    doc
}

#[tokio::test]
async fn test_scenario_watched_pod_gets_db_alias() {
    let directory =
        MockDirectory::with_services(vec![cluster_ip_service("db", "prod", "10.0.0.5")]);
    let pod = pod(&[("k8s-app", "x")]);
    let req = request(&pod);

    let mutator = PodMutator::new(directory, WebhookConfig::default());
    let response = mutator.mutate(&req).await;

    assert_eq!(response.uid, req.uid);
    assert!(response.allowed);
    assert_eq!(response.patch_type, Some(PatchType::JsonPatch));

    let patched = patched_object(&response, &req);
    assert_eq!(
        patched["spec"]["hostAliases"],
        json!([{
            "ip": "10.0.0.5",
            "hostnames": ["db.prod.svc.cluster.local", "db.prod.svc", "db.prod"]
        }])
    );
}

#[tokio::test]
async fn test_unwatched_pod_passes_through() {
    let directory =
        MockDirectory::with_services(vec![cluster_ip_service("db", "prod", "10.0.0.5")]);
    let response = mutate(directory, &pod(&[("app", "web")])).await;

    assert!(response.allowed);
    assert!(response.patch.is_none());
    assert!(response.patch_type.is_none());
    assert_eq!(response.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
}

#[tokio::test]
async fn test_empty_directory_allows_unchanged() {
    let response = mutate(MockDirectory::empty(), &pod(&[("k8s-app", "x")])).await;

    assert!(response.allowed);
    assert!(response.patch.is_none());
}

#[tokio::test]
async fn test_headless_service_contributes_nothing() {
    let directory = MockDirectory::with_services(vec![headless_service("peers", "prod")]);
    let response = mutate(directory, &pod(&[("k8s-app", "x")])).await;

    assert!(response.allowed);
    assert!(response.patch.is_none());
    assert!(response.patch_type.is_none());
}

#[tokio::test]
async fn test_mixed_directory_only_routable_cluster_ips_alias() {
    let directory = MockDirectory::with_services(vec![
        cluster_ip_service("db", "prod", "10.0.0.5"),
        headless_service("peers", "prod"),
        service("ingress", "infra", "LoadBalancer", Some("10.0.0.6")),
        service("nodes", "infra", "NodePort", Some("10.0.0.7")),
        cluster_ip_service("cache", "prod", "10.0.0.8"),
    ]);
    let pod = pod(&[("k8s-app", "x")]);
    let req = request(&pod);

    let mutator = PodMutator::new(directory, WebhookConfig::default());
    let response = mutator.mutate(&req).await;
    assert!(response.allowed);

    let patched = patched_object(&response, &req);
    let aliases = patched["spec"]["hostAliases"].as_array().unwrap();
    assert_eq!(aliases.len(), 2);
    assert_eq!(aliases[0]["ip"], "10.0.0.5");
    assert_eq!(aliases[1]["ip"], "10.0.0.8");
}

#[tokio::test]
async fn test_directory_failure_fail_open() {
    let directory = MockDirectory::failing("connection refused");
    let response = mutate(directory, &pod(&[("k8s-app", "x")])).await;

    assert!(response.allowed);
    assert!(response.patch.is_none());
    assert!(!response.warnings.is_empty());
    assert!(response.warnings[0].contains("connection refused"));
}

#[tokio::test]
async fn test_directory_failure_fail_closed() {
    let config = WebhookConfig {
        failure_policy: FailurePolicy::Closed,
        ..Default::default()
    };
    let mutator = PodMutator::new(MockDirectory::failing("connection refused"), config);
    let response = mutator.mutate(&request(&pod(&[("k8s-app", "x")]))).await;

    assert!(!response.allowed);
    let status = response.status.unwrap();
    assert_eq!(status.code, Some(500));
    assert!(status.message.unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_uid_preserved_on_every_shape() {
    let uid = "705ab4f5-6393-11e8-b7cc-42010a800002";

    // patched
    let directory =
        MockDirectory::with_services(vec![cluster_ip_service("db", "prod", "10.0.0.5")]);
    assert_eq!(mutate(directory, &pod(&[("k8s-app", "x")])).await.uid, uid);

    // unchanged
    assert_eq!(mutate(MockDirectory::empty(), &pod(&[])).await.uid, uid);

    // warned
    let directory = MockDirectory::failing("boom");
    assert_eq!(mutate(directory, &pod(&[("k8s-app", "x")])).await.uid, uid);

    // denied
    let config = WebhookConfig {
        failure_policy: FailurePolicy::Closed,
        ..Default::default()
    };
    let mutator = PodMutator::new(MockDirectory::failing("boom"), config);
    let response = mutator.mutate(&request(&pod(&[("k8s-app", "x")]))).await;
    assert_eq!(response.uid, uid);
}

#[tokio::test]
async fn test_patch_application_is_idempotent_with_dedupe() {
    let config = WebhookConfig {
        dedupe_aliases: true,
        ..Default::default()
    };
    let directory =
        MockDirectory::with_services(vec![cluster_ip_service("db", "prod", "10.0.0.5")]);
    let mutator = PodMutator::new(directory, config);

    // First admission mutates
    let pod1 = pod(&[("k8s-app", "x")]);
    let req1 = request(&pod1);
    let response1 = mutator.mutate(&req1).await;
    assert!(response1.patch.is_some());

    // Resubmit the mutated Pod; the alias is already present
    let mut pod2 = pod1.clone();
    pod2.spec.as_mut().unwrap().host_aliases = Some(vec![HostAlias {
        ip: "10.0.0.5".to_string(),
        hostnames: Some(vec![
            "db.prod.svc.cluster.local".to_string(),
            "db.prod.svc".to_string(),
            "db.prod".to_string(),
        ]),
    }]);
    let response2 = mutator.mutate(&request(&pod2)).await;
    assert!(response2.allowed);
    assert!(response2.patch.is_none());
}

#[tokio::test]
async fn test_review_envelope_roundtrip() {
    // Decode a wire-shaped AdmissionReview, run the mutation, and check
    // the response envelope the API server would receive.
    let pod = pod(&[("k8s-app", "x")]);
    let body = json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "review-uid",
            "namespace": "default",
            "operation": "CREATE",
            "object": serde_json::to_value(&pod).unwrap(),
        }
    });

    let review: hostalias_webhook::admission::AdmissionReview =
        serde_json::from_value(body).unwrap();
    let req = review.request.unwrap();

    let directory =
        MockDirectory::with_services(vec![cluster_ip_service("db", "prod", "10.0.0.5")]);
    let mutator = PodMutator::new(directory, WebhookConfig::default());
    let response = mutator.mutate(&req).await;

    let envelope = serde_json::to_value(response.into_review()).unwrap();
    assert_eq!(envelope["apiVersion"], "admission.k8s.io/v1");
    assert_eq!(envelope["kind"], "AdmissionReview");
    assert_eq!(envelope["response"]["uid"], "review-uid");
    assert_eq!(envelope["response"]["allowed"], true);
    assert_eq!(envelope["response"]["patchType"], "JSONPatch");
    assert!(envelope["response"]["patch"].is_string());
    assert!(envelope["request"].is_null());
}
