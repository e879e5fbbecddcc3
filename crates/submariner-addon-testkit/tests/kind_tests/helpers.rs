//! Test helpers for kind integration tests
//!
//! Provides the kind cluster, a client connected to it, and setup for the
//! objects the add-on controller would normally create.

use std::process::Command;
use std::sync::OnceLock;

use k8s_openapi::api::core::v1::{Namespace, Secret, ServiceAccount};
use k8s_openapi::api::rbac::v1::Role;
use kube::api::{Api, DeleteParams, PostParams};
use kube::{Client, Config};

use submariner_addon_testkit::fixtures::{
    new_broker_role, new_ipsec_psk_secret, new_namespace, new_service_account,
};
use submariner_addon_testkit::token::random_suffix;
use submariner_addon_testkit::KubeHubClient;

/// Name of the kind cluster used for integration tests
pub const TEST_CLUSTER_NAME: &str = "submariner-addon-test";

/// Global lock to ensure cluster is created only once
static CLUSTER_INIT: OnceLock<Result<(), String>> = OnceLock::new();

fn run_kind(args: &[&str]) -> Result<std::process::Output, String> {
    Command::new("kind")
        .args(args)
        .output()
        .map_err(|e| format!("kind {}: {e}", args.join(" ")))
}

/// Bring up the named kind cluster unless `kind get clusters` already lists it
pub fn ensure_kind_cluster(name: &str) -> Result<(), String> {
    let listed = run_kind(&["get", "clusters"])?;
    if String::from_utf8_lossy(&listed.stdout)
        .lines()
        .any(|line| line.trim() == name)
    {
        return Ok(());
    }

    let created = run_kind(&["create", "cluster", "--name", name, "--wait", "90s"])?;
    if created.status.success() {
        Ok(())
    } else {
        Err(format!(
            "kind cluster {name} did not come up: {}",
            String::from_utf8_lossy(&created.stderr).trim()
        ))
    }
}

/// Create a Kubernetes client connected to the test cluster
pub async fn create_test_client() -> Result<Client, String> {
    let context_name = format!("kind-{TEST_CLUSTER_NAME}");

    let config = Config::from_kubeconfig(&kube::config::KubeConfigOptions {
        context: Some(context_name),
        ..Default::default()
    })
    .await
    .map_err(|e| format!("failed to load kubeconfig: {e}"))?;

    Client::try_from(config).map_err(|e| format!("failed to create client: {e}"))
}

/// Ensure the test cluster is ready (thread-safe, cluster created once)
///
/// Returns a fresh Client for each call - clients should not be shared across test threads.
pub async fn ensure_test_cluster() -> Result<Client, String> {
    submariner_addon_common::telemetry::init_test_logging();

    let cluster_result = CLUSTER_INIT.get_or_init(|| ensure_kind_cluster(TEST_CLUSTER_NAME));
    cluster_result.clone()?;

    create_test_client().await
}

/// Client plus the toolkit's hub seam over it
pub async fn test_hub() -> (Client, KubeHubClient) {
    let client = ensure_test_cluster()
        .await
        .expect("test cluster should be available");
    let hub = KubeHubClient::new(client.clone());
    (client, hub)
}

/// Namespace name unique to one test run
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", random_suffix(6))
}

/// Create a namespace, as the controller does for a broker
pub async fn create_namespace(client: &Client, name: &str) {
    let api: Api<Namespace> = Api::all(client.clone());
    api.create(&PostParams::default(), &new_namespace(name))
        .await
        .expect("create namespace");
}

/// Create the broker role and IPsec PSK secret in `namespace`
pub async fn create_broker_contents(client: &Client, namespace: &str) {
    let roles: Api<Role> = Api::namespaced(client.clone(), namespace);
    roles
        .create(&PostParams::default(), &new_broker_role(namespace))
        .await
        .expect("create broker role");

    let mut psk = new_ipsec_psk_secret(namespace);
    psk.string_data = Some([("psk".to_string(), "secret".to_string())].into());
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    secrets
        .create(&PostParams::default(), &psk)
        .await
        .expect("create IPsec PSK secret");
}

/// Create a service account in `namespace`
pub async fn create_service_account(client: &Client, namespace: &str, name: &str) {
    let api: Api<ServiceAccount> = Api::namespaced(client.clone(), namespace);
    api.create(&PostParams::default(), &new_service_account(namespace, name))
        .await
        .expect("create service account");
}

/// Start deleting a namespace without waiting for it to go away
pub async fn delete_namespace(client: &Client, name: &str) {
    let api: Api<Namespace> = Api::all(client.clone());
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => {}
        Err(kube::Error::Api(e)) if e.code == 404 => {}
        Err(e) => panic!("failed to delete namespace {name}: {e}"),
    }
}
