//! Canonical desired-state objects
//!
//! Pure constructors: no I/O, and the same inputs always give the same
//! object. Only identity fields are populated, except for the Submariner
//! resource which carries a fixed representative spec.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::DaemonSetStatus;
use k8s_openapi::api::core::v1::{Namespace, Secret, ServiceAccount};
use k8s_openapi::api::rbac::v1::Role;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;

use submariner_addon_common::crd::{
    DaemonSetRolloutStatus, ManagedCluster, ManagedClusterAddOn, ManagedClusterAddOnSpec,
    ManagedClusterSet, ManagedClusterSetSpec, ManagedClusterSpec, ManifestWork,
    ManifestWorkSpec, Submariner, SubmarinerSpec, SubmarinerStatus,
};
use submariner_addon_common::{
    ADDON_NAME, BROKER_ROLE_NAME, INSTALLATION_NAMESPACE, IPSEC_PSK_SECRET_NAME,
    SERVICE_ACCOUNT_NAME_ANNOTATION, SERVICE_ACCOUNT_TOKEN_SECRET_TYPE,
};

/// Cluster ID used by the representative Submariner spec and status
pub const TEST_CLUSTER_ID: &str = "test";

/// CA bundle stored in generated token secrets
pub const TEST_CA: &[u8] = b"test-ca";

/// Token stored in generated token secrets
pub const TEST_TOKEN: &[u8] = b"test-token";

fn named(name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn namespaced(namespace: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

/// Namespace with only a name
pub fn new_namespace(name: &str) -> Namespace {
    Namespace {
        metadata: named(name),
        ..Default::default()
    }
}

/// ManagedCluster with the given labels
pub fn new_managed_cluster(name: &str, labels: BTreeMap<String, String>) -> ManagedCluster {
    let mut cluster = ManagedCluster::new(name, ManagedClusterSpec::default());
    if !labels.is_empty() {
        cluster.metadata.labels = Some(labels);
    }
    cluster
}

/// ManagedClusterSet with only a name
pub fn new_managed_cluster_set(name: &str) -> ManagedClusterSet {
    ManagedClusterSet::new(name, ManagedClusterSetSpec::default())
}

/// The Submariner ManagedClusterAddOn for the cluster whose hub namespace is `namespace`
pub fn new_managed_cluster_addon(namespace: &str) -> ManagedClusterAddOn {
    let mut addon = ManagedClusterAddOn::new(
        ADDON_NAME,
        ManagedClusterAddOnSpec {
            install_namespace: INSTALLATION_NAMESPACE.to_string(),
        },
    );
    addon.metadata.namespace = Some(namespace.to_string());
    addon
}

/// Submariner resource with a fixed representative spec and no status
pub fn new_submariner(name: &str) -> Submariner {
    Submariner::new(
        name,
        SubmarinerSpec {
            broker: "k8s".to_string(),
            broker_k8s_api_server: "api:6443".to_string(),
            broker_k8s_api_server_token: "token".to_string(),
            broker_k8s_ca: "ca".to_string(),
            broker_k8s_remote_namespace: "subm-broker".to_string(),
            cable_driver: "libreswan".to_string(),
            ce_ipsec_debug: false,
            ce_ipsec_psk: "psk".to_string(),
            cluster_cidr: String::new(),
            cluster_id: TEST_CLUSTER_ID.to_string(),
            debug: false,
            namespace: INSTALLATION_NAMESPACE.to_string(),
            nat_enabled: true,
            service_cidr: String::new(),
        },
    )
}

fn rollout(scheduled: i32) -> DaemonSetRolloutStatus {
    DaemonSetRolloutStatus {
        mismatched_container_images: false,
        status: Some(DaemonSetStatus {
            current_number_scheduled: scheduled,
            desired_number_scheduled: scheduled,
            number_misscheduled: 0,
            number_ready: scheduled,
            ..Default::default()
        }),
    }
}

/// Attach the status the Submariner operator reports after a full rollout
///
/// Gateway daemon set 1/1/0/1, route agent daemon set 6/6/0/6, no image
/// mismatch.
pub fn set_submariner_deployed_status(submariner: &mut Submariner) {
    submariner.status = Some(SubmarinerStatus {
        cluster_id: TEST_CLUSTER_ID.to_string(),
        nat_enabled: true,
        gateway_daemon_set_status: Some(rollout(1)),
        route_agent_daemon_set_status: Some(rollout(6)),
    });
}

/// ServiceAccount with only namespace and name
pub fn new_service_account(namespace: &str, name: &str) -> ServiceAccount {
    ServiceAccount {
        metadata: namespaced(namespace, name),
        ..Default::default()
    }
}

/// The broker role the controller creates in a broker namespace
pub fn new_broker_role(namespace: &str) -> Role {
    Role {
        metadata: namespaced(namespace, BROKER_ROLE_NAME),
        ..Default::default()
    }
}

/// The IPsec PSK secret the controller creates in a broker namespace
pub fn new_ipsec_psk_secret(namespace: &str) -> Secret {
    Secret {
        metadata: namespaced(namespace, IPSEC_PSK_SECRET_NAME),
        ..Default::default()
    }
}

/// ManifestWork with only namespace and name
pub fn new_manifest_work(namespace: &str, name: &str) -> ManifestWork {
    let mut work = ManifestWork::new(name, ManifestWorkSpec::default());
    work.metadata.namespace = Some(namespace.to_string());
    work
}

/// Token secret for `service_account`, named `secret_name`
pub fn new_token_secret(namespace: &str, service_account: &str, secret_name: &str) -> Secret {
    let mut metadata = namespaced(namespace, secret_name);
    metadata.annotations = Some(BTreeMap::from([(
        SERVICE_ACCOUNT_NAME_ANNOTATION.to_string(),
        service_account.to_string(),
    )]));

    Secret {
        metadata,
        data: Some(BTreeMap::from([
            ("ca.crt".to_string(), ByteString(TEST_CA.to_vec())),
            ("token".to_string(), ByteString(TEST_TOKEN.to_vec())),
        ])),
        type_: Some(SERVICE_ACCOUNT_TOKEN_SECRET_TYPE.to_string()),
        ..Default::default()
    }
}
