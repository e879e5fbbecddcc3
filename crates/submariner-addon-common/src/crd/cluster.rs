//! ManagedCluster and ManagedClusterSet: the hub's view of registered clusters

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Spec for a ManagedCluster
///
/// The registration agent and the hub both write to ManagedClusters, so any
/// update from here must go through an optimistic read-modify-write.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "cluster.open-cluster-management.io",
    version = "v1",
    kind = "ManagedCluster",
    plural = "managedclusters",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSpec {
    /// Whether the hub accepts the cluster's registration
    #[serde(default)]
    pub hub_accepts_client: bool,

    /// Lease duration for the cluster's heartbeat
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_duration_seconds: Option<i32>,
}

/// Spec for a ManagedClusterSet
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "cluster.open-cluster-management.io",
    version = "v1beta2",
    kind = "ManagedClusterSet",
    plural = "managedclustersets",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSetSpec {
    /// How member clusters are selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_selector: Option<ClusterSelector>,
}

/// Cluster selection for a ManagedClusterSet
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSelector {
    /// Selection strategy
    #[serde(default)]
    pub selector_type: SelectorType,
}

/// ManagedClusterSet membership strategy
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum SelectorType {
    /// Clusters join via the `cluster.open-cluster-management.io/clusterset` label
    #[default]
    ExclusiveClusterSetLabel,
    /// Clusters are selected by a label selector
    LabelSelector,
}
