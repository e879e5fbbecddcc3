//! ManifestWork: a bundle of objects the hub dispatches to a managed cluster

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Spec for a ManifestWork, created in the managed cluster's hub namespace
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "work.open-cluster-management.io",
    version = "v1",
    kind = "ManifestWork",
    plural = "manifestworks",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ManifestWorkSpec {
    /// Objects to apply on the managed cluster
    #[serde(default)]
    pub workload: ManifestsTemplate,
}

/// The objects carried by a ManifestWork
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ManifestsTemplate {
    /// Raw Kubernetes manifests
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manifests: Vec<serde_json::Value>,
}
