//! ManagedClusterAddOn: the per-cluster record that enables an add-on

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Spec for a ManagedClusterAddOn, created in the managed cluster's hub namespace
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "addon.open-cluster-management.io",
    version = "v1alpha1",
    kind = "ManagedClusterAddOn",
    plural = "managedclusteraddons",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterAddOnSpec {
    /// Namespace on the managed cluster the add-on agent is deployed into
    #[serde(default)]
    pub install_namespace: String,
}
