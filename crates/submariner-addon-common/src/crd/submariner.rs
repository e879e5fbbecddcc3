//! Submariner custom resource
//!
//! The add-on controller renders one `Submariner` per managed cluster and the
//! Submariner operator reports rollout progress back in its status. Field
//! names are part of the contract with the operator, so every key is spelled
//! out explicitly rather than derived from the Rust field name.

use k8s_openapi::api::apps::v1::DaemonSetStatus;
use kube::api::DynamicObject;
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

use crate::Error;

/// apiVersion of the Submariner CRD
pub const SUBMARINER_API_VERSION: &str = "submariner.io/v1alpha1";

/// kind of the Submariner CRD
pub const SUBMARINER_KIND: &str = "Submariner";

/// Desired Submariner deployment on a managed cluster
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "submariner.io",
    version = "v1alpha1",
    kind = "Submariner",
    plural = "submariners",
    namespaced,
    status = "SubmarinerStatus",
    schema = "disabled"
)]
pub struct SubmarinerSpec {
    /// Broker type (always "k8s")
    pub broker: String,
    /// Broker cluster API server endpoint
    #[serde(rename = "brokerK8sApiServer")]
    pub broker_k8s_api_server: String,
    /// Token used to access the broker
    #[serde(rename = "brokerK8sApiServerToken")]
    pub broker_k8s_api_server_token: String,
    /// Broker CA bundle
    #[serde(rename = "brokerK8sCA")]
    pub broker_k8s_ca: String,
    /// Namespace on the broker holding this cluster's resources
    #[serde(rename = "brokerK8sRemoteNamespace")]
    pub broker_k8s_remote_namespace: String,
    /// Cable driver (libreswan, wireguard, vxlan)
    #[serde(rename = "cableDriver")]
    pub cable_driver: String,
    /// Enable IPsec debug logging
    #[serde(rename = "ceIPSecDebug")]
    pub ce_ipsec_debug: bool,
    /// IPsec pre-shared key
    #[serde(rename = "ceIPSecPSK")]
    pub ce_ipsec_psk: String,
    /// Pod CIDR override (empty = discovered)
    #[serde(rename = "clusterCIDR")]
    pub cluster_cidr: String,
    /// Cluster identifier within the cluster set
    #[serde(rename = "clusterID")]
    pub cluster_id: String,
    /// Enable debug logging
    pub debug: bool,
    /// Namespace the Submariner components run in
    pub namespace: String,
    /// Whether clusters connect through NAT
    #[serde(rename = "natEnabled")]
    pub nat_enabled: bool,
    /// Service CIDR override (empty = discovered)
    #[serde(rename = "serviceCIDR")]
    pub service_cidr: String,
}

/// Rollout progress reported by the Submariner operator
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SubmarinerStatus {
    /// Cluster identifier echoed back by the operator
    #[serde(rename = "clusterID", default)]
    pub cluster_id: String,
    /// Whether NAT is in use
    #[serde(rename = "natEnabled", default)]
    pub nat_enabled: bool,
    /// Gateway daemon set rollout
    #[serde(
        rename = "gatewayDaemonSetStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub gateway_daemon_set_status: Option<DaemonSetRolloutStatus>,
    /// Route agent daemon set rollout
    #[serde(
        rename = "routeAgentDaemonSetStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub route_agent_daemon_set_status: Option<DaemonSetRolloutStatus>,
}

/// Status of one Submariner daemon set
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DaemonSetRolloutStatus {
    /// Whether running pods use a different image than desired
    #[serde(rename = "mismatchedContainerImages", default)]
    pub mismatched_container_images: bool,
    /// Scheduling counters copied from the daemon set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DaemonSetStatus>,
}

impl DaemonSetRolloutStatus {
    /// Every desired pod is scheduled, ready, and on the right image
    pub fn is_rolled_out(&self) -> bool {
        let Some(status) = &self.status else {
            return false;
        };
        !self.mismatched_container_images
            && status.number_misscheduled == 0
            && status.current_number_scheduled == status.desired_number_scheduled
            && status.number_ready == status.desired_number_scheduled
    }
}

impl Submariner {
    /// Broker API server endpoint
    pub fn broker_endpoint(&self) -> &str {
        &self.spec.broker_k8s_api_server
    }

    /// Cluster identifier
    pub fn cluster_id(&self) -> &str {
        &self.spec.cluster_id
    }

    /// Configured cable driver
    pub fn cable_driver(&self) -> &str {
        &self.spec.cable_driver
    }

    /// Gateway rollout, if the operator has reported one
    pub fn gateway_rollout(&self) -> Option<&DaemonSetRolloutStatus> {
        self.status
            .as_ref()
            .and_then(|s| s.gateway_daemon_set_status.as_ref())
    }

    /// Route agent rollout, if the operator has reported one
    pub fn route_agent_rollout(&self) -> Option<&DaemonSetRolloutStatus> {
        self.status
            .as_ref()
            .and_then(|s| s.route_agent_daemon_set_status.as_ref())
    }

    /// Both daemon sets are fully rolled out
    pub fn is_deployed(&self) -> bool {
        self.gateway_rollout().is_some_and(|g| g.is_rolled_out())
            && self.route_agent_rollout().is_some_and(|r| r.is_rolled_out())
    }

    /// Validate the fields the operator cannot default
    pub fn validate(&self) -> Result<(), Error> {
        let resource = format!("{}/{}", SUBMARINER_KIND, self.name_any());
        if self.spec.cluster_id.is_empty() {
            return Err(Error::validation_for_field(
                resource,
                "spec.clusterID",
                "cluster ID cannot be empty",
            ));
        }
        if self.spec.cable_driver.is_empty() {
            return Err(Error::validation_for_field(
                resource,
                "spec.cableDriver",
                "cable driver cannot be empty",
            ));
        }
        Ok(())
    }

    /// Parse and validate a generic document fetched through the dynamic API
    pub fn from_dynamic(obj: DynamicObject) -> Result<Self, Error> {
        let name = obj.name_any();
        let types = obj.types.as_ref().ok_or_else(|| {
            Error::validation(format!("{SUBMARINER_KIND}/{name}"), "missing apiVersion/kind")
        })?;
        if types.api_version != SUBMARINER_API_VERSION {
            return Err(Error::validation_for_field(
                format!("{SUBMARINER_KIND}/{name}"),
                "apiVersion",
                format!("expected {SUBMARINER_API_VERSION}, got {}", types.api_version),
            ));
        }
        if types.kind != SUBMARINER_KIND {
            return Err(Error::validation_for_field(
                format!("{SUBMARINER_KIND}/{name}"),
                "kind",
                format!("expected {SUBMARINER_KIND}, got {}", types.kind),
            ));
        }

        let value = serde_json::to_value(&obj)
            .map_err(|e| Error::serialization_for_kind(SUBMARINER_KIND, e.to_string()))?;
        let submariner: Submariner = serde_json::from_value(value)
            .map_err(|e| Error::serialization_for_kind(SUBMARINER_KIND, e.to_string()))?;
        submariner.validate()?;
        Ok(submariner)
    }

    /// Render as a generic document for the dynamic API
    pub fn to_dynamic(&self) -> Result<DynamicObject, Error> {
        let value = serde_json::to_value(self)
            .map_err(|e| Error::serialization_for_kind(SUBMARINER_KIND, e.to_string()))?;
        serde_json::from_value(value)
            .map_err(|e| Error::serialization_for_kind(SUBMARINER_KIND, e.to_string()))
    }
}
