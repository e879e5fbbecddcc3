//! Custom resource documents exchanged with the hub and managed clusters
//!
//! These CRDs are owned by Open Cluster Management and the Submariner
//! operator; the types here mirror their wire shape so that verification code
//! reads and writes exactly what the add-on controller does. Schema
//! generation is disabled because nothing here installs the CRDs.

mod addon;
mod cluster;
mod submariner;
mod work;

pub use addon::{ManagedClusterAddOn, ManagedClusterAddOnSpec};
pub use cluster::{
    ClusterSelector, ManagedCluster, ManagedClusterSet, ManagedClusterSetSpec,
    ManagedClusterSpec, SelectorType,
};
pub use submariner::{
    DaemonSetRolloutStatus, Submariner, SubmarinerSpec, SubmarinerStatus, SUBMARINER_API_VERSION,
    SUBMARINER_KIND,
};
pub use work::{ManifestWork, ManifestWorkSpec, ManifestsTemplate};
