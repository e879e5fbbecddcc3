//! Common types for the Submariner add-on: CRD documents, errors, and the
//! retry/poll primitives shared by verification code.

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod events;
pub mod kube_utils;
pub mod retry;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Canonical name of the Submariner `ManagedClusterAddOn`
pub const ADDON_NAME: &str = "submariner";

/// Namespace the add-on agent is installed into on managed clusters
pub const INSTALLATION_NAMESPACE: &str = "submariner-operator";

/// Role the controller creates in each broker namespace
pub const BROKER_ROLE_NAME: &str = "submariner-k8s-broker-cluster";

/// IPsec pre-shared key secret the controller creates in each broker namespace
pub const IPSEC_PSK_SECRET_NAME: &str = "submariner-ipsec-psk";

/// File mounted into pods that holds the pod's namespace
pub const SERVICE_ACCOUNT_NAMESPACE_FILE: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Annotation linking a token secret to its service account
pub const SERVICE_ACCOUNT_NAME_ANNOTATION: &str = "kubernetes.io/service-account.name";

/// Secret type for service account token secrets
pub const SERVICE_ACCOUNT_TOKEN_SECRET_TYPE: &str = "kubernetes.io/service-account-token";
