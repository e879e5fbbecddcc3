//! Hub API seam
//!
//! Every query and mutation the toolkit issues goes through [`HubClient`], so
//! the oracle can run against a live hub through [`KubeHubClient`] or against
//! [`crate::fake::InMemoryHub`] in tests.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret, ServiceAccount};
use k8s_openapi::api::rbac::v1::Role;
use kube::api::{Api, PostParams};
use kube::{Client, ResourceExt};
use tracing::{debug, instrument};

#[cfg(test)]
use mockall::automock;

use submariner_addon_common::crd::{ManagedCluster, ManifestWork};
use submariner_addon_common::Error;

/// Trait abstracting the hub operations used by verification code
///
/// Gets return `Ok(None)` when the object does not exist; every other failure
/// is an `Err`. Creates report a taken name as an already-exists error and
/// replaces report a stale `resourceVersion` as a conflict error (see
/// [`Error::is_already_exists`] and [`Error::is_conflict`]).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HubClient: Send + Sync {
    /// Get a Namespace by name
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, Error>;

    /// Create a Namespace
    async fn create_namespace(&self, namespace: &Namespace) -> Result<Namespace, Error>;

    /// Get a Role by namespace and name
    async fn get_role(&self, namespace: &str, name: &str) -> Result<Option<Role>, Error>;

    /// Get a Secret by namespace and name
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, Error>;

    /// Create a Secret in `namespace`
    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, Error>;

    /// Get a ServiceAccount by namespace and name
    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccount>, Error>;

    /// Get a ManifestWork from a managed cluster's hub namespace
    async fn get_manifest_work(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ManifestWork>, Error>;

    /// Get a ManagedCluster by name
    async fn get_managed_cluster(&self, name: &str) -> Result<Option<ManagedCluster>, Error>;

    /// Replace a ManagedCluster, guarded by its `metadata.resourceVersion`
    async fn replace_managed_cluster(
        &self,
        cluster: &ManagedCluster,
    ) -> Result<ManagedCluster, Error>;
}

/// Real Kubernetes client implementation
#[derive(Clone)]
pub struct KubeHubClient {
    client: Client,
}

impl KubeHubClient {
    /// Create a new KubeHubClient wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HubClient for KubeHubClient {
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, Error> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?)
    }

    #[instrument(skip(self, namespace), fields(namespace = %namespace.name_any()))]
    async fn create_namespace(&self, namespace: &Namespace) -> Result<Namespace, Error> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let created = api.create(&PostParams::default(), namespace).await?;
        debug!("Created namespace");
        Ok(created)
    }

    async fn get_role(&self, namespace: &str, name: &str) -> Result<Option<Role>, Error> {
        let api: Api<Role> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, Error> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    #[instrument(skip(self, secret), fields(secret = %secret.name_any()))]
    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, Error> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let created = api.create(&PostParams::default(), secret).await?;
        debug!("Created secret");
        Ok(created)
    }

    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccount>, Error> {
        let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_manifest_work(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ManifestWork>, Error> {
        let api: Api<ManifestWork> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_managed_cluster(&self, name: &str) -> Result<Option<ManagedCluster>, Error> {
        let api: Api<ManagedCluster> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?)
    }

    #[instrument(skip(self, cluster), fields(cluster = %cluster.name_any()))]
    async fn replace_managed_cluster(
        &self,
        cluster: &ManagedCluster,
    ) -> Result<ManagedCluster, Error> {
        let api: Api<ManagedCluster> = Api::all(self.client.clone());
        let updated = api
            .replace(&cluster.name_any(), &PostParams::default(), cluster)
            .await?;
        debug!(
            resource_version = updated.metadata.resource_version.as_deref().unwrap_or_default(),
            "Replaced managed cluster"
        );
        Ok(updated)
    }
}
