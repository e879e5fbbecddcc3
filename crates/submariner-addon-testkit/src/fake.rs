//! In-memory hub for exercising the toolkit without a cluster
//!
//! [`InMemoryHub`] keeps typed objects in maps and reproduces the apiserver
//! behaviours the toolkit depends on: not-found on missing objects,
//! already-exists on duplicate creates, resourceVersion-guarded replaces, and
//! namespaces lingering in `Terminating`. Test code can also play the part of
//! a concurrent controller (`touch_managed_cluster`, `conflict_next_replaces`)
//! and inject one-shot API failures (`fail_next`).

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, NamespaceStatus, Secret, ServiceAccount};
use k8s_openapi::api::rbac::v1::Role;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use parking_lot::Mutex;
use tracing::trace;

use submariner_addon_common::crd::{ManagedCluster, ManifestWork};
use submariner_addon_common::kube_utils::{is_namespace_terminating, NAMESPACE_TERMINATING};
use submariner_addon_common::Error;

use crate::client::HubClient;

/// Phase the apiserver assigns to live namespaces
const NAMESPACE_ACTIVE: &str = "Active";

/// Hub operations, used for call counting and fault injection
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    /// [`HubClient::get_namespace`]
    GetNamespace,
    /// [`HubClient::create_namespace`]
    CreateNamespace,
    /// [`HubClient::get_role`]
    GetRole,
    /// [`HubClient::get_secret`]
    GetSecret,
    /// [`HubClient::create_secret`]
    CreateSecret,
    /// [`HubClient::get_service_account`]
    GetServiceAccount,
    /// [`HubClient::get_manifest_work`]
    GetManifestWork,
    /// [`HubClient::get_managed_cluster`]
    GetManagedCluster,
    /// [`HubClient::replace_managed_cluster`]
    ReplaceManagedCluster,
}

#[derive(Clone, Debug)]
struct Fault {
    code: u16,
    reason: String,
}

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

#[derive(Default)]
struct State {
    resource_version: u64,
    namespaces: BTreeMap<String, Namespace>,
    roles: BTreeMap<Key, Role>,
    secrets: BTreeMap<Key, Secret>,
    service_accounts: BTreeMap<Key, ServiceAccount>,
    manifest_works: BTreeMap<Key, ManifestWork>,
    managed_clusters: BTreeMap<String, ManagedCluster>,
    calls: BTreeMap<Operation, usize>,
    faults: BTreeMap<Operation, VecDeque<Fault>>,
    pending_conflicts: usize,
}

impl State {
    fn next_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    fn stamp(&mut self, meta: &mut ObjectMeta, namespace: Option<&str>) {
        if let Some(ns) = namespace {
            meta.namespace = Some(ns.to_string());
        }
        meta.resource_version = Some(self.next_version());
    }

    /// Count the call and fire any queued fault for it
    fn enter(&mut self, op: Operation) -> Result<(), Error> {
        *self.calls.entry(op).or_default() += 1;
        if let Some(fault) = self.faults.get_mut(&op).and_then(VecDeque::pop_front) {
            trace!(?op, code = fault.code, "Injecting fault");
            return Err(Error::api(
                fault.code,
                fault.reason.clone(),
                format!("injected {} for {op:?}", fault.reason),
            ));
        }
        Ok(())
    }

    fn writable_namespace(&self, namespace: &str) -> Result<(), Error> {
        match self.namespaces.get(namespace) {
            None => Err(Error::not_found("namespaces", namespace)),
            Some(ns) if is_namespace_terminating(ns) => Err(Error::api(
                403,
                "Forbidden",
                format!(
                    "unable to create new content in namespace {namespace} because it is being terminated"
                ),
            )),
            Some(_) => Ok(()),
        }
    }
}

/// In-memory [`HubClient`]; clones share the same store
#[derive(Clone, Default)]
pub struct InMemoryHub {
    state: Arc<Mutex<State>>,
}

impl InMemoryHub {
    /// Empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `op` has been called
    pub fn calls(&self, op: Operation) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Fail the next call to `op` with an API error of the given code/reason
    pub fn fail_next(&self, op: Operation, code: u16, reason: &str) {
        self.state
            .lock()
            .faults
            .entry(op)
            .or_default()
            .push_back(Fault {
                code,
                reason: reason.to_string(),
            });
    }

    /// Make the next `n` replaces lose a race with another writer
    ///
    /// Each affected replace first bumps the stored record's
    /// resourceVersion, as a concurrent controller update would.
    pub fn conflict_next_replaces(&self, n: usize) {
        self.state.lock().pending_conflicts = n;
    }

    /// Store a namespace, defaulting its phase to Active
    pub fn insert_namespace(&self, mut namespace: Namespace) {
        let mut state = self.state.lock();
        state.stamp(&mut namespace.metadata, None);
        if namespace.status.as_ref().and_then(|s| s.phase.as_ref()).is_none() {
            namespace.status = Some(NamespaceStatus {
                phase: Some(NAMESPACE_ACTIVE.to_string()),
                ..Default::default()
            });
        }
        state.namespaces.insert(namespace.name_any(), namespace);
    }

    /// Begin deleting a namespace; its contents stay until [`Self::remove_namespace`]
    pub fn mark_namespace_terminating(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let version = state.next_version();
        match state.namespaces.get_mut(name) {
            Some(ns) => {
                ns.metadata.resource_version = Some(version);
                ns.status = Some(NamespaceStatus {
                    phase: Some(NAMESPACE_TERMINATING.to_string()),
                    ..Default::default()
                });
                true
            }
            None => false,
        }
    }

    /// Finish deleting a namespace together with everything in it
    pub fn remove_namespace(&self, name: &str) {
        let mut state = self.state.lock();
        state.namespaces.remove(name);
        state.roles.retain(|(ns, _), _| ns != name);
        state.secrets.retain(|(ns, _), _| ns != name);
        state.service_accounts.retain(|(ns, _), _| ns != name);
        state.manifest_works.retain(|(ns, _), _| ns != name);
    }

    /// Store a role in `namespace`
    pub fn insert_role(&self, namespace: &str, mut role: Role) {
        let mut state = self.state.lock();
        state.stamp(&mut role.metadata, Some(namespace));
        state.roles.insert(key(namespace, &role.name_any()), role);
    }

    /// Store a secret in `namespace`
    pub fn insert_secret(&self, namespace: &str, mut secret: Secret) {
        let mut state = self.state.lock();
        state.stamp(&mut secret.metadata, Some(namespace));
        state.secrets.insert(key(namespace, &secret.name_any()), secret);
    }

    /// Store a service account in `namespace`
    pub fn insert_service_account(&self, namespace: &str, mut account: ServiceAccount) {
        let mut state = self.state.lock();
        state.stamp(&mut account.metadata, Some(namespace));
        state
            .service_accounts
            .insert(key(namespace, &account.name_any()), account);
    }

    /// Store a manifest work in `namespace`
    pub fn insert_manifest_work(&self, namespace: &str, mut work: ManifestWork) {
        let mut state = self.state.lock();
        state.stamp(&mut work.metadata, Some(namespace));
        state
            .manifest_works
            .insert(key(namespace, &work.name_any()), work);
    }

    /// Store a managed cluster
    pub fn insert_managed_cluster(&self, mut cluster: ManagedCluster) {
        let mut state = self.state.lock();
        state.stamp(&mut cluster.metadata, None);
        state.managed_clusters.insert(cluster.name_any(), cluster);
    }

    /// Delete a manifest work, returning whether it existed
    pub fn delete_manifest_work(&self, namespace: &str, name: &str) -> bool {
        self.state
            .lock()
            .manifest_works
            .remove(&key(namespace, name))
            .is_some()
    }

    /// Current copy of a managed cluster
    pub fn managed_cluster(&self, name: &str) -> Option<ManagedCluster> {
        self.state.lock().managed_clusters.get(name).cloned()
    }

    /// Mutate a managed cluster as another controller would, bumping its version
    pub fn touch_managed_cluster(&self, name: &str, f: impl FnOnce(&mut ManagedCluster)) -> bool {
        let mut state = self.state.lock();
        let version = state.next_version();
        match state.managed_clusters.get_mut(name) {
            Some(cluster) => {
                f(cluster);
                cluster.metadata.resource_version = Some(version);
                true
            }
            None => false,
        }
    }

    /// All secrets in `namespace`, ordered by name
    pub fn secrets_in(&self, namespace: &str) -> Vec<Secret> {
        self.state
            .lock()
            .secrets
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, secret)| secret.clone())
            .collect()
    }
}

#[async_trait]
impl HubClient for InMemoryHub {
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, Error> {
        let mut state = self.state.lock();
        state.enter(Operation::GetNamespace)?;
        Ok(state.namespaces.get(name).cloned())
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<Namespace, Error> {
        let name = namespace.name_any();
        {
            let mut state = self.state.lock();
            state.enter(Operation::CreateNamespace)?;
            if state.namespaces.contains_key(&name) {
                return Err(Error::already_exists("namespaces", &name));
            }
        }
        self.insert_namespace(namespace.clone());
        self.state
            .lock()
            .namespaces
            .get(&name)
            .cloned()
            .ok_or_else(|| Error::internal_with_context("in_memory_hub", "namespace vanished"))
    }

    async fn get_role(&self, namespace: &str, name: &str) -> Result<Option<Role>, Error> {
        let mut state = self.state.lock();
        state.enter(Operation::GetRole)?;
        Ok(state.roles.get(&key(namespace, name)).cloned())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, Error> {
        let mut state = self.state.lock();
        state.enter(Operation::GetSecret)?;
        Ok(state.secrets.get(&key(namespace, name)).cloned())
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, Error> {
        let mut state = self.state.lock();
        state.enter(Operation::CreateSecret)?;
        state.writable_namespace(namespace)?;

        let name = secret.name_any();
        let k = key(namespace, &name);
        if state.secrets.contains_key(&k) {
            return Err(Error::already_exists("secrets", &name));
        }
        let mut created = secret.clone();
        state.stamp(&mut created.metadata, Some(namespace));
        state.secrets.insert(k, created.clone());
        Ok(created)
    }

    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccount>, Error> {
        let mut state = self.state.lock();
        state.enter(Operation::GetServiceAccount)?;
        Ok(state.service_accounts.get(&key(namespace, name)).cloned())
    }

    async fn get_manifest_work(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ManifestWork>, Error> {
        let mut state = self.state.lock();
        state.enter(Operation::GetManifestWork)?;
        Ok(state.manifest_works.get(&key(namespace, name)).cloned())
    }

    async fn get_managed_cluster(&self, name: &str) -> Result<Option<ManagedCluster>, Error> {
        let mut state = self.state.lock();
        state.enter(Operation::GetManagedCluster)?;
        Ok(state.managed_clusters.get(name).cloned())
    }

    async fn replace_managed_cluster(
        &self,
        cluster: &ManagedCluster,
    ) -> Result<ManagedCluster, Error> {
        let name = cluster.name_any();
        let mut state = self.state.lock();
        state.enter(Operation::ReplaceManagedCluster)?;

        if !state.managed_clusters.contains_key(&name) {
            return Err(Error::not_found("managedclusters", &name));
        }

        if state.pending_conflicts > 0 {
            state.pending_conflicts -= 1;
            let version = state.next_version();
            if let Some(stored) = state.managed_clusters.get_mut(&name) {
                stored.metadata.resource_version = Some(version);
            }
        }

        let stored_version = state
            .managed_clusters
            .get(&name)
            .and_then(|stored| stored.metadata.resource_version.clone());
        if let Some(expected) = &cluster.metadata.resource_version {
            if stored_version.as_ref() != Some(expected) {
                return Err(Error::conflict("managedclusters.cluster.open-cluster-management.io", &name));
            }
        }

        let mut updated = cluster.clone();
        updated.metadata.resource_version = Some(state.next_version());
        state.managed_clusters.insert(name, updated.clone());
        Ok(updated)
    }
}
