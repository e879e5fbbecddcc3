//! Presence/absence oracle for resources the add-on controller manages
//!
//! A check compares what the hub holds against an expected presence flag and
//! returns a verdict. Not-found is a normal answer (the object is absent);
//! every other API error is a malfunction and is returned as `Err`, never
//! folded into a `false` verdict.
//!
//! Namespaces that are `Terminating` count as absent. The hub has no garbage
//! collector signal that distinguishes "terminating" from "gone", and the
//! broker role and secret inside such a namespace may linger for a while.

use std::fmt;

use k8s_openapi::api::core::v1::Namespace;
use parking_lot::Mutex;
use tracing::{debug, info};

use submariner_addon_common::crd::ManifestWork;
use submariner_addon_common::kube_utils::{is_namespace_terminating, poll_with, PollConfig};
use submariner_addon_common::{Error, BROKER_ROLE_NAME, IPSEC_PSK_SECRET_NAME};

use crate::client::HubClient;

/// Observed lifecycle state of a namespace
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamespacePhase {
    /// Exists and is not being deleted
    Active,
    /// Deletion has started
    Terminating,
    /// Not found
    Absent,
}

impl NamespacePhase {
    /// Classify a fetched namespace
    pub fn of(namespace: Option<&Namespace>) -> Self {
        match namespace {
            None => Self::Absent,
            Some(ns) if is_namespace_terminating(ns) => Self::Terminating,
            Some(_) => Self::Active,
        }
    }

    /// Whether the namespace counts as present for dependent resources
    pub fn is_present(self) -> bool {
        self == Self::Active
    }
}

impl fmt::Display for NamespacePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Terminating => write!(f, "Terminating"),
            Self::Absent => write!(f, "Absent"),
        }
    }
}

/// Snapshot of the broker namespace, role and IPsec secret
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrokerResourceTuple {
    /// Phase of the broker namespace
    pub namespace_phase: NamespacePhase,
    /// Whether the broker role exists
    pub role_exists: bool,
    /// Whether the IPsec PSK secret exists
    pub secret_exists: bool,
}

impl BrokerResourceTuple {
    /// Whether the namespace object exists at all (including while terminating)
    pub fn namespace_exists(&self) -> bool {
        self.namespace_phase != NamespacePhase::Absent
    }

    /// All three resources are present in a live namespace
    pub fn is_present(&self) -> bool {
        self.namespace_phase.is_present() && self.role_exists && self.secret_exists
    }

    /// The tuple counts as gone: the namespace is absent or terminating
    pub fn is_absent(&self) -> bool {
        !self.namespace_phase.is_present()
    }

    /// Whether the snapshot satisfies the expected presence
    pub fn matches(&self, expect_present: bool) -> bool {
        if expect_present {
            self.is_present()
        } else {
            self.is_absent()
        }
    }
}

impl fmt::Display for BrokerResourceTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "namespace={} role={} secret={}",
            self.namespace_phase, self.role_exists, self.secret_exists
        )
    }
}

/// Did a single lookup match the expectation?
fn matches_expectation<T>(found: &Option<T>, expect_present: bool) -> bool {
    found.is_some() == expect_present
}

/// Check that the broker namespace, role and IPsec secret are all present
/// (`expect_present = true`) or gone (`false`).
///
/// The namespace is fetched first. When absence is expected and the namespace
/// is absent or terminating, the role and secret are not queried. Otherwise
/// the role and then the secret are checked, stopping at the first mismatch.
pub async fn check_broker_resources(
    client: &dyn HubClient,
    broker_namespace: &str,
    expect_present: bool,
) -> Result<bool, Error> {
    let namespace = client.get_namespace(broker_namespace).await?;
    let phase = NamespacePhase::of(namespace.as_ref());

    if phase.is_present() != expect_present {
        debug!(broker_namespace, %phase, expect_present, "Broker namespace mismatch");
        return Ok(false);
    }

    if !expect_present {
        // role and secret live in the namespace, nothing more to check
        return Ok(true);
    }

    let role = client.get_role(broker_namespace, BROKER_ROLE_NAME).await?;
    if !matches_expectation(&role, expect_present) {
        debug!(broker_namespace, expect_present, "Broker role mismatch");
        return Ok(false);
    }

    let secret = client
        .get_secret(broker_namespace, IPSEC_PSK_SECRET_NAME)
        .await?;
    if !matches_expectation(&secret, expect_present) {
        debug!(broker_namespace, expect_present, "IPsec PSK secret mismatch");
        return Ok(false);
    }

    Ok(true)
}

/// Fetch the full broker tuple without short-circuiting
///
/// Intended for diagnostics: unlike [`check_broker_resources`] this always
/// queries all three resources.
pub async fn observe_broker_resources(
    client: &dyn HubClient,
    broker_namespace: &str,
) -> Result<BrokerResourceTuple, Error> {
    let namespace = client.get_namespace(broker_namespace).await?;
    let role = client.get_role(broker_namespace, BROKER_ROLE_NAME).await?;
    let secret = client
        .get_secret(broker_namespace, IPSEC_PSK_SECRET_NAME)
        .await?;

    Ok(BrokerResourceTuple {
        namespace_phase: NamespacePhase::of(namespace.as_ref()),
        role_exists: role.is_some(),
        secret_exists: secret.is_some(),
    })
}

/// ManifestWorks fetched by [`check_manifest_works`], in request order
#[derive(Clone, Debug, Default)]
pub struct ManifestWorkSet {
    entries: Vec<(String, Option<ManifestWork>)>,
}

impl ManifestWorkSet {
    /// Names in request order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// The fetched work for `name`; `None` if it is absent or was not requested
    pub fn get(&self, name: &str) -> Option<&ManifestWork> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, work)| work.as_ref())
    }

    /// `(name, work)` pairs in request order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ManifestWork>)> {
        self.entries
            .iter()
            .map(|(name, work)| (name.as_str(), work.as_ref()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no works were requested
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Check that every named ManifestWork in `cluster_namespace` is present
/// (`expect_present = true`) or absent (`false`).
///
/// Returns `Ok(None)` at the first work that does not match, without partial
/// results. On success the fetched works are returned in request order
/// (all `None` when absence was expected).
pub async fn check_manifest_works(
    client: &dyn HubClient,
    cluster_namespace: &str,
    expect_present: bool,
    works: &[&str],
) -> Result<Option<ManifestWorkSet>, Error> {
    let mut entries = Vec::with_capacity(works.len());

    for &work in works {
        let found = client.get_manifest_work(cluster_namespace, work).await?;
        if !matches_expectation(&found, expect_present) {
            debug!(cluster_namespace, work, expect_present, "ManifestWork mismatch");
            return Ok(None);
        }
        entries.push((work.to_string(), found));
    }

    Ok(Some(ManifestWorkSet { entries }))
}

/// Wait until [`check_broker_resources`] reports a match
pub async fn wait_for_broker_resources(
    client: &dyn HubClient,
    config: &PollConfig,
    broker_namespace: &str,
    expect_present: bool,
) -> Result<(), Error> {
    let operation = format!(
        "broker resources in {broker_namespace} to be {}",
        if expect_present { "present" } else { "absent" }
    );
    poll_with(config, &operation, || {
        check_broker_resources(client, broker_namespace, expect_present)
    })
    .await?;
    info!(broker_namespace, expect_present, "Broker resources converged");
    Ok(())
}

/// Wait until [`check_manifest_works`] reports a match, returning the works
pub async fn wait_for_manifest_works(
    client: &dyn HubClient,
    config: &PollConfig,
    cluster_namespace: &str,
    expect_present: bool,
    works: &[&str],
) -> Result<ManifestWorkSet, Error> {
    let operation = format!(
        "manifest works {works:?} in {cluster_namespace} to be {}",
        if expect_present { "present" } else { "absent" }
    );
    let converged: Mutex<Option<ManifestWorkSet>> = Mutex::new(None);
    poll_with(config, &operation, || {
        let converged = &converged;
        async move {
            let set = check_manifest_works(client, cluster_namespace, expect_present, works).await?;
            let done = set.is_some();
            *converged.lock() = set;
            Ok(done)
        }
    })
    .await?;

    info!(cluster_namespace, expect_present, "Manifest works converged");
    converged
        .into_inner()
        .ok_or_else(|| Error::internal_with_context("wait_for_manifest_works", "no result"))
}
