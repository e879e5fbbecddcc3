//! Conflict-safe mutation of shared hub records
//!
//! Other controllers write to the same records concurrently, so every update
//! is a fresh read, a pure mutation, and a version-guarded write. A stale
//! version rejects the write and the whole cycle runs again.

use std::collections::BTreeMap;
use std::future::Future;

use kube::ResourceExt;
use tracing::{debug, info};

use submariner_addon_common::crd::ManagedCluster;
use submariner_addon_common::retry::{retry_on_conflict, RetryConfig};
use submariner_addon_common::Error;

use crate::client::HubClient;

/// Optimistic read-modify-write, retried on conflict
///
/// `get` reads the current record (carrying its version), `mutate` applies the
/// change in memory, and `put` submits it. Only conflicts are retried, each
/// time from a fresh read; any other error aborts. When `config` runs out of
/// attempts the last conflict error is returned.
pub async fn read_modify_write<T, G, GFut, M, P, PFut>(
    config: &RetryConfig,
    operation: &str,
    get: G,
    mutate: M,
    put: P,
) -> Result<T, Error>
where
    G: Fn() -> GFut,
    GFut: Future<Output = Result<T, Error>>,
    M: Fn(&mut T),
    P: Fn(T) -> PFut,
    PFut: Future<Output = Result<T, Error>>,
{
    let (get, mutate, put) = (&get, &mutate, &put);
    retry_on_conflict(config, operation, move || async move {
        let mut record = get().await?;
        mutate(&mut record);
        put(record).await
    })
    .await
}

/// Replace the labels of a ManagedCluster
///
/// The label map is replaced wholesale, not merged. Other fields written
/// concurrently by other actors are preserved because each attempt starts
/// from a fresh read. A missing cluster is a not-found error.
pub async fn update_managed_cluster_labels(
    client: &dyn HubClient,
    name: &str,
    labels: BTreeMap<String, String>,
) -> Result<ManagedCluster, Error> {
    let updated = read_modify_write(
        &RetryConfig::on_conflict(),
        "update_managed_cluster_labels",
        move || async move {
            let cluster = client
                .get_managed_cluster(name)
                .await?
                .ok_or_else(|| Error::not_found("managedclusters", name))?;
            debug!(
                cluster = name,
                resource_version = %cluster.resource_version().unwrap_or_default(),
                "Read managed cluster"
            );
            Ok(cluster)
        },
        |cluster: &mut ManagedCluster| cluster.metadata.labels = Some(labels.clone()),
        move |cluster: ManagedCluster| async move { client.replace_managed_cluster(&cluster).await },
    )
    .await?;

    info!(cluster = name, labels = ?updated.labels(), "Updated managed cluster labels");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockHubClient;
    use crate::fake::{InMemoryHub, Operation};
    use crate::fixtures::new_managed_cluster;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn versioned(name: &str, version: &str) -> ManagedCluster {
        let mut cluster = new_managed_cluster(name, labels(&[("old", "label")]));
        cluster.metadata.resource_version = Some(version.to_string());
        cluster
    }

    #[tokio::test]
    async fn single_conflict_is_retried_once() {
        let reads = Arc::new(AtomicU32::new(0));
        let r = reads.clone();
        let writes = Arc::new(AtomicU32::new(0));
        let w = writes.clone();

        let mut mock = MockHubClient::new();
        mock.expect_get_managed_cluster()
            .times(2)
            .returning(move |name| {
                let n = r.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(Some(versioned(name, &n.to_string())))
            });
        mock.expect_replace_managed_cluster()
            .times(2)
            .returning(move |cluster| {
                if w.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(Error::conflict("managedclusters", &cluster.name_any()))
                } else {
                    Ok(cluster.clone())
                }
            });

        let updated = update_managed_cluster_labels(&mock, "cluster1", labels(&[("cloud", "aws")]))
            .await
            .expect("second attempt succeeds");

        assert_eq!(updated.metadata.labels, Some(labels(&[("cloud", "aws")])));
        assert_eq!(updated.resource_version().as_deref(), Some("2"));
        assert_eq!(reads.load(Ordering::SeqCst), 2);
        assert_eq!(writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_conflict_error_aborts() {
        let mut mock = MockHubClient::new();
        mock.expect_get_managed_cluster()
            .times(1)
            .returning(|name| Ok(Some(versioned(name, "1"))));
        mock.expect_replace_managed_cluster()
            .times(1)
            .returning(|_| Err(Error::api(403, "Forbidden", "managedclusters is forbidden")));

        let err = update_managed_cluster_labels(&mock, "cluster1", labels(&[("a", "b")]))
            .await
            .expect_err("forbidden surfaces");
        assert!(!err.is_conflict());
    }

    #[tokio::test]
    async fn missing_cluster_is_not_found() {
        let mut mock = MockHubClient::new();
        mock.expect_get_managed_cluster()
            .times(1)
            .returning(|_| Ok(None));
        mock.expect_replace_managed_cluster().times(0);

        let err = update_managed_cluster_labels(&mock, "ghost", BTreeMap::new())
            .await
            .expect_err("no such cluster");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn version_change_mid_update_succeeds_after_one_retry() {
        let hub = InMemoryHub::new();
        hub.insert_managed_cluster(new_managed_cluster("cluster1", labels(&[("old", "label")])));
        hub.conflict_next_replaces(1);

        let updated = update_managed_cluster_labels(&hub, "cluster1", labels(&[("cloud", "aws")]))
            .await
            .expect("retry succeeds");

        assert_eq!(updated.metadata.labels, Some(labels(&[("cloud", "aws")])));
        assert_eq!(hub.calls(Operation::GetManagedCluster), 2);
        assert_eq!(hub.calls(Operation::ReplaceManagedCluster), 2);
    }

    #[tokio::test]
    async fn persistent_conflict_exhausts_attempts() {
        let hub = InMemoryHub::new();
        hub.insert_managed_cluster(new_managed_cluster("cluster1", BTreeMap::new()));
        hub.conflict_next_replaces(usize::MAX);

        let err = update_managed_cluster_labels(&hub, "cluster1", labels(&[("cloud", "aws")]))
            .await
            .expect_err("never stops conflicting");

        assert!(err.is_conflict());
        assert_eq!(hub.calls(Operation::ReplaceManagedCluster), 5);
        let stored = hub.managed_cluster("cluster1").expect("still there");
        assert!(stored.metadata.labels.is_none());
    }

    #[tokio::test]
    async fn labels_are_replaced_and_concurrent_writes_kept() {
        let hub = InMemoryHub::new();
        hub.insert_managed_cluster(new_managed_cluster("cluster1", labels(&[("old", "label")])));
        hub.touch_managed_cluster("cluster1", |c| {
            c.metadata.annotations = Some(labels(&[("owner", "reconciler")]));
        });

        update_managed_cluster_labels(&hub, "cluster1", labels(&[("cloud", "aws")]))
            .await
            .expect("update");

        let stored = hub.managed_cluster("cluster1").expect("exists");
        assert_eq!(stored.metadata.labels, Some(labels(&[("cloud", "aws")])));
        assert_eq!(
            stored.metadata.annotations,
            Some(labels(&[("owner", "reconciler")]))
        );
    }

    #[tokio::test]
    async fn empty_labels_clear_existing_labels() {
        let hub = InMemoryHub::new();
        hub.insert_managed_cluster(new_managed_cluster(
            "cluster1",
            labels(&[("vendor", "OpenShift"), ("cloud", "aws")]),
        ));

        let updated = update_managed_cluster_labels(&hub, "cluster1", BTreeMap::new())
            .await
            .expect("update");

        assert_eq!(updated.metadata.labels, Some(BTreeMap::new()));
        let stored = hub.managed_cluster("cluster1").expect("exists");
        assert_eq!(stored.metadata.labels, Some(BTreeMap::new()));
        assert_eq!(hub.calls(Operation::ReplaceManagedCluster), 1);
    }

    #[tokio::test]
    async fn read_modify_write_is_generic_over_records() {
        let store = Arc::new(parking_lot::Mutex::new((1u32, 10i64)));
        let conflicts = Arc::new(AtomicU32::new(1));

        let result = read_modify_write(
            &RetryConfig::on_conflict(),
            "counter",
            || {
                let store = store.clone();
                async move { Ok(*store.lock()) }
            },
            |record: &mut (u32, i64)| record.1 += 5,
            |record: (u32, i64)| {
                let store = store.clone();
                let conflicts = conflicts.clone();
                async move {
                    let mut stored = store.lock();
                    if conflicts.swap(0, Ordering::SeqCst) > 0 {
                        stored.0 += 1;
                    }
                    if stored.0 != record.0 {
                        return Err(Error::conflict("counter", "c"));
                    }
                    *stored = (record.0 + 1, record.1);
                    Ok(*stored)
                }
            },
        )
        .await
        .expect("converges");

        // first write raced a concurrent bump; second applied on top of it
        assert_eq!(result, (3, 15));
    }
}
