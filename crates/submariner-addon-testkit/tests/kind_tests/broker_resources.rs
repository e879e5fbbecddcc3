//! Integration tests for the broker presence oracle
//!
//! The test plays the controller: it creates the broker namespace, then the
//! role and IPsec secret, then deletes the namespace, and checks that the
//! oracle tracks each step on a real apiserver.

use std::time::Duration;

use submariner_addon_common::kube_utils::PollConfig;
use submariner_addon_testkit::presence::{
    check_broker_resources, observe_broker_resources, wait_for_broker_resources, NamespacePhase,
};

use super::helpers::{create_broker_contents, create_namespace, delete_namespace, test_hub, unique_name};

/// Story: a broker namespace is created, populated, then torn down
#[tokio::test]
#[ignore = "requires kind cluster"]
async fn story_broker_lifecycle_is_observed() {
    let (client, hub) = test_hub().await;
    let ns = unique_name("broker");

    // Nothing exists yet
    assert!(check_broker_resources(&hub, &ns, false).await.unwrap());
    assert!(!check_broker_resources(&hub, &ns, true).await.unwrap());

    // Namespace alone is not enough
    create_namespace(&client, &ns).await;
    assert!(!check_broker_resources(&hub, &ns, true).await.unwrap());
    assert!(!check_broker_resources(&hub, &ns, false).await.unwrap());

    // Role and secret complete the tuple
    create_broker_contents(&client, &ns).await;
    wait_for_broker_resources(&hub, &PollConfig::default(), &ns, true)
        .await
        .expect("broker resources should be present");

    let tuple = observe_broker_resources(&hub, &ns).await.unwrap();
    assert_eq!(tuple.namespace_phase, NamespacePhase::Active);
    assert!(tuple.is_present());

    // Deleting the namespace counts as absent as soon as it is terminating
    delete_namespace(&client, &ns).await;
    wait_for_broker_resources(
        &hub,
        &PollConfig::new(Duration::from_secs(1), Duration::from_secs(60)),
        &ns,
        false,
    )
    .await
    .expect("broker resources should be absent");
}

/// Story: waiting for a broker that nobody creates times out cleanly
#[tokio::test]
#[ignore = "requires kind cluster"]
async fn story_missing_broker_times_out() {
    let (_client, hub) = test_hub().await;
    let ns = unique_name("never");

    let err = wait_for_broker_resources(
        &hub,
        &PollConfig::new(Duration::from_secs(1), Duration::from_secs(3)),
        &ns,
        true,
    )
    .await
    .expect_err("nothing creates the broker");
    assert!(err.is_timeout());
}
