//! Integration tests for token provisioning and namespace discovery

use std::path::Path;

use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube::ResourceExt;

use submariner_addon_common::SERVICE_ACCOUNT_TOKEN_SECRET_TYPE;
use submariner_addon_testkit::namespace::current_namespace_from;
use submariner_addon_testkit::token::setup_service_account;
use submariner_addon_testkit::HubClient;

use super::helpers::{create_namespace, create_service_account, delete_namespace, test_hub, unique_name};

/// Story: the controller creates an agent service account and the harness
/// provisions a token secret for it
#[tokio::test]
#[ignore = "requires kind cluster"]
async fn story_token_secret_is_provisioned() {
    let (client, hub) = test_hub().await;
    let ns = unique_name("cluster");
    create_namespace(&client, &ns).await;

    let creator = {
        let client = client.clone();
        let ns = ns.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
            create_service_account(&client, &ns, "submariner-agent").await;
        })
    };

    let secret = setup_service_account(&hub, &ns, "submariner-agent")
        .await
        .expect("token secret should be created");
    creator.await.unwrap();

    let secrets: Api<Secret> = Api::namespaced(client.clone(), &ns);
    let stored = secrets.get(&secret.name_any()).await.expect("secret exists");
    assert_eq!(stored.type_.as_deref(), Some(SERVICE_ACCOUNT_TOKEN_SECRET_TYPE));
    assert!(stored.name_any().starts_with("submariner-agent-token-"));

    delete_namespace(&client, &ns).await;
}

/// Story: outside a pod, the default namespace is used and created on demand
#[tokio::test]
#[ignore = "requires kind cluster"]
async fn story_current_namespace_falls_back_to_default() {
    let (client, hub) = test_hub().await;
    let ns = unique_name("harness");

    let resolved = current_namespace_from(&hub, Path::new("/nonexistent/namespace"), &ns)
        .await
        .expect("namespace resolved");
    assert_eq!(resolved, ns);
    assert!(hub.get_namespace(&ns).await.unwrap().is_some());

    // second call tolerates the existing namespace
    current_namespace_from(&hub, Path::new("/nonexistent/namespace"), &ns)
        .await
        .expect("already exists is fine");

    delete_namespace(&client, &ns).await;
}
