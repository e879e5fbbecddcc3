//! Service account token provisioning
//!
//! Clusters without a token controller never populate service account
//! secrets, so verification code creates them once the controller has created
//! the account. Each created secret gets a fresh random suffix; callers must
//! use the returned secret rather than derive its name.

use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, info, warn};

use submariner_addon_common::kube_utils::{poll_with, PollConfig};
use submariner_addon_common::Error;

use crate::client::HubClient;
use crate::fixtures::new_token_secret;

/// Length of the random suffix on generated secret names
pub const TOKEN_SUFFIX_LEN: usize = 5;

/// Characters used in generated name suffixes (no vowels, no ambiguous digits)
const SUFFIX_ALPHABET: &[u8] = b"bcdfghjklmnpqrstvwxz2456789";

/// Random suffix for generated object names
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

/// Name for a new token secret of `service_account`
pub fn token_secret_name(service_account: &str) -> String {
    format!(
        "{service_account}-token-{}",
        random_suffix(TOKEN_SUFFIX_LEN)
    )
}

/// Wait for a service account to exist, then create a token secret for it
///
/// Uses the default 1s interval and 30s timeout.
pub async fn setup_service_account(
    client: &dyn HubClient,
    namespace: &str,
    name: &str,
) -> Result<Secret, Error> {
    setup_service_account_with(client, &PollConfig::default(), namespace, name).await
}

/// [`setup_service_account`] with an explicit poll configuration
///
/// Each tick looks up the account; while it is missing the poll continues.
/// Once it exists a token secret is created and the poll ends. A name
/// collision on create is retried on the next tick with a new suffix; any
/// other error aborts. If the account never appears, nothing is created and
/// the timeout error is returned.
pub async fn setup_service_account_with(
    client: &dyn HubClient,
    config: &PollConfig,
    namespace: &str,
    name: &str,
) -> Result<Secret, Error> {
    let created: Mutex<Option<Secret>> = Mutex::new(None);
    let operation = format!("service account {namespace}/{name}");

    poll_with(config, &operation, || {
        let created = &created;
        async move {
            let Some(account) = client.get_service_account(namespace, name).await? else {
                debug!(namespace, name, "Service account not found yet");
                return Ok(false);
            };

            let secret = new_token_secret(namespace, &account.name_any(), &token_secret_name(name));
            match client.create_secret(namespace, &secret).await {
                Ok(secret) => {
                    *created.lock() = Some(secret);
                    Ok(true)
                }
                Err(e) if e.is_already_exists() => {
                    warn!(namespace, secret = %secret.name_any(), "Token secret name collision, retrying");
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        }
    })
    .await?;

    let secret = created
        .into_inner()
        .ok_or_else(|| Error::internal_with_context("setup_service_account", "no secret created"))?;
    info!(namespace, service_account = name, secret = %secret.name_any(), "Created service account token secret");
    Ok(secret)
}
