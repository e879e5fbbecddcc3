//! Namespace the verification code runs in

use std::path::Path;

use tracing::{debug, info};

use submariner_addon_common::{Error, SERVICE_ACCOUNT_NAMESPACE_FILE};

use crate::client::HubClient;
use crate::fixtures::new_namespace;

/// Resolve the current namespace and make sure it exists
///
/// In a pod this is the service account's namespace; elsewhere `default` is
/// used.
pub async fn current_namespace(client: &dyn HubClient, default: &str) -> Result<String, Error> {
    current_namespace_from(client, Path::new(SERVICE_ACCOUNT_NAMESPACE_FILE), default).await
}

/// [`current_namespace`] reading the namespace from `path`
///
/// A missing, unreadable or blank file falls back to `default`. The namespace
/// is created if needed; one that already exists is accepted.
pub async fn current_namespace_from(
    client: &dyn HubClient,
    path: &Path,
    default: &str,
) -> Result<String, Error> {
    let namespace = match tokio::fs::read_to_string(path).await {
        Ok(contents) if !contents.trim().is_empty() => contents.trim().to_string(),
        Ok(_) => default.to_string(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No in-cluster namespace, using default");
            default.to_string()
        }
    };

    match client.create_namespace(&new_namespace(&namespace)).await {
        Ok(_) => info!(namespace = %namespace, "Created namespace"),
        Err(e) if e.is_already_exists() => debug!(namespace = %namespace, "Namespace already exists"),
        Err(e) => return Err(e),
    }
    Ok(namespace)
}
