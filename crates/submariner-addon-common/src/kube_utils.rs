//! Shared Kubernetes utilities
//!
//! The polling primitive here is the single place where verification code
//! waits for the hub or a managed cluster to converge.

use std::future::Future;
use std::time::Duration;

use k8s_openapi::api::core::v1::Namespace;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::Error;

/// Default time between polling attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default time to wait for a condition before giving up
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Stand-in for "never" when a duration does not fit on the clock
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn instant_after(now: Instant, duration: Duration) -> Instant {
    now.checked_add(duration)
        .unwrap_or_else(|| now + FAR_FUTURE)
}

/// Namespace phase reported while a namespace is being deleted
pub const NAMESPACE_TERMINATING: &str = "Terminating";

/// Interval and timeout for a convergence wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between checks; the first check also waits one interval
    pub interval: Duration,
    /// Total time allowed for the condition to become true
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl PollConfig {
    /// Poll with the given interval and timeout
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Poll until a condition is met, the check fails, or the timeout is reached
///
/// The check runs once per `poll_interval`, starting one interval after the
/// call.
///
/// # Arguments
/// * `timeout` - Maximum time to wait for the condition
/// * `poll_interval` - Time between polling attempts
/// * `operation` - What is being waited for, used in logs and the timeout error
/// * `check_fn` - Async function that returns `Ok(true)` when the condition is
///   met, `Ok(false)` to continue polling, or `Err` to abort
///
/// # Returns
/// `Ok(())` once the condition was met. A check error is returned as-is on the
/// tick it occurred. Running out of time returns [`Error::Timeout`]; a check
/// still in flight at the deadline is dropped.
pub async fn poll_until<F, Fut>(
    timeout: Duration,
    poll_interval: Duration,
    operation: &str,
    mut check_fn: F,
) -> Result<(), Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, Error>>,
{
    let deadline = instant_after(Instant::now(), timeout);
    let mut tick = 0u32;

    loop {
        let next = instant_after(Instant::now(), poll_interval);
        if next > deadline {
            tokio::time::sleep_until(deadline).await;
            debug!(operation, tick, ?timeout, "Polling timed out");
            return Err(Error::timeout(operation, timeout));
        }
        tokio::time::sleep_until(next).await;
        tick += 1;

        match tokio::time::timeout_at(deadline, check_fn()).await {
            Ok(Ok(true)) => {
                debug!(operation, tick, "Polling condition met");
                return Ok(());
            }
            Ok(Ok(false)) => {
                trace!(operation, tick, "Polling condition not yet met, retrying...");
            }
            Ok(Err(e)) => {
                debug!(operation, tick, error = %e, "Polling check failed");
                return Err(e);
            }
            Err(_) => {
                debug!(operation, tick, ?timeout, "Polling timed out during check");
                return Err(Error::timeout(operation, timeout));
            }
        }
    }
}

/// [`poll_until`] driven by a [`PollConfig`]
pub async fn poll_with<F, Fut>(config: &PollConfig, operation: &str, check_fn: F) -> Result<(), Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, Error>>,
{
    poll_until(config.timeout, config.interval, operation, check_fn).await
}

/// Whether the namespace is being deleted
pub fn is_namespace_terminating(namespace: &Namespace) -> bool {
    namespace
        .status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .is_some_and(|phase| phase == NAMESPACE_TERMINATING)
}
