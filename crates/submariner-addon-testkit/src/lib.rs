//! Convergence oracle and conflict-safe mutation toolkit for the Submariner
//! add-on.
//!
//! The add-on controller turns hub-side desired state (ManagedClusterAddOns,
//! ManagedClusterSets, Submariner resources) into broker namespaces, roles,
//! secrets and ManifestWorks. This crate checks that those objects appear or
//! disappear as expected, tolerating propagation delay, and updates shared
//! records without losing concurrent writes.
//!
//! - [`presence`] answers "is this tuple of resources present/absent?"
//! - [`token`] provisions service account token secrets once the account exists
//! - [`mutate`] performs optimistic read-modify-write updates
//! - [`fixtures`] builds the canonical desired-state objects
//! - [`recorder`] captures events emitted by components under test
//! - [`fake`] is an in-memory hub implementing [`HubClient`]

#![deny(missing_docs)]

pub mod client;
pub mod fake;
pub mod fixtures;
pub mod mutate;
pub mod namespace;
pub mod presence;
pub mod recorder;
pub mod token;

pub use client::{HubClient, KubeHubClient};
pub use submariner_addon_common::{Error, Result};
