//! Integration tests for the Submariner add-on testkit
//!
//! Only built-in kinds are exercised here (namespaces, roles, secrets,
//! service accounts), so no CRDs need to be installed.
//!
//! - `broker_resources`: the presence oracle watching a broker namespace be
//!   created, filled in and deleted
//!
//! - `service_accounts`: token secret provisioning and current-namespace
//!   discovery

mod broker_resources;
mod helpers;
mod service_accounts;
