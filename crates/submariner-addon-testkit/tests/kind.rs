//! Convergence checks against a real cluster
//!
//! These tests require a Kubernetes cluster to run. They are ignored by default
//! and can be run with:
//!
//! ```bash
//! cargo test -p submariner-addon-testkit --test kind -- --ignored
//! ```
//!
//! The tests will automatically create a kind cluster named
//! "submariner-addon-test" if one doesn't exist.

mod kind_tests;
