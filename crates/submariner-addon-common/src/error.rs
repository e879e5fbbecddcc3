//! Error types for the Submariner add-on toolkit
//!
//! Errors are structured with fields to aid debugging. The classification
//! helpers (`is_not_found`, `is_conflict`, `is_already_exists`) let callers
//! separate expected absence and optimistic-concurrency conflicts from real
//! failures without matching on HTTP codes themselves.

use std::time::Duration;

use kube::error::ErrorResponse;
use thiserror::Error;

/// Main error type for add-on verification operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error (including not-found, conflict, already-exists)
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// A resource document failed validation
    #[error("validation error for {resource}: {message}")]
    Validation {
        /// Name or kind of the invalid resource
        resource: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "spec.clusterID")
        field: Option<String>,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// A polled condition never became true
    #[error("timed out after {timeout:?} waiting for {operation}")]
    Timeout {
        /// What was being waited for
        operation: String,
        /// The configured timeout
        timeout: Duration,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred
        context: String,
    },
}

impl Error {
    /// Build an API error shaped like the ones the apiserver returns
    pub fn api(code: u16, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Kube {
            source: kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: message.into(),
                reason: reason.into(),
                code,
            }),
        }
    }

    /// Synthesize a 404 NotFound for `kind`/`name`
    pub fn not_found(kind: &str, name: &str) -> Self {
        Self::api(404, "NotFound", format!("{kind} \"{name}\" not found"))
    }

    /// Synthesize a 409 Conflict for `kind`/`name`
    pub fn conflict(kind: &str, name: &str) -> Self {
        Self::api(
            409,
            "Conflict",
            format!(
                "Operation cannot be fulfilled on {kind} \"{name}\": the object has been modified; \
                 please apply your changes to the latest version and try again"
            ),
        )
    }

    /// Synthesize a 409 AlreadyExists for `kind`/`name`
    pub fn already_exists(kind: &str, name: &str) -> Self {
        Self::api(409, "AlreadyExists", format!("{kind} \"{name}\" already exists"))
    }

    /// Create a validation error for a resource
    pub fn validation(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            resource: resource.into(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error pointing at a specific field
    pub fn validation_for_field(
        resource: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            resource: resource.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create a timeout error for a polled operation
    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout,
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    fn api_response(&self) -> Option<&ErrorResponse> {
        match self {
            Error::Kube {
                source: kube::Error::Api(ae),
            } => Some(ae),
            _ => None,
        }
    }

    /// The object does not exist
    pub fn is_not_found(&self) -> bool {
        self.api_response().is_some_and(|ae| ae.code == 404)
    }

    /// The write was rejected because the stored resourceVersion moved on
    pub fn is_conflict(&self) -> bool {
        self.api_response()
            .is_some_and(|ae| ae.code == 409 && ae.reason == "Conflict")
    }

    /// A create was rejected because the name is taken
    pub fn is_already_exists(&self) -> bool {
        self.api_response()
            .is_some_and(|ae| ae.code == 409 && ae.reason == "AlreadyExists")
    }

    /// A poll ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}
