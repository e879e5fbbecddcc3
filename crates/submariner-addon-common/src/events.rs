//! Event recording for add-on components.
//!
//! Components receive an [`EventRecorder`] instead of talking to the events
//! API directly, so the same code can publish real Kubernetes Events in a
//! cluster and write to an in-memory log under test.
//!
//! Events are **fire-and-forget**: failures are logged as warnings and never
//! propagate errors. A failed event must never break reconciliation.

use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use tracing::{warn, Span};

/// Separator used when deriving a sub-component recorder
pub const COMPONENT_SUFFIX_SEPARATOR: &str = "-";

/// Narrow event-recording capability injected into add-on components.
#[async_trait]
pub trait EventRecorder: Send + Sync {
    /// Name of the component events are attributed to
    fn component_name(&self) -> &str;

    /// Recorder attributing events to a different component
    fn for_component(&self, component: &str) -> Arc<dyn EventRecorder>;

    /// Recorder for a sub-component, named `<component>-<suffix>`
    fn with_component_suffix(&self, suffix: &str) -> Arc<dyn EventRecorder> {
        self.for_component(&format!(
            "{}{}{}",
            self.component_name(),
            COMPONENT_SUFFIX_SEPARATOR,
            suffix
        ))
    }

    /// Recorder scoped to a request span
    fn with_span(&self, span: &Span) -> Arc<dyn EventRecorder>;

    /// Record a normal event
    async fn event(&self, reason: &str, message: &str);

    /// Record a warning event
    async fn warning(&self, reason: &str, message: &str);

    /// Flush and release the recorder
    async fn shutdown(&self) {}
}

/// Production recorder publishing Kubernetes Events about one object.
#[derive(Clone)]
pub struct KubeEventRecorder {
    client: Client,
    recorder: Arc<Recorder>,
    regarding: ObjectReference,
    component: String,
}

impl KubeEventRecorder {
    /// Create a recorder for `component`, attaching events to `regarding`.
    ///
    /// The component name appears as the "reportingComponent" on Events.
    pub fn new(client: Client, component: &str, regarding: ObjectReference) -> Self {
        let reporter = Reporter {
            controller: component.to_string(),
            instance: None,
        };
        Self {
            recorder: Arc::new(Recorder::new(client.clone(), reporter)),
            client,
            regarding,
            component: component.to_string(),
        }
    }

    async fn publish(&self, type_: EventType, reason: &str, message: &str) {
        let event = Event {
            type_,
            reason: reason.to_string(),
            note: Some(message.to_string()),
            action: actions::RECONCILE.to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, &self.regarding).await {
            warn!(
                component = %self.component,
                reason,
                error = %e,
                "Failed to publish Kubernetes event"
            );
        }
    }
}

#[async_trait]
impl EventRecorder for KubeEventRecorder {
    fn component_name(&self) -> &str {
        &self.component
    }

    fn for_component(&self, component: &str) -> Arc<dyn EventRecorder> {
        Arc::new(Self::new(
            self.client.clone(),
            component,
            self.regarding.clone(),
        ))
    }

    fn with_span(&self, _span: &Span) -> Arc<dyn EventRecorder> {
        Arc::new(self.clone())
    }

    async fn event(&self, reason: &str, message: &str) {
        self.publish(EventType::Normal, reason, message).await;
    }

    async fn warning(&self, reason: &str, message: &str) {
        self.publish(EventType::Warning, reason, message).await;
    }
}

/// Well-known event action strings.
///
/// These appear in `kubectl get events` under the ACTION column.
pub mod actions {
    /// Standard reconciliation loop
    pub const RECONCILE: &str = "Reconcile";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kube_recorder_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KubeEventRecorder>();
    }

    #[test]
    fn recorder_trait_is_object_safe() {
        fn takes_dyn(_: Option<Arc<dyn EventRecorder>>) {}
        takes_dyn(None);
    }
}
