//! Capturing event recorder
//!
//! [`CapturingEventRecorder`] satisfies the same [`EventRecorder`] capability
//! as the Kubernetes-backed recorder but appends every emission to an
//! [`EventLog`], so tests can assert on what a component reported.

use std::fmt;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn, Span};

use submariner_addon_common::events::EventRecorder;

/// Severity of a recorded event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Informational event
    Normal,
    /// Warning event
    Warning,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Normal => f.write_str("Event"),
            EventKind::Warning => f.write_str("Warning"),
        }
    }
}

/// One captured emission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Event or warning
    pub kind: EventKind,
    /// Component the recorder was scoped to
    pub component: String,
    /// Short machine-readable reason
    pub reason: String,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for RecordedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}] {}: {}",
            self.kind, self.component, self.reason, self.message
        )
    }
}

/// Shared, append-only buffer of recorded events; clones share storage
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl EventLog {
    /// Empty log, independent of the process-wide one
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide log used by [`CapturingEventRecorder::new`]
    pub fn global() -> EventLog {
        static GLOBAL: OnceLock<EventLog> = OnceLock::new();
        GLOBAL.get_or_init(EventLog::new).clone()
    }

    fn push(&self, event: RecordedEvent) {
        self.events.lock().push(event);
    }

    /// Snapshot of every event in emission order
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Events emitted by `component`
    pub fn for_component(&self, component: &str) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.component == component)
            .cloned()
            .collect()
    }

    fn contains(&self, kind: EventKind, component: &str, reason: &str) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| e.kind == kind && e.component == component && e.reason == reason)
    }

    /// Whether `component` emitted a normal event with `reason`
    pub fn has_event(&self, component: &str, reason: &str) -> bool {
        self.contains(EventKind::Normal, component, reason)
    }

    /// Whether `component` emitted a warning with `reason`
    pub fn has_warning(&self, component: &str, reason: &str) -> bool {
        self.contains(EventKind::Warning, component, reason)
    }

    /// Rendered lines, one per event
    pub fn render(&self) -> Vec<String> {
        self.events.lock().iter().map(ToString::to_string).collect()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drop every recorded event
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// [`EventRecorder`] writing to an [`EventLog`]
///
/// Child recorders derived through `for_component`, `with_component_suffix`
/// or `with_span` share the parent's log.
#[derive(Clone, Debug)]
pub struct CapturingEventRecorder {
    component: String,
    log: EventLog,
}

impl CapturingEventRecorder {
    /// Recorder for `component` writing to the process-wide log
    pub fn new(component: &str) -> Self {
        Self::with_log(component, EventLog::global())
    }

    /// Recorder for `component` writing to `log`
    pub fn with_log(component: &str, log: EventLog) -> Self {
        Self {
            component: component.to_string(),
            log,
        }
    }

    /// The log this recorder writes to
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    fn record(&self, kind: EventKind, reason: &str, message: &str) {
        let event = RecordedEvent {
            kind,
            component: self.component.clone(),
            reason: reason.to_string(),
            message: message.to_string(),
        };
        match kind {
            EventKind::Normal => info!(component = %self.component, reason, "{event}"),
            EventKind::Warning => warn!(component = %self.component, reason, "{event}"),
        }
        self.log.push(event);
    }
}

#[async_trait]
impl EventRecorder for CapturingEventRecorder {
    fn component_name(&self) -> &str {
        &self.component
    }

    fn for_component(&self, component: &str) -> Arc<dyn EventRecorder> {
        Arc::new(Self::with_log(component, self.log.clone()))
    }

    fn with_span(&self, _span: &Span) -> Arc<dyn EventRecorder> {
        Arc::new(self.clone())
    }

    async fn event(&self, reason: &str, message: &str) {
        self.record(EventKind::Normal, reason, message);
    }

    async fn warning(&self, reason: &str, message: &str) {
        self.record(EventKind::Warning, reason, message);
    }
}
