//! Fire-and-forget diagnostic events.
//!
//! Handlers describe what happened as a [`DiagnosticEvent`] and hand it to
//! [`Diagnostics::emit`]. The event is logged locally through `tracing` and,
//! when a sink is attached, queued on a bounded channel drained by a
//! background task. Emission never blocks and never fails from the caller's
//! point of view: a full or closed queue drops the event with a warning, and
//! sink failures stay inside the worker.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::TraceId;
use super::ports::DiagnosticSink;

/// Default number of events buffered between handlers and the sink worker.
pub const DEFAULT_DIAGNOSTIC_QUEUE_CAPACITY: usize = 1024;

/// Severity attached to a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Normal operation.
    Info,
    /// Something unexpected that did not fail the operation.
    Warn,
    /// A failed operation.
    Error,
}

impl DiagnosticLevel {
    /// Lower-case label used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// One structured event describing an operation outcome.
///
/// # Examples
/// ```
/// use users_backend::domain::{DiagnosticEvent, DiagnosticLevel};
///
/// let event = DiagnosticEvent::info("user created").with_field("id", 1);
/// assert_eq!(event.level(), DiagnosticLevel::Info);
/// assert_eq!(event.fields().get("id"), Some(&serde_json::json!(1)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticEvent {
    level: DiagnosticLevel,
    message: String,
    fields: Map<String, Value>,
    timestamp: DateTime<Utc>,
    trace_id: Option<String>,
}

impl DiagnosticEvent {
    /// Create an event stamped with the current time and trace identifier.
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            fields: Map::new(),
            timestamp: Utc::now(),
            trace_id: TraceId::current().map(|id| id.to_string()),
        }
    }

    /// Shorthand for an [`DiagnosticLevel::Info`] event.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, message)
    }

    /// Shorthand for a [`DiagnosticLevel::Warn`] event.
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warn, message)
    }

    /// Shorthand for an [`DiagnosticLevel::Error`] event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, message)
    }

    /// Attach a structured field; later values replace earlier ones.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Event severity.
    #[must_use]
    pub const fn level(&self) -> DiagnosticLevel {
        self.level
    }

    /// Human-readable summary.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Creation time.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Trace identifier of the request that produced the event, if any.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    fn log_locally(&self) {
        let fields = Value::Object(self.fields.clone());
        let trace_id = self.trace_id.as_deref().unwrap_or("-");
        match self.level {
            DiagnosticLevel::Info => info!(%fields, trace_id, "{}", self.message),
            DiagnosticLevel::Warn => warn!(%fields, trace_id, "{}", self.message),
            DiagnosticLevel::Error => error!(%fields, trace_id, "{}", self.message),
        }
    }
}

/// Cloneable handle used by handlers and startup code to emit events.
#[derive(Clone, Default)]
pub struct Diagnostics {
    sender: Option<Sender<DiagnosticEvent>>,
}

impl Diagnostics {
    /// Handle that only logs locally; used when no sink is configured.
    #[must_use]
    pub fn local_only() -> Self {
        Self::default()
    }

    /// Start a worker task forwarding events to `sink`.
    ///
    /// Must be called from within a Tokio runtime. The worker stops once every
    /// clone of the returned handle has been dropped and the queue is drained.
    #[must_use]
    pub fn spawn(sink: Arc<dyn DiagnosticSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (diagnostics, receiver) = Self::channel(capacity);
        let worker = tokio::spawn(forward_events(receiver, sink));
        (diagnostics, worker)
    }

    fn channel(capacity: usize) -> (Self, Receiver<DiagnosticEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// Whether events leave the process.
    #[must_use]
    pub const fn is_shipping(&self) -> bool {
        self.sender.is_some()
    }

    /// Log the event and queue it for the sink without waiting.
    pub fn emit(&self, event: DiagnosticEvent) {
        event.log_locally();
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(
                    event = dropped.message(),
                    "diagnostic queue full; event dropped"
                );
            }
            Err(TrySendError::Closed(dropped)) => {
                warn!(
                    event = dropped.message(),
                    "diagnostic worker stopped; event dropped"
                );
            }
        }
    }
}

async fn forward_events(mut receiver: Receiver<DiagnosticEvent>, sink: Arc<dyn DiagnosticSink>) {
    while let Some(event) = receiver.recv().await {
        if let Err(err) = sink.deliver(&event).await {
            warn!(error = %err, event = event.message(), "diagnostic delivery failed");
        }
    }
    debug!("diagnostic queue closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{DiagnosticSinkError, MockDiagnosticSink};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink {
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl DiagnosticSink for CollectingSink {
        async fn deliver(&self, event: &DiagnosticEvent) -> Result<(), DiagnosticSinkError> {
            self.delivered
                .lock()
                .expect("sink lock")
                .push(event.message().to_owned());
            Ok(())
        }
    }

    #[rstest]
    fn with_field_replaces_existing_keys() {
        let event = DiagnosticEvent::info("listed users")
            .with_field("count", 1)
            .with_field("count", 2);
        assert_eq!(event.fields().get("count"), Some(&json!(2)));
        assert_eq!(event.fields().len(), 1);
    }

    #[rstest]
    fn optional_fields_become_null() {
        let event = DiagnosticEvent::info("user created").with_field("name", None::<String>);
        assert_eq!(event.fields().get("name"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn events_capture_trace_id_in_scope() {
        let trace_id = TraceId::generate();
        let event = TraceId::scope(trace_id, async { DiagnosticEvent::error("boom") }).await;
        assert_eq!(event.trace_id(), Some(trace_id.to_string().as_str()));
    }

    #[rstest]
    fn local_only_handle_accepts_events() {
        let diagnostics = Diagnostics::local_only();
        assert!(!diagnostics.is_shipping());
        diagnostics.emit(DiagnosticEvent::info("no sink"));
    }

    #[tokio::test]
    async fn worker_delivers_events_in_order_and_stops_when_handles_drop() {
        let sink = Arc::new(CollectingSink::default());
        let (diagnostics, worker) = Diagnostics::spawn(sink.clone(), 8);
        diagnostics.emit(DiagnosticEvent::info("first"));
        diagnostics.clone().emit(DiagnosticEvent::info("second"));
        drop(diagnostics);

        worker.await.expect("worker joins");
        let delivered = sink.delivered.lock().expect("sink lock").clone();
        assert_eq!(delivered, vec!["first".to_owned(), "second".to_owned()]);
    }

    #[tokio::test]
    async fn sink_failures_do_not_stop_the_worker() {
        let mut sink = MockDiagnosticSink::new();
        sink.expect_deliver()
            .times(2)
            .returning(|_| Err(DiagnosticSinkError::rejected(503_u16)));
        let (diagnostics, worker) = Diagnostics::spawn(Arc::new(sink), 4);
        diagnostics.emit(DiagnosticEvent::info("first"));
        diagnostics.emit(DiagnosticEvent::info("second"));
        drop(diagnostics);

        worker.await.expect("worker joins");
    }

    #[rstest]
    fn full_queue_drops_events_without_blocking() {
        let (diagnostics, mut receiver) = Diagnostics::channel(1);
        diagnostics.emit(DiagnosticEvent::info("kept"));
        diagnostics.emit(DiagnosticEvent::info("dropped"));

        let kept = receiver.try_recv().expect("first event queued");
        assert_eq!(kept.message(), "kept");
        assert!(receiver.try_recv().is_err());
    }

    #[rstest]
    fn closed_queue_is_tolerated() {
        let (diagnostics, receiver) = Diagnostics::channel(1);
        drop(receiver);
        diagnostics.emit(DiagnosticEvent::warn("nobody listening"));
    }
}
