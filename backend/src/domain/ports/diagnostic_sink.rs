//! Port for shipping diagnostic events to an external collector.
use async_trait::async_trait;

use crate::domain::DiagnosticEvent;

use super::define_port_error;

define_port_error! {
    /// Delivery failures raised by diagnostic sink adapters.
    pub enum DiagnosticSinkError {
        /// The collector could not be reached.
        Transport { message: String } => "diagnostic sink transport failed: {message}",
        /// The collector answered with a non-success status.
        Rejected { status: u16 } => "diagnostic sink rejected event with status {status}",
    }
}

/// Destination for structured diagnostic events.
///
/// Implementations are driven from a background task; callers on the request
/// path never await them directly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    /// Deliver one event.
    async fn deliver(&self, event: &DiagnosticEvent) -> Result<(), DiagnosticSinkError>;
}
