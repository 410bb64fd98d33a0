//! Wire format of shipped log records.
//!
//! Each record is a flat JSON object: the fixed `dt`, `level`, and `message`
//! keys followed by the event's own fields.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::DiagnosticEvent;

#[derive(Debug, Serialize)]
pub(super) struct LogRecordDto<'a> {
    pub(super) dt: String,
    pub(super) level: &'static str,
    pub(super) message: &'a str,
    #[serde(rename = "traceId", skip_serializing_if = "Option::is_none")]
    pub(super) trace_id: Option<&'a str>,
    #[serde(flatten)]
    pub(super) fields: &'a Map<String, Value>,
}

impl<'a> From<&'a DiagnosticEvent> for LogRecordDto<'a> {
    fn from(event: &'a DiagnosticEvent) -> Self {
        Self {
            dt: event.timestamp().to_rfc3339(),
            level: event.level().as_str(),
            message: event.message(),
            trace_id: event.trace_id(),
            fields: event.fields(),
        }
    }
}
