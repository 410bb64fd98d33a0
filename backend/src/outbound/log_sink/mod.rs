//! Remote log-shipping adapter for diagnostic events.
//!
//! Provides a thin HTTP implementation of the `DiagnosticSink` port.

mod dto;
mod http_sink;

pub use http_sink::HttpLogSink;
