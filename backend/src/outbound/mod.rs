//! Outbound adapters implementing domain ports.

pub mod log_sink;
pub mod persistence;
