//! Domain primitives, events, and ports.
//!
//! Purpose: define the strongly typed user record, the transport-agnostic
//! error payload, request-scoped trace identifiers, and the diagnostic event
//! pipeline. Adapters in `inbound` and `outbound` depend on this module, never
//! the other way round.
//!
//! Public surface:
//! - [`User`], [`UserId`], [`UserDraft`]: the stored record and its validated
//!   inputs.
//! - [`Error`], [`ErrorCode`]: error payload shared by every endpoint.
//! - [`TraceId`]: per-request correlation identifier.
//! - [`Diagnostics`], [`DiagnosticEvent`]: fire-and-forget structured events.

pub mod diagnostics;
pub mod error;
pub mod ports;
pub mod trace_id;
pub mod user;

pub use self::diagnostics::{
    DEFAULT_DIAGNOSTIC_QUEUE_CAPACITY, DiagnosticEvent, DiagnosticLevel, Diagnostics,
};
pub use self::error::{Error, ErrorCode};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{USER_FIELD_MAX, User, UserDraft, UserId, UserValidationError};
