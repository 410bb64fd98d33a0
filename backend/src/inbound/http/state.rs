//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::Diagnostics;
use crate::domain::ports::UserRepository;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Persistence port for user records.
    pub users: Arc<dyn UserRepository>,
    /// Fire-and-forget diagnostic emitter.
    pub diagnostics: Diagnostics,
    /// Body returned by `GET /mensagem`.
    pub message: String,
}

impl HttpState {
    /// Construct state from the repository, diagnostics handle and message.
    pub fn new(
        users: Arc<dyn UserRepository>,
        diagnostics: Diagnostics,
        message: impl Into<String>,
    ) -> Self {
        Self {
            users,
            diagnostics,
            message: message.into(),
        }
    }
}
