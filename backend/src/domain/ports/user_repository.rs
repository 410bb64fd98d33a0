//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{User, UserDraft, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
    }
}

/// Data access for the `users` table.
///
/// Update and delete report the number of affected rows and do not treat zero
/// as a failure; callers decide what a missing row means.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create the backing table when it does not exist yet.
    async fn ensure_schema(&self) -> Result<(), UserPersistenceError>;

    /// Return every stored user ordered by ascending id.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Insert a user and return it with the store-assigned id.
    ///
    /// The returned fields echo `draft`; the row is not read back.
    async fn create(&self, draft: &UserDraft) -> Result<User, UserPersistenceError>;

    /// Overwrite both fields of the row matching `id`.
    async fn update(&self, id: UserId, draft: &UserDraft) -> Result<usize, UserPersistenceError>;

    /// Remove the row matching `id`.
    async fn delete(&self, id: UserId) -> Result<usize, UserPersistenceError>;
}
