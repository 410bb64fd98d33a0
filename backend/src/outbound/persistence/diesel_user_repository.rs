//! PostgreSQL-backed `UserRepository` using Diesel.
//!
//! Every statement goes through the Diesel query builder, so caller values
//! are always bound as parameters.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{User, UserDraft, UserId};

use super::models::{NewUserRow, UserRow, UserUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{CREATE_USERS_TABLE, users};

/// Diesel-backed implementation of the [`UserRepository`] port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a repository over the given pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    match error {
        PoolError::Checkout { message } => UserPersistenceError::connection(message),
    }
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(%error, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            UserPersistenceError::connection(info.message())
        }
        DieselError::DatabaseError(_, info) => UserPersistenceError::query(info.message()),
        other => UserPersistenceError::query(other.to_string()),
    }
}

fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let id = UserId::new(row.id)
        .map_err(|err| UserPersistenceError::query(format!("stored id {}: {err}", row.id)))?;
    let draft = UserDraft::new(row.name, row.email)
        .map_err(|err| UserPersistenceError::query(format!("stored user {id}: {err}")))?;
    Ok(User::new(id, draft))
}

fn draft_values(draft: &UserDraft) -> (Option<&str>, Option<&str>) {
    (draft.name(), draft.email())
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn ensure_schema(&self) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::sql_query(CREATE_USERS_TABLE)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_user).collect()
    }

    async fn create(&self, draft: &UserDraft) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (name, email) = draft_values(draft);
        let raw_id: i32 = diesel::insert_into(users::table)
            .values(&NewUserRow { name, email })
            .returning(users::id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let id = UserId::new(raw_id)
            .map_err(|err| UserPersistenceError::query(format!("assigned id {raw_id}: {err}")))?;
        Ok(User::new(id, draft.clone()))
    }

    async fn update(&self, id: UserId, draft: &UserDraft) -> Result<usize, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (name, email) = draft_values(draft);
        diesel::update(users::table.filter(users::id.eq(id.get())))
            .set(&UserUpdate { name, email })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn delete(&self, id: UserId) -> Result<usize, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(users::table.filter(users::id.eq(id.get())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}
