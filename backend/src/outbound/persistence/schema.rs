//! Diesel table definitions.
//!
//! Must match [`CREATE_USERS_TABLE`], which is applied at startup.

/// Idempotent DDL creating the users table.
pub(crate) const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    name VARCHAR(255),
    email VARCHAR(255)
)";

diesel::table! {
    /// User records.
    users (id) {
        /// Store-assigned serial primary key.
        id -> Int4,
        /// Free-text name.
        #[max_length = 255]
        name -> Nullable<Varchar>,
        /// Free-text email.
        #[max_length = 255]
        email -> Nullable<Varchar>,
    }
}
