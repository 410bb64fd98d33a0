//! User record and its validated building blocks.
//!
//! ## Invariants
//! - [`UserId`] is strictly positive; the store assigns it and it never
//!   changes.
//! - `name` and `email` are optional free text of at most
//!   [`USER_FIELD_MAX`] characters. No format rules apply; empty strings are
//!   stored as given.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum character length of the `name` and `email` columns.
pub const USER_FIELD_MAX: usize = 255;

/// Validation errors raised while building user values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// The identifier is not a positive integer.
    InvalidId,
    /// The name exceeds [`USER_FIELD_MAX`] characters.
    NameTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The email exceeds [`USER_FIELD_MAX`] characters.
    EmailTooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

impl UserValidationError {
    /// Name of the offending field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::NameTooLong { .. } => "name",
            Self::EmailTooLong { .. } => "email",
        }
    }

    /// Stable machine-readable reason.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_user_id",
            Self::NameTooLong { .. } => "name_too_long",
            Self::EmailTooLong { .. } => "email_too_long",
        }
    }
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "user id must be a positive integer"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Store-assigned user identifier.
///
/// # Examples
/// ```
/// use users_backend::domain::UserId;
///
/// let id: UserId = "42".parse().expect("numeric id");
/// assert_eq!(id.get(), 42);
/// assert!("abc".parse::<UserId>().is_err());
/// assert!(UserId::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct UserId(i32);

impl UserId {
    /// Validate and wrap a raw identifier.
    ///
    /// # Errors
    /// Returns [`UserValidationError::InvalidId`] for zero or negative values.
    pub const fn new(raw: i32) -> Result<Self, UserValidationError> {
        if raw > 0 {
            Ok(Self(raw))
        } else {
            Err(UserValidationError::InvalidId)
        }
    }

    /// Raw integer value as stored in the database.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .parse::<i32>()
            .map_err(|_| UserValidationError::InvalidId)?;
        Self::new(raw)
    }
}

impl TryFrom<i32> for UserId {
    type Error = UserValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for i32 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

/// Validated field values for creating or overwriting a user.
///
/// Absent fields are kept as `None` and persisted as `NULL`; an update never
/// merges with the stored row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDraft {
    name: Option<String>,
    email: Option<String>,
}

impl UserDraft {
    /// Validate field lengths and build a draft.
    ///
    /// # Errors
    /// Returns [`UserValidationError::NameTooLong`] or
    /// [`UserValidationError::EmailTooLong`] when a field exceeds
    /// [`USER_FIELD_MAX`] characters.
    pub fn new(name: Option<String>, email: Option<String>) -> Result<Self, UserValidationError> {
        if exceeds_limit(name.as_deref()) {
            return Err(UserValidationError::NameTooLong {
                max: USER_FIELD_MAX,
            });
        }
        if exceeds_limit(email.as_deref()) {
            return Err(UserValidationError::EmailTooLong {
                max: USER_FIELD_MAX,
            });
        }
        Ok(Self { name, email })
    }

    /// Requested name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Requested email.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

fn exceeds_limit(value: Option<&str>) -> bool {
    value.is_some_and(|text| text.chars().count() > USER_FIELD_MAX)
}

/// A persisted user record.
///
/// Serialises as `{"id": 1, "name": "Bob", "email": "b@x.com"}`; absent
/// fields serialise as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(value_type = i32, example = 1)]
    id: UserId,
    #[schema(example = "Bob")]
    name: Option<String>,
    #[schema(example = "b@x.com")]
    email: Option<String>,
}

impl User {
    /// Combine an identifier with validated field values.
    #[must_use]
    pub fn new(id: UserId, draft: UserDraft) -> Self {
        let UserDraft { name, email } = draft;
        Self { id, name, email }
    }

    /// Store-assigned identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Stored name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Stored email.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("1", Some(1))]
    #[case("2147483647", Some(i32::MAX))]
    #[case("0", None)]
    #[case("-3", None)]
    #[case("abc", None)]
    #[case("1.5", None)]
    #[case("", None)]
    #[case("99999999999", None)]
    fn user_id_parses_positive_integers(#[case] raw: &str, #[case] expected: Option<i32>) {
        let parsed = raw.parse::<UserId>().ok().map(UserId::get);
        assert_eq!(parsed, expected);
    }

    #[rstest]
    fn draft_accepts_absent_and_empty_fields() {
        let draft = UserDraft::new(None, Some(String::new())).expect("valid draft");
        assert_eq!(draft.name(), None);
        assert_eq!(draft.email(), Some(""));
    }

    #[rstest]
    fn draft_counts_characters_not_bytes() {
        let name = "ã".repeat(USER_FIELD_MAX);
        assert!(UserDraft::new(Some(name), None).is_ok());
    }

    #[rstest]
    #[case(Some("n".repeat(USER_FIELD_MAX + 1)), None, "name")]
    #[case(None, Some("e".repeat(USER_FIELD_MAX + 1)), "email")]
    fn draft_rejects_overlong_fields(
        #[case] name: Option<String>,
        #[case] email: Option<String>,
        #[case] field: &str,
    ) {
        let err = UserDraft::new(name, email).expect_err("overlong field");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    fn user_serialises_with_null_for_absent_fields() {
        let id = UserId::new(7).expect("valid id");
        let draft = UserDraft::new(Some("Bob".to_owned()), None).expect("valid draft");
        let value = serde_json::to_value(User::new(id, draft)).expect("serialise");
        assert_eq!(value, json!({ "id": 7, "name": "Bob", "email": null }));
    }

    #[rstest]
    fn user_id_deserialisation_rejects_non_positive_values() {
        assert!(serde_json::from_value::<UserId>(json!(0)).is_err());
        assert!(serde_json::from_value::<UserId>(json!(12)).is_ok());
    }
}
