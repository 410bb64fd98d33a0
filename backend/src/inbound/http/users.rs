//! Users CRUD handlers.
//!
//! ```text
//! GET /users
//! POST /users {"name":"Bob","email":"b@x.com"}
//! PUT /users/1 {"name":"Bob","email":"bob@x.com"}
//! DELETE /users/1
//! ```
//!
//! Update and delete do not check that the row exists: zero affected rows
//! still answers 200/204 and is reported as a warning diagnostic.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::UserPersistenceError;
use crate::domain::{
    DiagnosticEvent, Diagnostics, Error, User, UserDraft, UserId, UserValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /users` and `PUT /users/{id}`.
///
/// Missing fields deserialise as `null`; non-string values are rejected by
/// the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UserPayload {
    /// Free-text name, at most 255 characters.
    #[schema(example = "Bob", max_length = 255)]
    pub name: Option<String>,
    /// Free-text email, at most 255 characters.
    #[schema(example = "b@x.com", max_length = 255)]
    pub email: Option<String>,
}

impl TryFrom<UserPayload> for UserDraft {
    type Error = UserValidationError;

    fn try_from(value: UserPayload) -> Result<Self, Self::Error> {
        Self::new(value.name, value.email)
    }
}

fn map_validation_error(
    diagnostics: &Diagnostics,
    operation: &'static str,
    err: &UserValidationError,
) -> Error {
    diagnostics.emit(
        DiagnosticEvent::warn("request rejected")
            .with_field("operation", operation)
            .with_field("field", err.field())
            .with_field("reason", err.code()),
    );
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": err.field(), "code": err.code() }))
}

fn parse_user_id(
    diagnostics: &Diagnostics,
    operation: &'static str,
    raw: &str,
) -> ApiResult<UserId> {
    raw.parse::<UserId>()
        .map_err(|err| map_validation_error(diagnostics, operation, &err))
}

fn parse_draft(
    diagnostics: &Diagnostics,
    operation: &'static str,
    payload: UserPayload,
) -> ApiResult<UserDraft> {
    UserDraft::try_from(payload).map_err(|err| map_validation_error(diagnostics, operation, &err))
}

/// Record a store failure and build the client-facing error.
///
/// The raw cause goes to the diagnostic event only; clients get `message`.
fn store_failure(
    diagnostics: &Diagnostics,
    operation: &'static str,
    message: &'static str,
    err: &UserPersistenceError,
) -> Error {
    diagnostics.emit(
        DiagnosticEvent::error(message)
            .with_field("operation", operation)
            .with_field("cause", err.to_string()),
    );
    Error::internal(message)
}

/// Emit the outcome of a row-count mutation; zero rows is a warning.
///
/// Updates pass the written values so the event records them.
fn report_mutation(
    diagnostics: &Diagnostics,
    operation: &'static str,
    id: UserId,
    written: Option<&UserDraft>,
    rows_affected: usize,
) {
    let outcome = if rows_affected == 0 {
        DiagnosticEvent::warn("no user matched id")
    } else {
        DiagnosticEvent::info(format!("{operation} succeeded"))
    };
    let mut event = outcome
        .with_field("operation", operation)
        .with_field("id", id.get())
        .with_field("rowsAffected", rows_affected);
    if let Some(draft) = written {
        event = event
            .with_field("name", draft.name())
            .with_field("email", draft.email());
    }
    diagnostics.emit(event);
}

/// List every stored user ordered by id.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<User>>> {
    const OPERATION: &str = "listUsers";
    let users = state
        .users
        .list()
        .await
        .map_err(|err| store_failure(&state.diagnostics, OPERATION, "failed to list users", &err))?;
    state.diagnostics.emit(
        DiagnosticEvent::info("users listed")
            .with_field("operation", OPERATION)
            .with_field("count", users.len()),
    );
    Ok(web::Json(users))
}

/// Create a user and return it with its assigned id.
#[utoipa::path(
    post,
    path = "/users",
    request_body = UserPayload,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<UserPayload>,
) -> ApiResult<HttpResponse> {
    const OPERATION: &str = "createUser";
    let draft = parse_draft(&state.diagnostics, OPERATION, payload.into_inner())?;
    let user = state
        .users
        .create(&draft)
        .await
        .map_err(|err| {
            store_failure(&state.diagnostics, OPERATION, "failed to create user", &err)
        })?;
    state.diagnostics.emit(
        DiagnosticEvent::info("user created")
            .with_field("operation", OPERATION)
            .with_field("id", user.id().get())
            .with_field("name", user.name())
            .with_field("email", user.email()),
    );
    Ok(HttpResponse::Created().json(user))
}

/// Overwrite both fields of a user and echo the request.
///
/// Answers 200 even when no row has the given id.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "Positive user identifier")),
    request_body = UserPayload,
    responses(
        (status = 200, description = "Requested values echoed with the id", body = User),
        (status = 400, description = "Invalid id or body", body = Error),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UserPayload>,
) -> ApiResult<web::Json<User>> {
    const OPERATION: &str = "updateUser";
    let id = parse_user_id(&state.diagnostics, OPERATION, &path.into_inner())?;
    let draft = parse_draft(&state.diagnostics, OPERATION, payload.into_inner())?;
    let rows_affected = state
        .users
        .update(id, &draft)
        .await
        .map_err(|err| {
            store_failure(&state.diagnostics, OPERATION, "failed to update user", &err)
        })?;
    report_mutation(&state.diagnostics, OPERATION, id, Some(&draft), rows_affected);
    Ok(web::Json(User::new(id, draft)))
}

/// Delete a user by id.
///
/// Answers 204 even when no row has the given id.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "Positive user identifier")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Invalid id", body = Error),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    const OPERATION: &str = "deleteUser";
    let id = parse_user_id(&state.diagnostics, OPERATION, &path.into_inner())?;
    let rows_affected = state
        .users
        .delete(id)
        .await
        .map_err(|err| {
            store_failure(&state.diagnostics, OPERATION, "failed to delete user", &err)
        })?;
    report_mutation(&state.diagnostics, OPERATION, id, None, rows_affected);
    Ok(HttpResponse::NoContent().finish())
}
