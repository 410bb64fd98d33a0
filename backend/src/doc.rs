//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every HTTP handler under `inbound::http` together with
//! the payload schemas. Swagger UI serves it at `/swagger/`, and the
//! `openapi-dump` binary prints it for external tooling.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode, User};
use crate::inbound::http::users::UserPayload;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "User API",
        description = "CRUD de usuários com PostgreSQL",
        version = "1.0.0"
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::message::get_message,
    ),
    components(schemas(User, UserPayload, Error, ErrorCode)),
    tags(
        (name = "users", description = "User records stored in PostgreSQL"),
        (name = "mensagem", description = "Configured plain-text message")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn info_matches_service_identity() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "User API");
        assert_eq!(doc.info.version, "1.0.0");
        assert_eq!(
            doc.info.description.as_deref(),
            Some("CRUD de usuários com PostgreSQL")
        );
    }

    #[rstest]
    #[case("User", &["id", "name", "email"])]
    #[case("UserPayload", &["name", "email"])]
    #[case("Error", &["code", "message", "traceId", "details"])]
    fn schemas_expose_wire_fields(#[case] name: &str, #[case] fields: &[&str]) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas.get(name).expect("schema registered");
        for field in fields {
            assert_object_schema_has_field(schema, field);
        }
    }

    #[rstest]
    #[case("/users")]
    #[case("/users/{id}")]
    #[case("/mensagem")]
    fn every_route_is_documented(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }
}
