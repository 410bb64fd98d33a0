//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::{App, HttpResponse, HttpServer, web};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
use crate::doc::ApiDoc;
use crate::inbound::http::error::{json_error_handler, route_not_found};
use crate::inbound::http::message::get_message;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{create_user, delete_user, list_users, update_user};

/// Path Swagger UI is served under.
pub const SWAGGER_PATH: &str = "/swagger/";
/// Path of the generated OpenAPI document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

async fn swagger_redirect() -> HttpResponse {
    HttpResponse::PermanentRedirect()
        .insert_header((header::LOCATION, SWAGGER_PATH))
        .finish()
}

/// Build the application with every route, the JSON body policy, and docs.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use actix_web::web;
/// use users_backend::domain::Diagnostics;
/// use users_backend::inbound::http::state::HttpState;
/// use users_backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
/// use users_backend::server::build_app;
///
/// let pool = DbPool::new(&PoolConfig::new("postgres://localhost/users"));
/// let state = HttpState::new(
///     Arc::new(DieselUserRepository::new(pool)),
///     Diagnostics::local_only(),
///     "Mensagem padrão",
/// );
/// let _app = build_app(web::Data::new(state));
/// ```
pub fn build_app(
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(http_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .wrap(Trace)
        .service(list_users)
        .service(create_user)
        .service(update_user)
        .service(delete_user)
        .service(get_message)
        .service(SwaggerUi::new("/swagger/{_:.*}").url(OPENAPI_PATH, ApiDoc::openapi()))
        .route("/swagger", web::get().to(swagger_redirect))
        .default_service(web::to(route_not_found))
}

/// Construct an Actix HTTP server sharing one state across workers.
///
/// # Returns
/// A [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(http_state: HttpState, config: &ServerConfig) -> std::io::Result<Server> {
    let http_state = web::Data::new(http_state);
    let server = HttpServer::new(move || build_app(http_state.clone()));
    let server = match config.workers {
        Some(workers) => server.workers(workers),
        None => server,
    };
    Ok(server.bind(config.bind_addr)?.run())
}
