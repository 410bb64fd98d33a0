//! Static diagnostic message endpoint.

use actix_web::{HttpResponse, get, web};

use crate::domain::DiagnosticEvent;
use crate::inbound::http::state::HttpState;

/// Return the configured plain-text message.
#[utoipa::path(
    get,
    path = "/mensagem",
    responses(
        (
            status = 200,
            description = "Configured message",
            body = String,
            content_type = "text/plain"
        )
    ),
    tags = ["mensagem"],
    operation_id = "getMessage"
)]
#[get("/mensagem")]
pub async fn get_message(state: web::Data<HttpState>) -> HttpResponse {
    state.diagnostics.emit(
        DiagnosticEvent::info("message served")
            .with_field("operation", "getMessage")
            .with_field("body", state.message.as_str()),
    );
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(state.message.clone())
}
