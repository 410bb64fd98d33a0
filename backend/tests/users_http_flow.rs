//! End-to-end HTTP behaviour of the users service over in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test as actix_test, web};
use rstest::rstest;
use serde_json::{Value, json};

use users_backend::domain::{DiagnosticLevel, Diagnostics, TRACE_ID_HEADER};
use users_backend::inbound::http::state::HttpState;
use users_backend::server::build_app;
use users_backend::settings::DEFAULT_MESSAGE;
use users_backend::test_support::{InMemoryUserRepository, RecordingDiagnosticSink};

fn state(diagnostics: Diagnostics) -> web::Data<HttpState> {
    web::Data::new(HttpState::new(
        Arc::new(InMemoryUserRepository::default()),
        diagnostics,
        DEFAULT_MESSAGE,
    ))
}

async fn send<S>(app: &S, request: actix_http::Request) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = actix_test::call_service(app, request).await;
    let status = response.status();
    let body = actix_test::read_body(response).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, value)
}

fn post_user(body: Value) -> actix_http::Request {
    actix_test::TestRequest::post()
        .uri("/users")
        .set_json(body)
        .to_request()
}

fn list() -> actix_http::Request {
    actix_test::TestRequest::get().uri("/users").to_request()
}

#[actix_web::test]
async fn create_list_delete_scenario() {
    let app = actix_test::init_service(build_app(state(Diagnostics::local_only()))).await;

    let (status, created) =
        send(&app, post_user(json!({ "name": "Bob", "email": "b@x.com" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created, json!({ "id": 1, "name": "Bob", "email": "b@x.com" }));

    let (status, users) = send(&app, list()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users, json!([{ "id": 1, "name": "Bob", "email": "b@x.com" }]));

    let (status, body) = send(
        &app,
        actix_test::TestRequest::delete().uri("/users/1").to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, users) = send(&app, list()).await;
    assert_eq!(users, json!([]));
}

#[actix_web::test]
async fn list_reflects_latest_update() {
    let app = actix_test::init_service(build_app(state(Diagnostics::local_only()))).await;

    let (_, ana) = send(
        &app,
        post_user(json!({ "name": "Ana", "email": "ana@example.com" })),
    )
    .await;
    let id = ana.get("id").and_then(Value::as_i64).expect("assigned id");
    assert!(id > 0);

    let (status, updated) = send(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/users/{id}"))
            .set_json(json!({ "name": "Ana Maria", "email": null }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated, json!({ "id": id, "name": "Ana Maria", "email": null }));

    let (_, users) = send(&app, list()).await;
    assert_eq!(users, json!([{ "id": id, "name": "Ana Maria", "email": null }]));
}

#[actix_web::test]
async fn missing_ids_are_not_errors() {
    let app = actix_test::init_service(build_app(state(Diagnostics::local_only()))).await;
    let (_, kept) = send(&app, post_user(json!({ "name": "Kim", "email": "k@x.com" }))).await;

    let (status, _) = send(
        &app,
        actix_test::TestRequest::delete().uri("/users/999").to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, echoed) = send(
        &app,
        actix_test::TestRequest::put()
            .uri("/users/998")
            .set_json(json!({ "name": "Ghost", "email": "g@x.com" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(echoed, json!({ "id": 998, "name": "Ghost", "email": "g@x.com" }));

    let (_, users) = send(&app, list()).await;
    assert_eq!(users, json!([kept]));
}

#[actix_web::test]
async fn ids_are_never_reused() {
    let app = actix_test::init_service(build_app(state(Diagnostics::local_only()))).await;
    let mut seen = Vec::new();
    for round in 0..3 {
        let (_, user) = send(&app, post_user(json!({ "name": format!("u{round}") }))).await;
        let id = user.get("id").and_then(Value::as_i64).expect("assigned id");
        assert!(!seen.contains(&id), "id {id} reused");
        seen.push(id);
        send(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/users/{id}"))
                .to_request(),
        )
        .await;
    }
}

#[rstest]
#[case::bad_id(actix_test::TestRequest::delete().uri("/users/abc"))]
#[case::zero_id(actix_test::TestRequest::put().uri("/users/0").set_json(json!({})))]
#[case::not_json(
    actix_test::TestRequest::post()
        .uri("/users")
        .insert_header(("content-type", "application/json"))
        .set_payload("{name")
)]
#[case::too_long(
    actix_test::TestRequest::post()
        .uri("/users")
        .set_json(json!({ "email": "e".repeat(300) }))
)]
#[actix_web::test]
async fn malformed_requests_get_structured_400(#[case] request: actix_test::TestRequest) {
    let app = actix_test::init_service(build_app(state(Diagnostics::local_only()))).await;

    let response = actix_test::call_service(&app, request.to_request()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let trace_id = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("trace id header");
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.get("code").and_then(Value::as_str), Some("invalid_request"));
    assert_eq!(body.get("traceId").and_then(Value::as_str), Some(trace_id.as_str()));

    let (_, users) = send(&app, list()).await;
    assert_eq!(users, json!([]));
}

#[actix_web::test]
async fn message_defaults_to_mensagem_padrao() {
    let app = actix_test::init_service(build_app(state(Diagnostics::local_only()))).await;

    let request = actix_test::TestRequest::get().uri("/mensagem").to_request();
    let body = actix_test::call_and_read_body(&app, request).await;
    assert_eq!(body.as_ref(), "Mensagem padrão".as_bytes());
}

#[actix_web::test]
async fn operations_reach_the_diagnostic_sink() {
    let sink = RecordingDiagnosticSink::default();
    let (diagnostics, worker) = Diagnostics::spawn(Arc::new(sink.clone()), 64);
    let app = actix_test::init_service(build_app(state(diagnostics.clone()))).await;

    let response = actix_test::call_service(
        &app,
        post_user(json!({ "name": "Bob", "email": "b@x.com" })),
    )
    .await;
    let trace_id = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("trace id header");
    // The response's request keeps the app state, and with it a sender, alive.
    drop(response);
    send(
        &app,
        actix_test::TestRequest::put()
            .uri("/users/1")
            .set_json(json!({ "name": "Robert", "email": null }))
            .to_request(),
    )
    .await;
    send(
        &app,
        actix_test::TestRequest::delete().uri("/users/42").to_request(),
    )
    .await;

    drop(app);
    drop(diagnostics);
    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("worker exits once every sender is dropped")
        .expect("worker drains and exits");

    let events = sink.events();
    let created = events
        .iter()
        .find(|event| event.message() == "user created")
        .expect("create event");
    assert_eq!(created.level(), DiagnosticLevel::Info);
    assert_eq!(created.trace_id(), Some(trace_id.as_str()));
    assert_eq!(created.fields().get("id"), Some(&json!(1)));
    assert_eq!(created.fields().get("name"), Some(&json!("Bob")));
    assert_eq!(created.fields().get("email"), Some(&json!("b@x.com")));

    let updated = events
        .iter()
        .find(|event| event.fields().get("operation") == Some(&json!("updateUser")))
        .expect("update event");
    assert_eq!(updated.level(), DiagnosticLevel::Info);
    assert_eq!(updated.fields().get("rowsAffected"), Some(&json!(1)));
    assert_eq!(updated.fields().get("name"), Some(&json!("Robert")));
    assert_eq!(updated.fields().get("email"), Some(&Value::Null));

    let missed = events
        .iter()
        .find(|event| event.fields().get("operation") == Some(&json!("deleteUser")))
        .expect("delete event");
    assert_eq!(missed.level(), DiagnosticLevel::Warn);
    assert_eq!(missed.fields().get("rowsAffected"), Some(&json!(0)));
}
