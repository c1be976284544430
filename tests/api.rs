//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use shutter_gateway::api::ApiServerBuilder;
use shutter_gateway::DbPool;
use tower::ServiceExt;

mod common;
use common::{build_handler, device, directive_event, setup_test_db, MockBackend};

/// Build a test API router
fn build_test_router(db: DbPool, backend: Arc<MockBackend>) -> axum::Router {
    let (handler, tokens) = build_handler(backend, db.clone());
    ApiServerBuilder::new(db, handler, tokens).build().router()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn invoke_request(event: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/invoke")
        .header("content-type", "application/json")
        .header("x-request-id", "req-42")
        .body(Body::from(event.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(setup_test_db(), Arc::new(MockBackend::default()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ready_endpoint() {
    let app = build_test_router(setup_test_db(), Arc::new(MockBackend::default()));

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["checks"]["database"]["status"], "ok");
    // No static backend token configured in tests
    assert_eq!(json["checks"]["backend"]["status"], "unavailable");
}

#[tokio::test]
async fn test_invoke_discovery() {
    let backend = MockBackend::with_devices(
        vec![device("s1", "shutter"), device("w1", "window")],
        Vec::new(),
    );
    let app = build_test_router(setup_test_db(), backend);

    let event = directive_event("Alexa.Discovery", "Discover", None, json!({}));
    let response = app.oneshot(invoke_request(&event)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["event"]["header"]["name"], "Discover.Response");
    assert_eq!(json["event"]["payload"]["endpoints"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_invoke_unknown_event_is_500() {
    let app = build_test_router(setup_test_db(), Arc::new(MockBackend::default()));

    let response = app
        .oneshot(invoke_request(&json!({ "unexpected": true })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["statusCode"], 500);
}

#[tokio::test]
async fn test_invoke_malformed_body_is_500_fallback() {
    for body in ["not json", "", "{\"directive\":"] {
        let app = build_test_router(setup_test_db(), Arc::new(MockBackend::default()));
        let request = Request::builder()
            .method("POST")
            .uri("/invoke")
            .header("content-type", "text/plain")
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{body:?}");
        let json = body_json(response).await;
        assert_eq!(json["statusCode"], 500);
        let inner: Value = serde_json::from_str(json["body"].as_str().unwrap()).unwrap();
        assert_eq!(inner["message"], "Internal Server Error");
    }
}

#[tokio::test]
async fn test_invoke_error_response_is_200() {
    let app = build_test_router(setup_test_db(), MockBackend::failing());

    let event = directive_event("Alexa.ModeController", "SetMode", Some("s1"), json!({ "mode": "open" }));
    let response = app.oneshot(invoke_request(&event)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["event"]["header"]["name"], "ErrorResponse");
}

#[tokio::test]
async fn test_setup_code_lookup() {
    let db = setup_test_db();
    let backend = Arc::new(MockBackend::default());
    let (handler, tokens) = build_handler(backend, db.clone());
    let code = tokens.obtain_token("amzn1.ask.account.WEB").await.unwrap();
    let app = ApiServerBuilder::new(db, handler, tokens).build().router();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/setup/{}", code.to_ascii_lowercase()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["code"], code);
    assert_eq!(json["user_id"], "amzn1.ask.account.WEB");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/setup/ZZZZZZ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
