//! Host entry point over HTTP
//!
//! `POST /invoke` takes the raw event as the body and returns whatever the
//! invocation handler answers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use uuid::Uuid;

use super::ApiState;
use crate::handler::{self, InvocationContext};

/// Header carrying the host request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build invoke router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/invoke", post(invoke))
        .with_state(state)
}

async fn invoke(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);

    // Unparseable bodies get the same fallback as unrecognized events
    let event: Value = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "invoke body is not JSON");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(handler::internal_error()),
            );
        }
    };

    let response = state
        .handler
        .handle(
            event,
            InvocationContext {
                request_id: Some(request_id),
            },
        )
        .await;

    let status = if response.get("statusCode").and_then(Value::as_u64) == Some(500) {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(response))
}
