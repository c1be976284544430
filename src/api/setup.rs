//! Setup-code lookup for the pairing web app
//!
//! - GET /api/setup/{code} - Resolve a spoken setup code to its user

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::ApiState;

/// Response for a resolved setup code
#[derive(Debug, Serialize)]
pub struct SetupCodeResponse {
    pub code: String,
    pub user_id: String,
}

/// Build setup router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/{code}", get(lookup_code))
        .with_state(state)
}

async fn lookup_code(
    State(state): State<Arc<ApiState>>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    match state.tokens.identity_for(&code).await {
        Ok(Some(user_id)) => {
            tracing::info!(user_id = %user_id, "setup code resolved");
            (
                StatusCode::OK,
                Json(SetupCodeResponse {
                    code: code.trim().to_ascii_uppercase(),
                    user_id,
                }),
            )
                .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "unknown setup code"})),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "setup code lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "lookup failed"})),
            )
                .into_response()
        }
    }
}
