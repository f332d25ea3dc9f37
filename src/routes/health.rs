use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = ?e, "health check could not reach the database");
            "unavailable"
        }
    };
    let body = json!({
        "status": "ok",
        "database": database,
    });
    (StatusCode::OK, Json(body))
}
