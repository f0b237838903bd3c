use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use super::AppState;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "im ready",
            "UTC_time": chrono::Utc::now().to_rfc2822(),
            "auto_refresh": state.scheduler.is_running().await,
        })),
    )
}
