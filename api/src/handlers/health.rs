use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;

use crate::{error::ApiResult, models::HealthResponse, AppState};

/// Health check endpoint
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let connected = sqlx::query("SELECT 1").fetch_one(state.db.pool()).await.is_ok();

    let response = HealthResponse {
        status: if connected {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        timestamp: Utc::now(),
    };

    Ok(Json(response))
}
