use casewise_core::responses::HealthResponse;

use crate::app::AppState;
use crate::error::ApiError;
use crate::http::ApiResponse;

/// `GET /api/health`. Answers 503 when the database does not respond.
pub async fn get(state: &AppState) -> Result<ApiResponse, ApiError> {
    let database = match state.service.db().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "health check: database ping failed");
            false
        }
    };
    let body = HealthResponse {
        status: if database { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        ai_configured: state.ai.is_configured(),
    };
    ApiResponse::json(if database { 200 } else { 503 }, &body)
}
