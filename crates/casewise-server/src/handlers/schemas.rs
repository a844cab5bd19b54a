use casewise_core::responses::SchemaListResponse;
use casewise_schema::SchemaError;

use crate::app::AppState;
use crate::error::ApiError;
use crate::http::ApiResponse;

/// `GET /api/schemas`
pub fn list(state: &AppState) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok(&SchemaListResponse {
        schemas: state.schemas.list().into_iter().map(String::from).collect(),
    })
}

/// `GET /api/schemas/{name}`
pub fn get(state: &AppState, name: &str) -> Result<ApiResponse, ApiError> {
    let schema = state
        .schemas
        .get(name)
        .ok_or_else(|| SchemaError::NotFound(name.to_string()))?;
    ApiResponse::ok(schema)
}
