use casewise_db::repos::audit::AuditFilter;

use crate::app::AppState;
use crate::error::ApiError;
use crate::http::{ApiRequest, ApiResponse};

/// `GET /api/audit?entity_type=&entity_id=&action=&limit=`
pub async fn list(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let filter = AuditFilter {
        entity_type: req.query.enum_value("entity_type")?,
        entity_id: req.query.string("entity_id"),
        action: req.query.enum_value("action")?,
        limit: Some(state.limit(req.query.u32_value("limit")?)),
    };
    ApiResponse::ok(&state.service.query_audit(&filter).await?)
}
