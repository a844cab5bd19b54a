//! Case endpoints, including the AI capacity summary.

use casewise_ai::prompts::{self, MAX_INTERACTIONS};
use casewise_core::requests::{CaseStatusRequest, CreateCaseRequest, UpdateCaseRequest};
use casewise_core::responses::CapacitySummaryResponse;
use casewise_db::repos::case::CaseFilter;
use casewise_db::updates::case::CaseUpdate;

use super::deleted;
use crate::app::AppState;
use crate::error::ApiError;
use crate::http::{ApiRequest, ApiResponse};

/// `GET /api/cases?status=&q=&limit=`
pub async fn list(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let filter = CaseFilter {
        status: req.query.enum_value("status")?,
        query: req.query.string("q"),
        limit: Some(state.limit(req.query.u32_value("limit")?)),
    };
    ApiResponse::ok(&state.service.list_cases(&filter).await?)
}

/// `POST /api/cases`
pub async fn create(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let body: CreateCaseRequest = state.parse_body(req, "create_case_request")?;
    ApiResponse::created(&state.service.create_case(&body).await?)
}

pub async fn get(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok(&state.service.get_case(id).await?)
}

pub async fn update(state: &AppState, req: &ApiRequest, id: &str) -> Result<ApiResponse, ApiError> {
    let body: UpdateCaseRequest = state.parse_body(req, "update_case_request")?;
    ApiResponse::ok(&state.service.update_case(id, CaseUpdate::from(body)).await?)
}

pub async fn delete(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    state.service.delete_case(id).await?;
    deleted(id)
}

/// `POST /api/cases/{id}/status`
pub async fn transition(
    state: &AppState,
    req: &ApiRequest,
    id: &str,
) -> Result<ApiResponse, ApiError> {
    let body: CaseStatusRequest = state.parse_body(req, "case_status_request")?;
    let case = state
        .service
        .transition_case(id, body.status, body.reason.as_deref())
        .await?;
    ApiResponse::ok(&case)
}

/// `GET /api/cases/{id}/overview`
pub async fn overview(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok(&state.service.case_overview(id).await?)
}

/// `POST /api/cases/{id}/capacity-summary`
pub async fn capacity_summary(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    state.require_ai()?;
    let case = state.service.get_case(id).await?;
    let limit = u32::try_from(MAX_INTERACTIONS).unwrap_or(u32::MAX);
    let interactions = state.service.interactions_for_case(id, limit).await?;

    let prompt = prompts::capacity_summary_prompt(&case, &interactions);
    let completion = state.ai.complete(&prompt).await?;
    let case = state
        .service
        .set_capacity_summary(id, &completion.text, &completion.detail())
        .await?;

    ApiResponse::ok(&CapacitySummaryResponse {
        case,
        model: completion.model,
    })
}
