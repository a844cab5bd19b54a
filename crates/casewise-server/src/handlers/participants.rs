use casewise_core::requests::{CreateParticipantRequest, UpdateParticipantRequest};
use casewise_db::updates::participant::ParticipantUpdate;

use super::deleted;
use crate::app::AppState;
use crate::error::ApiError;
use crate::http::{ApiRequest, ApiResponse};

/// `GET /api/cases/{case_id}/participants`
pub async fn list(state: &AppState, case_id: &str) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok(&state.service.list_participants(case_id).await?)
}

/// `POST /api/cases/{case_id}/participants`
pub async fn create(
    state: &AppState,
    req: &ApiRequest,
    case_id: &str,
) -> Result<ApiResponse, ApiError> {
    let body: CreateParticipantRequest = state.parse_body(req, "create_participant_request")?;
    ApiResponse::created(&state.service.create_participant(case_id, &body).await?)
}

pub async fn get(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok(&state.service.get_participant(id).await?)
}

pub async fn update(state: &AppState, req: &ApiRequest, id: &str) -> Result<ApiResponse, ApiError> {
    let body: UpdateParticipantRequest = state.parse_body(req, "update_participant_request")?;
    let participant = state
        .service
        .update_participant(id, ParticipantUpdate::from(body))
        .await?;
    ApiResponse::ok(&participant)
}

pub async fn delete(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    state.service.delete_participant(id).await?;
    deleted(id)
}
