use casewise_core::requests::{CreateTaskRequest, TaskStatusRequest, UpdateTaskRequest};
use casewise_db::repos::task::TaskFilter;
use casewise_db::updates::task::TaskUpdate;
use chrono::Utc;

use super::deleted;
use crate::app::AppState;
use crate::error::ApiError;
use crate::http::{ApiRequest, ApiResponse};

/// `GET /api/tasks?case_id=&status=&overdue=true&limit=`
pub async fn list(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let overdue = req.query.flag("overdue")?;
    let filter = TaskFilter {
        case_id: req.query.string("case_id"),
        status: req.query.enum_value("status")?,
        outstanding: req.query.flag("outstanding")?,
        overdue_as_of: overdue.then(|| Utc::now().date_naive()),
        limit: Some(state.limit(req.query.u32_value("limit")?)),
    };
    ApiResponse::ok(&state.service.list_tasks(&filter).await?)
}

/// `POST /api/tasks`
pub async fn create(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let body: CreateTaskRequest = state.parse_body(req, "create_task_request")?;
    ApiResponse::created(&state.service.create_task(&body).await?)
}

pub async fn get(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok(&state.service.get_task(id).await?)
}

pub async fn update(state: &AppState, req: &ApiRequest, id: &str) -> Result<ApiResponse, ApiError> {
    let body: UpdateTaskRequest = state.parse_body(req, "update_task_request")?;
    ApiResponse::ok(&state.service.update_task(id, TaskUpdate::from(body)).await?)
}

pub async fn delete(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    state.service.delete_task(id).await?;
    deleted(id)
}

/// `POST /api/tasks/{id}/status`
pub async fn transition(
    state: &AppState,
    req: &ApiRequest,
    id: &str,
) -> Result<ApiResponse, ApiError> {
    let body: TaskStatusRequest = state.parse_body(req, "task_status_request")?;
    let task = state
        .service
        .transition_task(id, body.status, body.reason.as_deref())
        .await?;
    ApiResponse::ok(&task)
}
