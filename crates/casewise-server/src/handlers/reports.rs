//! Report endpoints: AI generation, draft edits, finalization.

use casewise_ai::prompts::{self, MAX_INTERACTIONS, ReportContext};
use casewise_core::requests::{GenerateReportRequest, UpdateReportRequest};
use casewise_db::repos::report::{NewReport, ReportFilter};
use casewise_db::repos::task::TaskFilter;
use casewise_db::updates::report::ReportUpdate;

use super::deleted;
use crate::app::AppState;
use crate::error::ApiError;
use crate::http::{ApiRequest, ApiResponse};

/// `GET /api/reports?case_id=&type=&status=&limit=`
pub async fn list(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let filter = ReportFilter {
        case_id: req.query.string("case_id"),
        report_type: req.query.enum_value("type")?,
        status: req.query.enum_value("status")?,
        limit: Some(state.limit(req.query.u32_value("limit")?)),
    };
    ApiResponse::ok(&state.service.list_reports(&filter).await?)
}

/// `POST /api/reports/generate`
pub async fn generate(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let body: GenerateReportRequest = state.parse_body(req, "generate_report_request")?;
    state.require_ai()?;

    let svc = &state.service;
    let case = svc.get_case(&body.case_id).await?;
    let participants = svc.list_participants(&case.id).await?;
    let limit = u32::try_from(MAX_INTERACTIONS).unwrap_or(u32::MAX);
    let interactions = svc.interactions_for_case(&case.id, limit).await?;
    let tasks = svc
        .list_tasks(&TaskFilter {
            case_id: Some(case.id.clone()),
            outstanding: true,
            limit: Some(state.config.general.max_limit),
            ..Default::default()
        })
        .await?;

    let ctx = ReportContext {
        case: &case,
        participants: &participants,
        interactions: &interactions,
        tasks: &tasks,
    };
    let prompt = prompts::report_prompt(body.report_type, &ctx, body.instructions.as_deref());
    let completion = state.ai.complete(&prompt).await?;

    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map_or_else(
            || format!("{} - {}", body.report_type.title(), case.worker_name),
            str::to_string,
        );
    let detail = completion.detail();
    let report = svc
        .create_report(&NewReport {
            case_id: &case.id,
            report_type: body.report_type,
            title: &title,
            content: &completion.text,
            generated: Some(&detail),
        })
        .await?;
    ApiResponse::created(&report)
}

pub async fn get(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok(&state.service.get_report(id).await?)
}

/// `PATCH /api/reports/{id}`. Final reports answer 409.
pub async fn update(state: &AppState, req: &ApiRequest, id: &str) -> Result<ApiResponse, ApiError> {
    let body: UpdateReportRequest = state.parse_body(req, "update_report_request")?;
    ApiResponse::ok(&state.service.update_report(id, ReportUpdate::from(body)).await?)
}

pub async fn delete(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    state.service.delete_report(id).await?;
    deleted(id)
}

/// `POST /api/reports/{id}/finalize`
pub async fn finalize(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok(&state.service.finalize_report(id).await?)
}
