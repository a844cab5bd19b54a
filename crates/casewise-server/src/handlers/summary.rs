//! Section-level reading and editing of an interaction's AI summary.
//!
//! Edits parse the stored markdown, apply the change through
//! [`Summary`], and store the re-rendered text, so the stored form is always
//! what the parser reads back.

use casewise_core::entities::Interaction;
use casewise_core::requests::{SectionCreateRequest, SectionEditRequest, SummaryUpdateRequest};
use casewise_core::responses::SummaryResponse;
use casewise_core::summary::{Section, Summary};

use crate::app::AppState;
use crate::error::ApiError;
use crate::http::{ApiRequest, ApiResponse};

fn respond(interaction: Interaction) -> Result<ApiResponse, ApiError> {
    let sections = interaction
        .ai_summary
        .as_deref()
        .map(Summary::parse)
        .unwrap_or_default();
    ApiResponse::ok(&SummaryResponse {
        interaction_id: interaction.id,
        markdown: interaction.ai_summary,
        sections,
    })
}

async fn load(state: &AppState, id: &str) -> Result<Summary, ApiError> {
    let interaction = state.service.get_interaction(id).await?;
    Ok(interaction
        .ai_summary
        .as_deref()
        .map(Summary::parse)
        .unwrap_or_default())
}

async fn store(state: &AppState, id: &str, summary: &Summary) -> Result<ApiResponse, ApiError> {
    let rendered = summary.render();
    let text = Some(rendered.as_str()).filter(|t| !t.trim().is_empty());
    respond(state.service.set_summary(id, text, None).await?)
}

/// `GET /api/interactions/{id}/summary`
pub async fn get(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    respond(state.service.get_interaction(id).await?)
}

/// `PUT /api/interactions/{id}/summary`. A blank summary clears it.
pub async fn replace(state: &AppState, req: &ApiRequest, id: &str) -> Result<ApiResponse, ApiError> {
    let body: SummaryUpdateRequest = state.parse_body(req, "summary_update_request")?;
    let text = Some(body.summary.trim()).filter(|t| !t.is_empty());
    respond(state.service.set_summary(id, text, None).await?)
}

/// `PATCH /api/interactions/{id}/summary/sections/{index}`
pub async fn edit_section(
    state: &AppState,
    req: &ApiRequest,
    id: &str,
    index: usize,
) -> Result<ApiResponse, ApiError> {
    let edit: SectionEditRequest = state.parse_body(req, "section_edit_request")?;
    let mut summary = load(state, id).await?;
    summary.apply_edit(index, &edit)?;
    store(state, id, &summary).await
}

/// `DELETE /api/interactions/{id}/summary/sections/{index}`
pub async fn delete_section(
    state: &AppState,
    id: &str,
    index: usize,
) -> Result<ApiResponse, ApiError> {
    let mut summary = load(state, id).await?;
    summary.remove_section(index)?;
    store(state, id, &summary).await
}

/// `POST /api/interactions/{id}/summary/sections`
pub async fn create_section(
    state: &AppState,
    req: &ApiRequest,
    id: &str,
) -> Result<ApiResponse, ApiError> {
    let body: SectionCreateRequest = state.parse_body(req, "section_create_request")?;
    let mut summary = load(state, id).await?;

    let heading = body.heading.as_deref();
    let section = match &body.items {
        Some(items) => Section::list(heading, items)?,
        None => Section::text(heading, body.text.as_deref().unwrap_or_default())?,
    };
    let position = body.position.unwrap_or_else(|| summary.len());
    summary.insert_section(position, section)?;

    let resp = store(state, id, &summary).await?;
    Ok(ApiResponse { status: 201, ..resp })
}
