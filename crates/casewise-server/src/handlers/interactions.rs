//! Interaction endpoints: CRUD, participant links, AI summaries, and audio
//! transcription.

use casewise_ai::prompts;
use casewise_core::entities::Interaction;
use casewise_core::requests::{CreateInteractionRequest, UpdateInteractionRequest};
use casewise_core::responses::{SummaryResponse, TranscriptionResponse};
use casewise_core::summary::Summary;
use casewise_db::repos::interaction::InteractionFilter;
use casewise_db::updates::interaction::InteractionUpdate;

use super::deleted;
use crate::app::AppState;
use crate::error::ApiError;
use crate::http::{ApiRequest, ApiResponse};

/// `GET /api/interactions?case_id=&type=&q=&limit=`
pub async fn list(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let filter = InteractionFilter {
        case_id: req.query.string("case_id"),
        interaction_type: req.query.enum_value("type")?,
        query: req.query.string("q"),
        limit: Some(state.limit(req.query.u32_value("limit")?)),
    };
    ApiResponse::ok(&state.service.list_interactions(&filter).await?)
}

/// `POST /api/interactions`
pub async fn create(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let body: CreateInteractionRequest = state.parse_body(req, "create_interaction_request")?;
    ApiResponse::created(&state.service.create_interaction(&body).await?)
}

pub async fn get(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok(&state.service.get_interaction(id).await?)
}

pub async fn update(state: &AppState, req: &ApiRequest, id: &str) -> Result<ApiResponse, ApiError> {
    let body: UpdateInteractionRequest = state.parse_body(req, "update_interaction_request")?;
    let interaction = state
        .service
        .update_interaction(id, InteractionUpdate::from(body))
        .await?;
    ApiResponse::ok(&interaction)
}

pub async fn delete(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    state.service.delete_interaction(id).await?;
    deleted(id)
}

/// `POST /api/interactions/{id}/participants/{participant_id}`
pub async fn link(
    state: &AppState,
    id: &str,
    participant_id: &str,
) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok(&state.service.link_participant(id, participant_id).await?)
}

/// `DELETE /api/interactions/{id}/participants/{participant_id}`
pub async fn unlink(
    state: &AppState,
    id: &str,
    participant_id: &str,
) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok(&state.service.unlink_participant(id, participant_id).await?)
}

/// Generate and store an AI summary of `interaction`'s notes and transcript.
async fn summarize_and_store(
    state: &AppState,
    interaction: &Interaction,
) -> Result<Interaction, ApiError> {
    let has_source = [&interaction.notes, &interaction.transcript]
        .iter()
        .any(|t| t.as_deref().is_some_and(|t| !t.trim().is_empty()));
    if !has_source {
        return Err(ApiError::bad_request(
            "interaction has no notes or transcript to summarize",
        ));
    }

    let participants = state.service.list_participants(&interaction.case_id).await?;
    let prompt = prompts::interaction_summary_prompt(interaction, &participants);
    let completion = state.ai.complete(&prompt).await?;
    let stored = state
        .service
        .set_summary(&interaction.id, Some(&completion.text), Some(&completion.detail()))
        .await?;
    Ok(stored)
}

/// `POST /api/interactions/{id}/summarize`
pub async fn summarize(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    state.require_ai()?;
    let interaction = state.service.get_interaction(id).await?;
    let stored = summarize_and_store(state, &interaction).await?;
    let markdown = stored.ai_summary.unwrap_or_default();
    ApiResponse::ok(&SummaryResponse {
        interaction_id: stored.id,
        sections: Summary::parse(&markdown),
        markdown: Some(markdown),
    })
}

/// The `type/subtype` of an audio upload's `Content-Type`, lower-cased and
/// without parameters. Absent means `application/octet-stream`.
fn audio_mime(req: &ApiRequest) -> Result<String, ApiError> {
    let Some(raw) = req.header("Content-Type") else {
        return Ok("application/octet-stream".to_string());
    };
    let essence = raw.split(';').next().unwrap_or_default().trim();
    let is_token = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
    };
    match essence.split_once('/') {
        Some((kind, sub)) if is_token(kind) && is_token(sub) => Ok(essence.to_ascii_lowercase()),
        _ => Err(ApiError::bad_request(format!(
            "Content-Type '{raw}' is not a valid MIME type"
        ))),
    }
}

/// Upload name for an audio body; providers infer the format from the
/// extension.
fn audio_filename(req: &ApiRequest, mime: &str) -> String {
    if let Some(name) = req.query.get("filename") {
        return name.to_string();
    }
    let ext = match mime {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/flac" | "audio/x-flac" => "flac",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        _ => "bin",
    };
    format!("recording.{ext}")
}

/// `POST /api/interactions/{id}/transcribe[?summarize=true]`
///
/// The request body is the raw audio.
pub async fn transcribe(
    state: &AppState,
    req: &ApiRequest,
    id: &str,
) -> Result<ApiResponse, ApiError> {
    state.require_ai()?;
    let summarize = req.query.flag("summarize")?;
    if req.body.is_empty() {
        return Err(ApiError::bad_request("audio body is required"));
    }
    let content_type = audio_mime(req)?;
    // Fail before the upload if the interaction is gone.
    state.service.get_interaction(id).await?;

    let filename = audio_filename(req, &content_type);
    let transcript = state
        .ai
        .transcribe(req.body.clone(), &filename, &content_type)
        .await?;
    let mut interaction = state
        .service
        .set_transcript(id, &transcript.text, &transcript.detail())
        .await?;

    if summarize {
        interaction = summarize_and_store(state, &interaction).await?;
    }

    ApiResponse::ok(&TranscriptionResponse {
        interaction,
        transcript_chars: transcript.text.chars().count() as u64,
        summarized: summarize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    #[test]
    fn filename_from_content_type() {
        let req = ApiRequest::new(Method::Post, "/api/interactions/int-1/transcribe");
        assert_eq!(audio_filename(&req, "audio/mpeg"), "recording.mp3");
        assert_eq!(audio_filename(&req, "audio/wav"), "recording.wav");
        assert_eq!(audio_filename(&req, "application/octet-stream"), "recording.bin");
    }

    #[test]
    fn mime_keeps_only_the_essence() {
        let req = ApiRequest::new(Method::Post, "/api/interactions/int-1/transcribe")
            .with_header("Content-Type", "Audio/WAV; codecs=1");
        assert_eq!(audio_mime(&req).unwrap(), "audio/wav");

        let bare = ApiRequest::new(Method::Post, "/api/interactions/int-1/transcribe");
        assert_eq!(audio_mime(&bare).unwrap(), "application/octet-stream");
    }

    #[test]
    fn malformed_mime_is_a_client_error() {
        for bad in ["audio", "audio/", "/mpeg", "audio mpeg/x", "audio/mp(3)"] {
            let req = ApiRequest::new(Method::Post, "/api/interactions/int-1/transcribe")
                .with_header("Content-Type", bad);
            let err = audio_mime(&req).unwrap_err();
            assert_eq!(err.status(), 400, "{bad}");
        }
    }

    #[test]
    fn filename_from_query_wins() {
        let req = ApiRequest::new(
            Method::Post,
            "/api/interactions/int-1/transcribe?filename=call.m4a",
        );
        assert_eq!(audio_filename(&req, "audio/mpeg"), "call.m4a");
    }
}
