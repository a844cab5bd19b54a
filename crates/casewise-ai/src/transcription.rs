//! Audio transcription endpoint.

use std::time::Instant;

use casewise_core::audit_detail::AiDetail;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::{AiClient, error::AiError, http::check_response};

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: Option<String>,
}

/// Text recovered from one audio upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub model: String,
    pub duration_ms: u64,
}

impl Transcript {
    #[must_use]
    pub fn detail(&self) -> AiDetail {
        AiDetail {
            model: self.model.clone(),
            chars: self.text.chars().count() as u64,
            duration_ms: self.duration_ms,
        }
    }
}

impl AiClient {
    /// Upload `audio` for transcription.
    ///
    /// `filename` matters to some providers, which infer the format from its
    /// extension.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::NotConfigured`] without a key, [`AiError::Http`] if
    /// `content_type` is not a valid MIME type or the upload fails,
    /// [`AiError::RateLimited`] / [`AiError::Api`] for provider failures, and
    /// [`AiError::Decode`] when no text comes back.
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<Transcript, AiError> {
        let key = self.api_key()?;
        let bytes = audio.len();
        let part = Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.config.transcription_model.clone())
            .text("response_format", "json");

        let started = Instant::now();
        let url = self.config.endpoint("audio/transcriptions");
        let resp = check_response(
            self.http
                .post(&url)
                .bearer_auth(key)
                .multipart(form)
                .send()
                .await?,
        )
        .await?;
        let data: TranscriptionResponse = resp
            .json()
            .await
            .map_err(|e| AiError::Decode(e.to_string()))?;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let text = data
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AiError::Decode("transcription contained no text".into()))?;

        tracing::info!(bytes, chars = text.len(), duration_ms, "audio transcribed");
        Ok(Transcript {
            text,
            model: self.config.transcription_model.clone(),
            duration_ms,
        })
    }
}
