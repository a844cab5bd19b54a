//! Chat-completion endpoint.

use std::time::Instant;

use casewise_core::audit_detail::AiDetail;
use serde::{Deserialize, Serialize};

use crate::{AiClient, error::AiError, http::check_response, prompts::Prompt};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Text produced by one chat-completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Model the provider reports having used; falls back to the requested
    /// model when the response omits it.
    pub model: String,
    pub duration_ms: u64,
}

impl Completion {
    /// Audit detail describing this completion.
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
    /// Send `prompt` to the chat-completions endpoint and return the reply.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::NotConfigured`] without a key, [`AiError::RateLimited`]
    /// or [`AiError::Api`] for provider failures, and [`AiError::Decode`] when
    /// the reply carries no text.
    pub async fn complete(&self, prompt: &Prompt) -> Result<Completion, AiError> {
        let key = self.api_key()?;
        let body = ChatRequest {
            model: &self.config.chat_model,
            messages: [
                Message {
                    role: "system",
                    content: &prompt.system,
                },
                Message {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let started = Instant::now();
        let url = self.config.endpoint("chat/completions");
        let resp = check_response(
            self.http
                .post(&url)
                .bearer_auth(key)
                .json(&body)
                .send()
                .await?,
        )
        .await?;
        let data: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AiError::Decode(e.to_string()))?;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let text = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AiError::Decode("completion contained no text".into()))?;

        let model = data.model.unwrap_or_else(|| self.config.chat_model.clone());
        tracing::info!(%model, chars = text.len(), duration_ms, "chat completion");
        Ok(Completion {
            text,
            model,
            duration_ms,
        })
    }
}
