//! # casewise-ai
//!
//! Language-model access for Casewise.
//!
//! Talks to any OpenAI-compatible provider configured in
//! [`casewise_config::AiConfig`]:
//! - chat completions for interaction summaries, report drafts, and
//!   capacity summaries
//! - audio transcription for recorded interactions
//!
//! Prompt text is assembled by [`prompts`]; this crate never touches the
//! database.

pub mod chat;
pub mod prompts;
pub mod transcription;

mod error;
mod http;

pub use chat::Completion;
pub use transcription::Transcript;
pub use error::AiError;
pub use prompts::Prompt;

use std::time::Duration;

use casewise_config::AiConfig;

/// HTTP client for the configured AI provider.
pub struct AiClient {
    http: reqwest::Client,
    config: AiConfig,
}

impl AiClient {
    /// Build a client with the timeout from `config`.
    ///
    /// An unconfigured client still builds; its calls return
    /// [`AiError::NotConfigured`].
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` fails
    /// to build (for example, no TLS backend).
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("casewise/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// Whether an API key is present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    #[must_use]
    pub fn chat_model(&self) -> &str {
        &self.config.chat_model
    }

    #[must_use]
    pub fn transcription_model(&self) -> &str {
        &self.config.transcription_model
    }

    fn api_key(&self) -> Result<&str, AiError> {
        if self.config.is_configured() {
            Ok(&self.config.api_key)
        } else {
            Err(AiError::NotConfigured)
        }
    }
}
