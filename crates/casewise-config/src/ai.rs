//! Language-model and transcription API configuration.
//!
//! Any OpenAI-compatible endpoint works; `base_url` is the prefix that
//! `/chat/completions` and `/audio/transcriptions` are appended to.

use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

const fn default_max_tokens() -> u32 {
    2_000
}

const fn default_temperature() -> f32 {
    0.2
}

const fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiConfig {
    /// Bearer key. AI endpoints answer 503 while this is empty.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout. Transcription of long recordings is the slow path.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            transcription_model: default_transcription_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// Check if an API key is present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = AiConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.transcription_model, "whisper-1");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn endpoint_joins_cleanly() {
        let config = AiConfig {
            base_url: "http://localhost:9999/v1/".into(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint("/chat/completions"),
            "http://localhost:9999/v1/chat/completions"
        );
    }
}
