//! AI client error types.

use thiserror::Error;

/// Errors from the chat-completion and transcription APIs.
#[derive(Debug, Error)]
pub enum AiError {
    /// No API key is configured.
    #[error("AI provider is not configured")]
    NotConfigured,

    /// HTTP transport error (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The provider answered 429 Too Many Requests.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The response was well-formed JSON but not the expected shape, or
    /// carried no text.
    #[error("unexpected response: {0}")]
    Decode(String),
}
