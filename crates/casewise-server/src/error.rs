//! API error type and its mapping to HTTP statuses.
//!
//! Every crate error converges here. Handlers return `Result<_, ApiError>`
//! and [`ApiError::into_response`] renders the
//! `{"error": {"code", "message", "details"}}` body.

use casewise_ai::AiError;
use casewise_core::errors::CoreError;
use casewise_core::summary::SummaryError;
use casewise_db::error::DatabaseError;
use casewise_schema::SchemaError;
use serde::Serialize;
use thiserror::Error;

use crate::http::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Vec<String>,
    },

    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Conflict(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    /// The AI provider failed or answered with something unusable.
    #[error("AI provider error: {0}")]
    BadGateway(String),

    /// AI is not configured or the provider is rate limiting us.
    #[error("{message}")]
    Unavailable {
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: String,
    details: &'a [String],
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            details: Vec::new(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::Unauthorized => 401,
            Self::NotFound(_) => 404,
            Self::MethodNotAllowed => 405,
            Self::Conflict(_) => 409,
            Self::PayloadTooLarge { .. } => 413,
            Self::BadGateway(_) => 502,
            Self::Unavailable { .. } => 503,
            Self::Internal(_) => 500,
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::Conflict(_) => "conflict",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::BadGateway(_) => "bad_gateway",
            Self::Unavailable { .. } => "service_unavailable",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Render the error body. Internal errors are logged and replaced with a
    /// generic message.
    #[must_use]
    pub fn into_response(self) -> ApiResponse {
        let message = match &self {
            Self::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let details: &[String] = match &self {
            Self::BadRequest { details, .. } => details,
            _ => &[],
        };
        let envelope = ErrorEnvelope {
            error: ErrorBody {
                code: self.code(),
                message,
                details,
            },
        };
        let body = serde_json::to_vec(&envelope).unwrap_or_else(|_| {
            br#"{"error":{"code":"internal_error","message":"internal server error","details":[]}}"#
                .to_vec()
        });

        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Self::Unavailable {
            retry_after_secs: Some(secs),
            ..
        } = &self
        {
            headers.push(("Retry-After".to_string(), secs.to_string()));
        }
        ApiResponse {
            status: self.status(),
            headers,
            body,
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound { .. } => Self::NotFound(e.to_string()),
            DatabaseError::InvalidState(msg) | DatabaseError::Conflict(msg) => Self::Conflict(msg),
            DatabaseError::Validation(msg) => Self::bad_request(msg),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<SchemaError> for ApiError {
    fn from(e: SchemaError) -> Self {
        match e {
            SchemaError::ValidationFailed { .. } | SchemaError::Deserialize(_) => {
                Self::BadRequest {
                    message: "request body failed validation".into(),
                    details: e.details(),
                }
            }
            SchemaError::NotFound(name) => Self::NotFound(format!("schema not found: {name}")),
            SchemaError::Generation(_) => Self::Internal(e.into()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(msg) => Self::bad_request(msg),
        }
    }
}

impl From<SummaryError> for ApiError {
    fn from(e: SummaryError) -> Self {
        if e.is_not_found() {
            Self::NotFound(e.to_string())
        } else {
            Self::bad_request(e.to_string())
        }
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::NotConfigured => Self::Unavailable {
                message: "AI features are not configured".into(),
                retry_after_secs: None,
            },
            AiError::RateLimited { retry_after_secs } => Self::Unavailable {
                message: "AI provider is rate limiting requests".into(),
                retry_after_secs: Some(retry_after_secs),
            },
            AiError::Http(_) | AiError::Api { .. } | AiError::Decode(_) => {
                tracing::warn!(error = %e, "AI provider call failed");
                Self::BadGateway(e.to_string())
            }
        }
    }
}
