//! Errors raised while loading or checking Casewise configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provider failed to parse, or a value has the wrong type.
    #[error("failed to load configuration: {0}")]
    Figment(#[from] figment::Error),

    /// A section needed at startup is missing required values.
    #[error("[{section}] is not configured: {hint}")]
    NotConfigured { section: String, hint: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
