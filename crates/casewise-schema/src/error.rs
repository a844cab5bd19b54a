//! Errors from schema lookup and request validation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("no schema named '{0}'")]
    NotFound(String),

    /// The value broke one or more schema rules; one message per violation.
    #[error("{} schema violation(s)", errors.len())]
    ValidationFailed { errors: Vec<String> },

    /// The schema accepted the value but serde did not, e.g. `2024-02-31`.
    #[error("invalid value: {0}")]
    Deserialize(String),

    /// A registered schema failed to compile.
    #[error("schema generation failed: {0}")]
    Generation(String),
}

impl SchemaError {
    /// Messages for the `details` array of a 400 response.
    #[must_use]
    pub fn details(&self) -> Vec<String> {
        match self {
            Self::ValidationFailed { errors } => errors.clone(),
            Self::Deserialize(msg) => vec![msg.clone()],
            Self::NotFound(_) | Self::Generation(_) => Vec::new(),
        }
    }
}
