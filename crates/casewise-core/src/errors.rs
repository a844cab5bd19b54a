//! Errors raised by `casewise-core` itself.
//!
//! Storage, schema, summary, and AI failures have their own enums next to
//! the code that raises them; `casewise-server` maps all of them to HTTP
//! statuses.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A request field is missing, blank, too long, or inconsistent with
    /// another field. The message names the field.
    #[error("{0}")]
    Validation(String),
}
