//! Database error types for casewise-db.

use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned data that could not be decoded.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A referenced entity does not exist.
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// The entity is in a state that forbids the operation (bad status
    /// transition, edit of a finalized report).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A uniqueness constraint would be violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input is well-formed but inconsistent with stored data (e.g. a
    /// participant from a different case).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(entity_type: casewise_core::enums::EntityType, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.as_str().to_string(),
            id: id.to_string(),
        }
    }

    /// Whether this wraps a SQLite `UNIQUE` constraint failure.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::LibSql(e) if e.to_string().contains("UNIQUE constraint failed"))
    }
}
