//! Service layer orchestrating database mutations with the audit trail.
//!
//! `CasewiseService` wraps `CasewiseDb`. All repo methods are implemented as
//! `impl CasewiseService` blocks in [`crate::repos`].

use casewise_config::DatabaseConfig;

use crate::CasewiseDb;
use crate::error::DatabaseError;

/// Orchestrates database mutations with an audit trail.
///
/// Every mutation method follows this protocol:
/// 1. Check the target exists and the change is allowed
/// 2. Begin transaction
/// 3. Execute SQL
/// 4. Append audit entry (inside transaction)
/// 5. Commit transaction
pub struct CasewiseService {
    db: CasewiseDb,
}

impl CasewiseService {
    /// Create a service over the database described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        Ok(Self {
            db: CasewiseDb::open(config).await?,
        })
    }

    /// Create a service wrapping a local database with default retry settings.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            db: CasewiseDb::open_local(db_path).await?,
        })
    }

    /// Create from an existing `CasewiseDb`.
    #[must_use]
    pub const fn from_db(db: CasewiseDb) -> Self {
        Self { db }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &CasewiseDb {
        &self.db
    }
}
