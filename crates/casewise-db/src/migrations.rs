//! Embedded SQL migrations, applied on every open.
//!
//! Every statement is written `IF NOT EXISTS`, so re-applying a migration to
//! an existing database is a no-op.

use crate::CasewiseDb;
use crate::error::DatabaseError;

/// `(name, sql)` in application order.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    include_str!("../migrations/001_initial.sql"),
)];

impl CasewiseDb {
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        for (name, sql) in MIGRATIONS {
            self.conn
                .execute_batch(sql)
                .await
                .map_err(|e| DatabaseError::Migration(format!("{name}: {e}")))?;
            tracing::trace!(migration = name, "applied");
        }
        Ok(())
    }
}
