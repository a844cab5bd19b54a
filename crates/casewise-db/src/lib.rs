//! # casewise-db
//!
//! libSQL persistence for Casewise.
//!
//! Holds every case file record: cases, participants, interactions and their
//! participant links, tasks, reports, the audit trail, and login sessions.
//! All statements go through [`CasewiseDb::execute_with`] /
//! [`CasewiseDb::query_with`], which retry transient lock and connection
//! errors with bounded backoff. Multi-statement mutations run inside
//! [`CasewiseDb::transaction`].
//!
//! Uses the `libsql` crate (C `SQLite` fork), which provides native FTS5 for
//! case and interaction search.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod retry;
pub mod service;
pub mod updates;

#[cfg(test)]
mod test_support;

use std::future::Future;

use casewise_config::DatabaseConfig;
use error::DatabaseError;
use libsql::Builder;
use libsql::params::IntoParams;
use retry::{RetryConfig, is_transient_error, with_retry};

/// Central database handle for all Casewise state operations.
///
/// Wraps a libSQL database and a single shared connection. Writers that
/// issue more than one statement serialize on an async mutex so their
/// `BEGIN ... COMMIT` window is not interleaved with another writer's.
///
/// Reads do not take that mutex. Repositories read inside their own
/// transactions (existence checks, re-fetching what they just wrote) and the
/// mutex is not reentrant. Because the connection is shared, a read issued
/// while another task's transaction is open sees that transaction's
/// uncommitted rows, including rows it later rolls back. Callers that need
/// a committed view must read inside [`Self::transaction`].
pub struct CasewiseDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    retry: RetryConfig,
    write_lock: tokio::sync::Mutex<()>,
}

impl CasewiseDb {
    /// Open a local database at the given path with default retry settings.
    ///
    /// Runs migrations automatically on open. Pass `":memory:"` for a
    /// throwaway database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        Self::open_with_retry(path, RetryConfig::default()).await
    }

    /// Open the database described by `config`, creating its parent
    /// directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created, the
    /// database cannot be opened, or migrations fail.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        if let Some(dir) = config.parent_dir() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                DatabaseError::Other(anyhow::anyhow!(
                    "cannot create database directory {}: {e}",
                    dir.display()
                ))
            })?;
        }
        Self::open_with_retry(&config.path, RetryConfig::from(config)).await
    }

    async fn open_with_retry(path: &str, retry: RetryConfig) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let casewise_db = Self {
            db,
            conn,
            retry,
            write_lock: tokio::sync::Mutex::new(()),
        };
        casewise_db.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(casewise_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Retry settings in effect.
    #[must_use]
    pub const fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Execute a statement, retrying transient failures.
    ///
    /// `params` is called once per attempt because libSQL consumes them.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` with the last error once retries are
    /// exhausted or on the first non-transient error.
    pub async fn execute_with<F, P>(&self, sql: &str, params: F) -> Result<u64, DatabaseError>
    where
        F: Fn() -> P,
        P: IntoParams,
    {
        let affected = with_retry(&self.retry, is_transient_error, || {
            self.conn.execute(sql, params())
        })
        .await?;
        Ok(affected)
    }

    /// Run a query, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Same as [`Self::execute_with`].
    pub async fn query_with<F, P>(&self, sql: &str, params: F) -> Result<libsql::Rows, DatabaseError>
    where
        F: Fn() -> P,
        P: IntoParams,
    {
        let rows = with_retry(&self.retry, is_transient_error, || {
            self.conn.query(sql, params())
        })
        .await?;
        Ok(rows)
    }

    /// Run `work` inside `BEGIN IMMEDIATE ... COMMIT`, rolling back if it
    /// fails.
    ///
    /// Must not be nested: the write lock is not reentrant.
    ///
    /// # Errors
    ///
    /// Returns the error from `work`, or a `DatabaseError` from BEGIN/COMMIT.
    pub async fn transaction<T, Fut>(&self, work: Fut) -> Result<T, DatabaseError>
    where
        Fut: Future<Output = Result<T, DatabaseError>>,
    {
        let _guard = self.write_lock.lock().await;

        if !self.conn.is_autocommit() {
            tracing::warn!("found an abandoned transaction, rolling it back");
            self.conn.execute("ROLLBACK", ()).await?;
        }
        self.execute_with("BEGIN IMMEDIATE", || ()).await?;

        match work.await {
            Ok(value) => {
                self.execute_with("COMMIT", || ()).await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute("ROLLBACK", ()).await {
                    tracing::error!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"cas-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .query_with(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                || (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    /// Cheap liveness probe for the health endpoint.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the connection cannot answer `SELECT 1`.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        let mut rows = self.query_with("SELECT 1", || ()).await?;
        rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(())
    }
}
