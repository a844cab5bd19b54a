//! Login session storage backing the session cookie.
//!
//! Sessions are not domain entities and are not audited.

use chrono::{Duration, Utc};

use casewise_core::entities::AuthSession;

use crate::error::DatabaseError;
use crate::helpers::parse_datetime;
use crate::service::CasewiseService;

impl CasewiseService {
    /// Store a new session for `token`, valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the token already exists.
    pub async fn create_auth_session(
        &self,
        token: &str,
        ttl: Duration,
    ) -> Result<AuthSession, DatabaseError> {
        let now = Utc::now();
        let session = AuthSession {
            token: token.to_string(),
            created_at: now,
            expires_at: now + ttl,
        };
        self.db()
            .transaction(async {
                self.db()
                    .execute_with(
                        "INSERT INTO auth_sessions (token, created_at, expires_at) VALUES (?1, ?2, ?3)",
                        || {
                            libsql::params![
                                session.token.as_str(),
                                session.created_at.to_rfc3339(),
                                session.expires_at.to_rfc3339()
                            ]
                        },
                    )
                    .await
                    .map_err(|e| {
                        if e.is_unique_violation() {
                            DatabaseError::Conflict("session token collision".into())
                        } else {
                            e
                        }
                    })?;
                Ok(())
            })
            .await?;
        Ok(session)
    }

    /// The session for `token` if it exists and has not expired.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_valid_session(
        &self,
        token: &str,
    ) -> Result<Option<AuthSession>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                "SELECT token, created_at, expires_at FROM auth_sessions WHERE token = ?1",
                || [token],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let session = AuthSession {
            token: row.get(0)?,
            created_at: parse_datetime(&row.get::<String>(1)?)?,
            expires_at: parse_datetime(&row.get::<String>(2)?)?,
        };
        Ok((!session.is_expired(Utc::now())).then_some(session))
    }

    /// Remove a session. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the DELETE fails.
    pub async fn delete_auth_session(&self, token: &str) -> Result<bool, DatabaseError> {
        let removed = self
            .db()
            .transaction(async {
                self.db()
                    .execute_with("DELETE FROM auth_sessions WHERE token = ?1", || [token])
                    .await
            })
            .await?;
        Ok(removed > 0)
    }

    /// Drop every expired session. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the DELETE fails.
    pub async fn purge_expired_sessions(&self) -> Result<u64, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let removed = self
            .db()
            .transaction(async {
                self.db()
                    .execute_with("DELETE FROM auth_sessions WHERE expires_at <= ?1", || {
                        [now.as_str()]
                    })
                    .await
            })
            .await?;
        if removed > 0 {
            tracing::debug!(removed, "purged expired sessions");
        }
        Ok(removed)
    }
}
