//! Audit trail repository.
//!
//! Append-only audit entries recording every mutation. Entries carry no
//! foreign key, so they survive deletion of the entity they describe.

use chrono::Utc;

use casewise_core::entities::AuditEntry;
use casewise_core::enums::{AuditAction, EntityType};
use casewise_core::ids::PREFIX_AUDIT;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_json};
use crate::service::CasewiseService;

/// Filter criteria for audit queries.
#[derive(Debug, Default)]
pub struct AuditFilter {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub action: Option<AuditAction>,
    pub limit: Option<u32>,
}

impl CasewiseService {
    /// Append an audit entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn append_audit(&self, entry: &AuditEntry) -> Result<(), DatabaseError> {
        let detail = entry.detail.as_ref().map(ToString::to_string);
        self.db()
            .execute_with(
                "INSERT INTO audit_trail (id, entity_type, entity_id, action, detail, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                || {
                    libsql::params![
                        entry.id.as_str(),
                        entry.entity_type.as_str(),
                        entry.entity_id.as_str(),
                        entry.action.as_str(),
                        detail.as_deref(),
                        entry.created_at.to_rfc3339()
                    ]
                },
            )
            .await?;
        Ok(())
    }

    /// Build and append an audit entry stamped now. Called by every mutation
    /// method from inside its transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if ID generation or the INSERT fails.
    pub async fn record_audit(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        action: AuditAction,
        detail: Option<serde_json::Value>,
    ) -> Result<AuditEntry, DatabaseError> {
        let entry = AuditEntry {
            id: self.db().generate_id(PREFIX_AUDIT).await?,
            entity_type,
            entity_id: entity_id.to_string(),
            action,
            detail,
            created_at: Utc::now(),
        };
        self.append_audit(&entry).await?;
        tracing::debug!(
            entity = entity_type.as_str(),
            id = entity_id,
            action = action.as_str(),
            "audit"
        );
        Ok(entry)
    }

    /// Query audit entries with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(et) = filter.entity_type {
            params.push(libsql::Value::Text(et.as_str().to_string()));
            conditions.push(format!("entity_type = ?{}", params.len()));
        }
        if let Some(ref eid) = filter.entity_id {
            params.push(libsql::Value::Text(eid.clone()));
            conditions.push(format!("entity_id = ?{}", params.len()));
        }
        if let Some(action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT id, entity_type, entity_id, action, detail, created_at
             FROM audit_trail {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next().await? {
            entries.push(AuditEntry {
                id: row.get::<String>(0)?,
                entity_type: parse_enum(&row.get::<String>(1)?)?,
                entity_id: row.get::<String>(2)?,
                action: parse_enum(&row.get::<String>(3)?)?,
                detail: parse_optional_json(get_opt_string(&row, 4)?.as_deref())?,
                created_at: parse_datetime(&row.get::<String>(5)?)?,
            });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn record_and_filter() {
        let svc = test_service().await;
        svc.record_audit(EntityType::Case, "cas-1", AuditAction::Created, None)
            .await
            .unwrap();
        svc.record_audit(
            EntityType::Case,
            "cas-1",
            AuditAction::StatusChanged,
            Some(serde_json::json!({"from": "open", "to": "active", "reason": null})),
        )
        .await
        .unwrap();
        svc.record_audit(EntityType::Task, "tsk-1", AuditAction::Created, None)
            .await
            .unwrap();

        let all = svc.query_audit(&AuditFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].entity_id, "tsk-1");

        let case_only = svc
            .query_audit(&AuditFilter {
                entity_type: Some(EntityType::Case),
                entity_id: Some("cas-1".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(case_only.len(), 2);

        let transitions = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::StatusChanged),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].detail.as_ref().unwrap()["to"], "active");
    }

    #[tokio::test]
    async fn limit_applies() {
        let svc = test_service().await;
        for _ in 0..5 {
            svc.record_audit(EntityType::Case, "cas-1", AuditAction::Updated, None)
                .await
                .unwrap();
        }
        let entries = svc
            .query_audit(&AuditFilter {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
    }
}
