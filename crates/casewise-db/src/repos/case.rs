//! Case repository: CRUD, full-text search, status transitions.

use chrono::Utc;

use casewise_core::audit_detail::{AiDetail, StatusChangedDetail};
use casewise_core::entities::Case;
use casewise_core::enums::{AuditAction, CaseStatus, EntityType};
use casewise_core::ids::PREFIX_CASE;
use casewise_core::requests::CreateCaseRequest;

use crate::error::DatabaseError;
use crate::helpers::{
    format_date, fts_query, get_opt_string, parse_datetime, parse_enum, parse_optional_date,
    to_json,
};
use crate::service::CasewiseService;
use crate::updates::case::CaseUpdate;

const SELECT_COLS: &str = "id, worker_name, worker_email, worker_phone, claim_number, insurer, \
     employer, injury_date, injury_description, status, capacity_summary, rtw_goal, \
     created_at, updated_at";

fn row_to_case(row: &libsql::Row) -> Result<Case, DatabaseError> {
    Ok(Case {
        id: row.get(0)?,
        worker_name: row.get(1)?,
        worker_email: get_opt_string(row, 2)?,
        worker_phone: get_opt_string(row, 3)?,
        claim_number: row.get(4)?,
        insurer: get_opt_string(row, 5)?,
        employer: get_opt_string(row, 6)?,
        injury_date: parse_optional_date(get_opt_string(row, 7)?.as_deref())?,
        injury_description: get_opt_string(row, 8)?,
        status: parse_enum(&row.get::<String>(9)?)?,
        capacity_summary: get_opt_string(row, 10)?,
        rtw_goal: get_opt_string(row, 11)?,
        created_at: parse_datetime(&row.get::<String>(12)?)?,
        updated_at: parse_datetime(&row.get::<String>(13)?)?,
    })
}

fn claim_conflict(err: DatabaseError, claim_number: &str) -> DatabaseError {
    if err.is_unique_violation() {
        DatabaseError::Conflict(format!("claim number '{claim_number}' already exists"))
    } else {
        err
    }
}

/// Filter criteria for case listing.
#[derive(Debug, Default)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    /// Free-text search over worker, claim, insurer, employer, and injury.
    pub query: Option<String>,
    pub limit: Option<u32>,
}

impl CasewiseService {
    /// Open a new case in `open` status.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Conflict` if the claim number is taken.
    pub async fn create_case(&self, req: &CreateCaseRequest) -> Result<Case, DatabaseError> {
        let now = Utc::now();
        let case = Case {
            id: self.db().generate_id(PREFIX_CASE).await?,
            worker_name: req.worker_name.trim().to_string(),
            worker_email: req.worker_email.clone(),
            worker_phone: req.worker_phone.clone(),
            claim_number: req.claim_number.trim().to_string(),
            insurer: req.insurer.clone(),
            employer: req.employer.clone(),
            injury_date: req.injury_date,
            injury_description: req.injury_description.clone(),
            status: CaseStatus::Open,
            capacity_summary: None,
            rtw_goal: req.rtw_goal.clone(),
            created_at: now,
            updated_at: now,
        };

        self.db()
            .transaction(async {
                self.db()
                    .execute_with(
                        &format!(
                            "INSERT INTO cases ({SELECT_COLS})
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
                        ),
                        || {
                            libsql::params![
                                case.id.as_str(),
                                case.worker_name.as_str(),
                                case.worker_email.as_deref(),
                                case.worker_phone.as_deref(),
                                case.claim_number.as_str(),
                                case.insurer.as_deref(),
                                case.employer.as_deref(),
                                case.injury_date.map(format_date),
                                case.injury_description.as_deref(),
                                case.status.as_str(),
                                case.capacity_summary.as_deref(),
                                case.rtw_goal.as_deref(),
                                now.to_rfc3339(),
                                now.to_rfc3339()
                            ]
                        },
                    )
                    .await
                    .map_err(|e| claim_conflict(e, &case.claim_number))?;
                self.record_audit(EntityType::Case, &case.id, AuditAction::Created, None)
                    .await?;
                Ok(())
            })
            .await?;

        tracing::info!(id = %case.id, claim = %case.claim_number, "case created");
        Ok(case)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no case has this ID.
    pub async fn get_case(&self, id: &str) -> Result<Case, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(&format!("SELECT {SELECT_COLS} FROM cases WHERE id = ?1"), || {
                [id]
            })
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Case, id))?;
        row_to_case(&row)
    }

    /// List cases, most recently updated first. With a search query, results
    /// are ranked by FTS relevance instead.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Case>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        let fts = filter.query.as_deref().and_then(fts_query);
        let searching = fts.is_some();
        if let Some(fts) = fts {
            params.push(libsql::Value::Text(fts));
            conditions.push(format!("cases_fts MATCH ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            conditions.push(format!("c.status = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let (from, order) = if searching {
            ("cases_fts JOIN cases c ON c.rowid = cases_fts.rowid", "rank")
        } else {
            ("cases c", "c.updated_at DESC")
        };
        let cols = SELECT_COLS
            .split(", ")
            .map(|col| format!("c.{col}"))
            .collect::<Vec<_>>()
            .join(", ");
        let limit = filter.limit.unwrap_or(50);
        let sql = format!("SELECT {cols} FROM {from} {where_clause} ORDER BY {order} LIMIT {limit}");

        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut cases = Vec::new();
        while let Some(row) = rows.next().await? {
            cases.push(row_to_case(&row)?);
        }
        Ok(cases)
    }

    /// Apply a partial update. An empty update returns the case unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown case or `Conflict` if the new claim
    /// number is taken.
    pub async fn update_case(&self, id: &str, update: CaseUpdate) -> Result<Case, DatabaseError> {
        let clause = update.set_clause();
        if clause.is_empty() {
            return self.get_case(id).await;
        }

        let (sql, params) = clause.into_update("cases", id, Utc::now());
        let claim = update.claim_number.clone().unwrap_or_default();
        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Case, id).await?;
                self.db()
                    .execute_with(&sql, || libsql::params_from_iter(params.clone()))
                    .await
                    .map_err(|e| claim_conflict(e, &claim))?;
                self.record_audit(
                    EntityType::Case,
                    id,
                    AuditAction::Updated,
                    Some(to_json(&update)?),
                )
                .await?;
                Ok(())
            })
            .await?;

        self.get_case(id).await
    }

    /// Move a case to `to` if the state machine allows it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown case or `InvalidState` for a
    /// disallowed transition.
    pub async fn transition_case(
        &self,
        id: &str,
        to: CaseStatus,
        reason: Option<&str>,
    ) -> Result<Case, DatabaseError> {
        self.db()
            .transaction(async {
                let current = self.get_case(id).await?;
                if !current.status.can_transition_to(to) {
                    return Err(DatabaseError::InvalidState(format!(
                        "cannot move case from {} to {to}",
                        current.status
                    )));
                }
                let now = Utc::now();
                self.db()
                    .execute_with(
                        "UPDATE cases SET status = ?1, updated_at = ?2 WHERE id = ?3",
                        || libsql::params![to.as_str(), now.to_rfc3339(), id],
                    )
                    .await?;
                let detail = StatusChangedDetail {
                    from: current.status.as_str().to_string(),
                    to: to.as_str().to_string(),
                    reason: reason.map(String::from),
                };
                self.record_audit(
                    EntityType::Case,
                    id,
                    AuditAction::StatusChanged,
                    Some(to_json(&detail)?),
                )
                .await?;
                tracing::info!(id, from = %current.status, to = %to, "case status changed");
                Ok(())
            })
            .await?;

        self.get_case(id).await
    }

    /// Store an AI-written capacity summary on the case.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown case.
    pub async fn set_capacity_summary(
        &self,
        id: &str,
        summary: &str,
        generated: &AiDetail,
    ) -> Result<Case, DatabaseError> {
        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Case, id).await?;
                self.db()
                    .execute_with(
                        "UPDATE cases SET capacity_summary = ?1, updated_at = ?2 WHERE id = ?3",
                        || libsql::params![summary, Utc::now().to_rfc3339(), id],
                    )
                    .await?;
                self.record_audit(
                    EntityType::Case,
                    id,
                    AuditAction::Generated,
                    Some(to_json(generated)?),
                )
                .await?;
                Ok(())
            })
            .await?;

        self.get_case(id).await
    }

    /// Delete a case and, through foreign-key cascades, everything on it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown case.
    pub async fn delete_case(&self, id: &str) -> Result<(), DatabaseError> {
        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Case, id).await?;
                self.db()
                    .execute_with("DELETE FROM cases WHERE id = ?1", || [id])
                    .await?;
                self.record_audit(EntityType::Case, id, AuditAction::Deleted, None)
                    .await?;
                Ok(())
            })
            .await?;
        tracing::info!(id, "case deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::test_support::helpers::{case_request, create_test_case, test_service};
    use crate::updates::case::CaseUpdateBuilder;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[tokio::test]
    async fn create_and_get() {
        let svc = test_service().await;
        let mut req = case_request("  Dana Whitfield ", "WC-2024-0117");
        req.injury_date = NaiveDate::from_ymd_opt(2024, 3, 2);
        let created = svc.create_case(&req).await.unwrap();

        assert!(created.id.starts_with("cas-"));
        assert_eq!(created.worker_name, "Dana Whitfield");
        assert_eq!(created.status, CaseStatus::Open);

        let fetched = svc.get_case(&created.id).await.unwrap();
        assert_eq!(fetched.claim_number, "WC-2024-0117");
        assert_eq!(fetched.injury_date, NaiveDate::from_ymd_opt(2024, 3, 2));
        assert_eq!(fetched.insurer.as_deref(), Some("Allianz"));
    }

    #[tokio::test]
    async fn duplicate_claim_number_conflicts() {
        let svc = test_service().await;
        svc.create_case(&case_request("Dana", "WC-1")).await.unwrap();
        let err = svc
            .create_case(&case_request("Someone Else", "WC-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)), "{err:?}");

        let all = svc.list_cases(&CaseFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn padded_claim_number_on_update_conflicts() {
        let svc = test_service().await;
        svc.create_case(&case_request("Dana", "WC-1")).await.unwrap();
        let other = svc.create_case(&case_request("Sam", "WC-2")).await.unwrap();

        let req = casewise_core::requests::UpdateCaseRequest {
            claim_number: Some(" WC-1 ".into()),
            ..Default::default()
        };
        let err = svc.update_case(&other.id, req.into()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)), "{err:?}");

        let req = casewise_core::requests::UpdateCaseRequest {
            worker_name: Some("  Sam Ortiz ".into()),
            ..Default::default()
        };
        let renamed = svc.update_case(&other.id, req.into()).await.unwrap();
        assert_eq!(renamed.worker_name, "Sam Ortiz");
        assert_eq!(renamed.claim_number, "WC-2");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let svc = test_service().await;
        let err = svc.get_case("cas-00000000").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_sets_and_clears_fields() {
        let svc = test_service().await;
        let case = create_test_case(&svc, "Dana Whitfield").await;

        let updated = svc
            .update_case(
                &case.id,
                CaseUpdateBuilder::new()
                    .employer(None)
                    .rtw_goal(Some("Pre-injury duties".into()))
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(updated.employer, None);
        assert_eq!(updated.rtw_goal.as_deref(), Some("Pre-injury duties"));
        assert_eq!(updated.insurer.as_deref(), Some("Allianz"));

        let audit = svc
            .query_audit(&AuditFilter {
                entity_id: Some(case.id.clone()),
                action: Some(AuditAction::Updated),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(audit.len(), 1);
        let detail = audit[0].detail.as_ref().unwrap();
        assert_eq!(detail["employer"], serde_json::Value::Null);
        assert!(detail.get("worker_name").is_none());
    }

    #[tokio::test]
    async fn empty_update_is_a_read() {
        let svc = test_service().await;
        let case = create_test_case(&svc, "Dana Whitfield").await;
        let same = svc
            .update_case(&case.id, CaseUpdateBuilder::new().build())
            .await
            .unwrap();
        assert_eq!(same, case);
    }

    #[tokio::test]
    async fn update_to_taken_claim_conflicts() {
        let svc = test_service().await;
        create_test_case(&svc, "Dana").await;
        let other = create_test_case(&svc, "Lee").await;
        let err = svc
            .update_case(
                &other.id,
                CaseUpdateBuilder::new().claim_number("WC-DANA").build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)), "{err:?}");
    }

    #[rstest]
    #[case(CaseStatus::Active, true)]
    #[case(CaseStatus::Closed, true)]
    #[case(CaseStatus::OnHold, false)]
    #[case(CaseStatus::Open, false)]
    #[tokio::test]
    async fn transitions_from_open(#[case] to: CaseStatus, #[case] allowed: bool) {
        let svc = test_service().await;
        let case = create_test_case(&svc, "Dana").await;
        let result = svc.transition_case(&case.id, to, None).await;
        if allowed {
            assert_eq!(result.unwrap().status, to);
        } else {
            assert!(matches!(result, Err(DatabaseError::InvalidState(_))));
        }
    }

    #[tokio::test]
    async fn transition_records_reason() {
        let svc = test_service().await;
        let case = create_test_case(&svc, "Dana").await;
        svc.transition_case(&case.id, CaseStatus::Active, None)
            .await
            .unwrap();
        svc.transition_case(&case.id, CaseStatus::OnHold, Some("Surgery"))
            .await
            .unwrap();

        let audit = svc
            .query_audit(&AuditFilter {
                entity_id: Some(case.id.clone()),
                action: Some(AuditAction::StatusChanged),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(audit.len(), 2);
        let detail: StatusChangedDetail = audit[0].detail_as().unwrap();
        assert_eq!(detail.reason.as_deref(), Some("Surgery"));
        assert_eq!(detail.from, "active");
    }

    #[tokio::test]
    async fn list_filters_by_status_and_search() {
        let svc = test_service().await;
        let dana = create_test_case(&svc, "Dana Whitfield").await;
        let mut lee_req = case_request("Lee Marsh", "WC-LEE");
        lee_req.injury_description = Some("Lower back injury".into());
        let lee = svc.create_case(&lee_req).await.unwrap();
        svc.transition_case(&lee.id, CaseStatus::Active, None)
            .await
            .unwrap();

        let active = svc
            .list_cases(&CaseFilter {
                status: Some(CaseStatus::Active),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, lee.id);

        let shoulder = svc
            .list_cases(&CaseFilter {
                query: Some("shoul".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(shoulder.len(), 1);
        assert_eq!(shoulder[0].id, dana.id);

        let none = svc
            .list_cases(&CaseFilter {
                query: Some("whitfield".into()),
                status: Some(CaseStatus::Active),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn search_sees_updates() {
        let svc = test_service().await;
        let case = create_test_case(&svc, "Dana").await;
        svc.update_case(
            &case.id,
            CaseUpdateBuilder::new()
                .insurer(Some("Zurich".into()))
                .build(),
        )
        .await
        .unwrap();

        let found = svc
            .list_cases(&CaseFilter {
                query: Some("zurich".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        let stale = svc
            .list_cases(&CaseFilter {
                query: Some("allianz".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(stale.is_empty());
    }

    #[tokio::test]
    async fn capacity_summary_is_audited_as_generated() {
        let svc = test_service().await;
        let case = create_test_case(&svc, "Dana").await;
        let detail = AiDetail {
            model: "gpt-4o-mini".into(),
            chars: 42,
            duration_ms: 10,
        };
        let updated = svc
            .set_capacity_summary(&case.id, "Restricted to light duties.", &detail)
            .await
            .unwrap();
        assert_eq!(
            updated.capacity_summary.as_deref(),
            Some("Restricted to light duties.")
        );
        let audit = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::Generated),
                ..Default::default()
            })
            .await
            .unwrap();
        let recorded: AiDetail = audit[0].detail_as().unwrap();
        assert_eq!(recorded.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn delete_removes_case_and_keeps_audit() {
        let svc = test_service().await;
        let case = create_test_case(&svc, "Dana").await;
        svc.delete_case(&case.id).await.unwrap();

        assert!(matches!(
            svc.get_case(&case.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
        assert!(matches!(
            svc.delete_case(&case.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
        let audit = svc
            .query_audit(&AuditFilter {
                entity_id: Some(case.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(audit.len(), 2);
    }
}
