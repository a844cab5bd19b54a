//! Report repository. Drafts are editable; finalized reports are immutable.

use chrono::Utc;

use casewise_core::audit_detail::{AiDetail, StatusChangedDetail};
use casewise_core::entities::Report;
use casewise_core::enums::{AuditAction, EntityType, ReportStatus, ReportType};
use casewise_core::ids::PREFIX_REPORT;

use crate::error::DatabaseError;
use crate::helpers::{
    get_opt_string, parse_datetime, parse_enum, parse_optional_datetime, to_json,
};
use crate::service::CasewiseService;
use crate::updates::report::ReportUpdate;

const SELECT_COLS: &str = "id, case_id, report_type, title, content, status, model, \
     created_at, updated_at, finalized_at";

fn row_to_report(row: &libsql::Row) -> Result<Report, DatabaseError> {
    Ok(Report {
        id: row.get(0)?,
        case_id: row.get(1)?,
        report_type: parse_enum(&row.get::<String>(2)?)?,
        title: row.get(3)?,
        content: row.get(4)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        model: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
        finalized_at: parse_optional_datetime(get_opt_string(row, 9)?.as_deref())?,
    })
}

fn ensure_draft(report: &Report) -> Result<(), DatabaseError> {
    if report.status == ReportStatus::Final {
        Err(DatabaseError::InvalidState(format!(
            "report {} is final",
            report.id
        )))
    } else {
        Ok(())
    }
}

/// A report ready to be stored as a draft.
#[derive(Debug)]
pub struct NewReport<'a> {
    pub case_id: &'a str,
    pub report_type: ReportType,
    pub title: &'a str,
    pub content: &'a str,
    /// Set when a model wrote the draft.
    pub generated: Option<&'a AiDetail>,
}

/// Filter criteria for report listing.
#[derive(Debug, Default)]
pub struct ReportFilter {
    pub case_id: Option<String>,
    pub report_type: Option<ReportType>,
    pub status: Option<ReportStatus>,
    pub limit: Option<u32>,
}

impl CasewiseService {
    /// Store a new draft report.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the case does not exist.
    pub async fn create_report(&self, new: &NewReport<'_>) -> Result<Report, DatabaseError> {
        let now = Utc::now();
        let report = Report {
            id: self.db().generate_id(PREFIX_REPORT).await?,
            case_id: new.case_id.to_string(),
            report_type: new.report_type,
            title: new.title.trim().to_string(),
            content: new.content.to_string(),
            status: ReportStatus::Draft,
            model: new.generated.map(|ai| ai.model.clone()),
            created_at: now,
            updated_at: now,
            finalized_at: None,
        };

        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Case, &report.case_id).await?;
                self.db()
                    .execute_with(
                        &format!(
                            "INSERT INTO reports ({SELECT_COLS})
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                        ),
                        || {
                            libsql::params![
                                report.id.as_str(),
                                report.case_id.as_str(),
                                report.report_type.as_str(),
                                report.title.as_str(),
                                report.content.as_str(),
                                report.status.as_str(),
                                report.model.as_deref(),
                                now.to_rfc3339(),
                                now.to_rfc3339(),
                                libsql::Value::Null
                            ]
                        },
                    )
                    .await?;
                let (action, detail) = match new.generated {
                    Some(ai) => (AuditAction::Generated, to_json(ai)?),
                    None => (
                        AuditAction::Created,
                        serde_json::json!({ "report_type": report.report_type }),
                    ),
                };
                self.record_audit(EntityType::Report, &report.id, action, Some(detail))
                    .await?;
                Ok(())
            })
            .await?;

        tracing::info!(id = %report.id, case = %report.case_id, kind = %report.report_type, "report drafted");
        Ok(report)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no report has this ID.
    pub async fn get_report(&self, id: &str) -> Result<Report, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} FROM reports WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Report, id))?;
        row_to_report(&row)
    }

    /// List reports, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref case_id) = filter.case_id {
            params.push(libsql::Value::Text(case_id.clone()));
            conditions.push(format!("case_id = ?{}", params.len()));
        }
        if let Some(kind) = filter.report_type {
            params.push(libsql::Value::Text(kind.as_str().to_string()));
            conditions.push(format!("report_type = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            conditions.push(format!("status = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit = filter.limit.unwrap_or(50);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM reports {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut reports = Vec::new();
        while let Some(row) = rows.next().await? {
            reports.push(row_to_report(&row)?);
        }
        Ok(reports)
    }

    /// Edit a draft report.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown report or `InvalidState` if it is final.
    pub async fn update_report(
        &self,
        id: &str,
        update: ReportUpdate,
    ) -> Result<Report, DatabaseError> {
        let clause = update.set_clause();
        if clause.is_empty() {
            return self.get_report(id).await;
        }

        let (sql, params) = clause.into_update("reports", id, Utc::now());
        self.db()
            .transaction(async {
                ensure_draft(&self.get_report(id).await?)?;
                self.db()
                    .execute_with(&sql, || libsql::params_from_iter(params.clone()))
                    .await?;
                self.record_audit(
                    EntityType::Report,
                    id,
                    AuditAction::Updated,
                    Some(serde_json::json!({ "fields": update.changed_fields() })),
                )
                .await?;
                Ok(())
            })
            .await?;

        self.get_report(id).await
    }

    /// Mark a draft final. Final reports accept no further edits.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown report or `InvalidState` if it is
    /// already final.
    pub async fn finalize_report(&self, id: &str) -> Result<Report, DatabaseError> {
        self.db()
            .transaction(async {
                let current = self.get_report(id).await?;
                if !current.status.can_transition_to(ReportStatus::Final) {
                    return Err(DatabaseError::InvalidState(format!(
                        "report {id} is already final"
                    )));
                }
                let now = Utc::now().to_rfc3339();
                self.db()
                    .execute_with(
                        "UPDATE reports SET status = ?1, finalized_at = ?2, updated_at = ?2
                         WHERE id = ?3",
                        || libsql::params![ReportStatus::Final.as_str(), now.as_str(), id],
                    )
                    .await?;
                let detail = StatusChangedDetail {
                    from: current.status.as_str().to_string(),
                    to: ReportStatus::Final.as_str().to_string(),
                    reason: None,
                };
                self.record_audit(
                    EntityType::Report,
                    id,
                    AuditAction::StatusChanged,
                    Some(to_json(&detail)?),
                )
                .await?;
                Ok(())
            })
            .await?;

        self.get_report(id).await
    }

    /// Delete a draft report.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown report or `InvalidState` if it is final.
    pub async fn delete_report(&self, id: &str) -> Result<(), DatabaseError> {
        self.db()
            .transaction(async {
                ensure_draft(&self.get_report(id).await?)?;
                self.db()
                    .execute_with("DELETE FROM reports WHERE id = ?1", || [id])
                    .await?;
                self.record_audit(EntityType::Report, id, AuditAction::Deleted, None)
                    .await?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::test_support::helpers::{create_test_case, test_service};
    use crate::updates::report::ReportUpdateBuilder;
    use pretty_assertions::assert_eq;

    fn ai() -> AiDetail {
        AiDetail {
            model: "gpt-4o-mini".into(),
            chars: 30,
            duration_ms: 1_200,
        }
    }

    async fn draft(svc: &CasewiseService, case_id: &str) -> Report {
        let detail = ai();
        svc.create_report(&NewReport {
            case_id,
            report_type: ReportType::ProgressReport,
            title: "Progress Report",
            content: "## Progress\nSteady improvement.\n",
            generated: Some(&detail),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_records_model_and_generated_audit() {
        let svc = test_service().await;
        let case = create_test_case(&svc, "Dana").await;
        let report = draft(&svc, &case.id).await;

        assert_eq!(report.status, ReportStatus::Draft);
        assert_eq!(report.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(svc.get_report(&report.id).await.unwrap(), report);

        let audit = svc
            .query_audit(&AuditFilter {
                entity_id: Some(report.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(audit[0].action, AuditAction::Generated);
    }

    #[tokio::test]
    async fn edit_then_finalize_then_frozen() {
        let svc = test_service().await;
        let case = create_test_case(&svc, "Dana").await;
        let report = draft(&svc, &case.id).await;

        let edited = svc
            .update_report(
                &report.id,
                ReportUpdateBuilder::new()
                    .content("## Progress\nReturned to light duties.\n")
                    .build(),
            )
            .await
            .unwrap();
        assert!(edited.content.contains("light duties"));

        let final_report = svc.finalize_report(&report.id).await.unwrap();
        assert_eq!(final_report.status, ReportStatus::Final);
        assert!(final_report.finalized_at.is_some());

        let err = svc
            .update_report(&report.id, ReportUpdateBuilder::new().title("New").build())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));
        assert!(matches!(
            svc.finalize_report(&report.id).await,
            Err(DatabaseError::InvalidState(_))
        ));
        assert!(matches!(
            svc.delete_report(&report.id).await,
            Err(DatabaseError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn list_filters() {
        let svc = test_service().await;
        let a = create_test_case(&svc, "Dana").await;
        let b = create_test_case(&svc, "Lee").await;
        let first = draft(&svc, &a.id).await;
        svc.create_report(&NewReport {
            case_id: &a.id,
            report_type: ReportType::RtwPlan,
            title: "Return to Work Plan",
            content: "## Goal\nFull duties.\n",
            generated: None,
        })
        .await
        .unwrap();
        draft(&svc, &b.id).await;
        svc.finalize_report(&first.id).await.unwrap();

        let for_a = svc
            .list_reports(&ReportFilter {
                case_id: Some(a.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[0].report_type, ReportType::RtwPlan);

        let progress = svc
            .list_reports(&ReportFilter {
                report_type: Some(ReportType::ProgressReport),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(progress.len(), 2);

        let finals = svc
            .list_reports(&ReportFilter {
                status: Some(ReportStatus::Final),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].id, first.id);
    }

    #[tokio::test]
    async fn missing_case_is_not_found() {
        let svc = test_service().await;
        let err = svc
            .create_report(&NewReport {
                case_id: "cas-00000000",
                report_type: ReportType::ClosureReport,
                title: "Closure",
                content: "",
                generated: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
