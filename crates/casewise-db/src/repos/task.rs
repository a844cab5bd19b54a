//! Task repository: CRUD, overdue filtering, status transitions.

use chrono::{NaiveDate, Utc};

use casewise_core::audit_detail::StatusChangedDetail;
use casewise_core::entities::Task;
use casewise_core::enums::{AuditAction, EntityType, TaskStatus};
use casewise_core::ids::PREFIX_TASK;
use casewise_core::requests::CreateTaskRequest;

use crate::error::DatabaseError;
use crate::helpers::{
    format_date, get_opt_string, parse_datetime, parse_enum, parse_optional_date,
    parse_optional_datetime, to_json,
};
use crate::service::CasewiseService;
use crate::updates::task::TaskUpdate;

const SELECT_COLS: &str = "id, case_id, description, due_date, status, assigned_participant_id, \
     completed_at, created_at, updated_at";

const OUTSTANDING: &str = "('open', 'in_progress', 'blocked')";

fn row_to_task(row: &libsql::Row) -> Result<Task, DatabaseError> {
    Ok(Task {
        id: row.get(0)?,
        case_id: row.get(1)?,
        description: row.get(2)?,
        due_date: parse_optional_date(get_opt_string(row, 3)?.as_deref())?,
        status: parse_enum(&row.get::<String>(4)?)?,
        assigned_participant_id: get_opt_string(row, 5)?,
        completed_at: parse_optional_datetime(get_opt_string(row, 6)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

/// Filter criteria for task listing.
#[derive(Debug, Default)]
pub struct TaskFilter {
    pub case_id: Option<String>,
    pub status: Option<TaskStatus>,
    /// Only open, in-progress, or blocked tasks.
    pub outstanding: bool,
    /// Only outstanding tasks due before this date.
    pub overdue_as_of: Option<NaiveDate>,
    pub limit: Option<u32>,
}

impl CasewiseService {
    /// # Errors
    ///
    /// Returns `NotFound` if the case does not exist, or `Validation` if the
    /// assignee is not a participant on the same case.
    pub async fn create_task(&self, req: &CreateTaskRequest) -> Result<Task, DatabaseError> {
        let now = Utc::now();
        let task = Task {
            id: self.db().generate_id(PREFIX_TASK).await?,
            case_id: req.case_id.clone(),
            description: req.description.trim().to_string(),
            due_date: req.due_date,
            status: TaskStatus::Open,
            assigned_participant_id: req.assigned_participant_id.clone(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Case, &task.case_id).await?;
                if let Some(ref assignee) = task.assigned_participant_id {
                    self.ensure_participant_in_case(assignee, &task.case_id)
                        .await?;
                }
                self.db()
                    .execute_with(
                        &format!(
                            "INSERT INTO tasks ({SELECT_COLS})
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                        ),
                        || {
                            libsql::params![
                                task.id.as_str(),
                                task.case_id.as_str(),
                                task.description.as_str(),
                                task.due_date.map(format_date),
                                task.status.as_str(),
                                task.assigned_participant_id.as_deref(),
                                libsql::Value::Null,
                                now.to_rfc3339(),
                                now.to_rfc3339()
                            ]
                        },
                    )
                    .await?;
                self.record_audit(
                    EntityType::Task,
                    &task.id,
                    AuditAction::Created,
                    Some(serde_json::json!({ "case_id": task.case_id })),
                )
                .await?;
                Ok(())
            })
            .await?;

        Ok(task)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no task has this ID.
    pub async fn get_task(&self, id: &str) -> Result<Task, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(&format!("SELECT {SELECT_COLS} FROM tasks WHERE id = ?1"), || {
                [id]
            })
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Task, id))?;
        row_to_task(&row)
    }

    /// List tasks, soonest due first; tasks without a due date sort last.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref case_id) = filter.case_id {
            params.push(libsql::Value::Text(case_id.clone()));
            conditions.push(format!("case_id = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            conditions.push(format!("status = ?{}", params.len()));
        }
        if filter.outstanding || filter.overdue_as_of.is_some() {
            conditions.push(format!("status IN {OUTSTANDING}"));
        }
        if let Some(today) = filter.overdue_as_of {
            params.push(libsql::Value::Text(format_date(today)));
            conditions.push(format!(
                "due_date IS NOT NULL AND due_date < ?{}",
                params.len()
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit = filter.limit.unwrap_or(50);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM tasks {where_clause}
             ORDER BY due_date IS NULL, due_date, created_at LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next().await? {
            tasks.push(row_to_task(&row)?);
        }
        Ok(tasks)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the task does not exist, or `Validation` if a new
    /// assignee is not on the task's case.
    pub async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task, DatabaseError> {
        let clause = update.set_clause();
        if clause.is_empty() {
            return self.get_task(id).await;
        }

        let (sql, params) = clause.into_update("tasks", id, Utc::now());
        self.db()
            .transaction(async {
                let current = self.get_task(id).await?;
                if let Some(Some(ref assignee)) = update.assigned_participant_id {
                    self.ensure_participant_in_case(assignee, &current.case_id)
                        .await?;
                }
                self.db()
                    .execute_with(&sql, || libsql::params_from_iter(params.clone()))
                    .await?;
                self.record_audit(
                    EntityType::Task,
                    id,
                    AuditAction::Updated,
                    Some(to_json(&update)?),
                )
                .await?;
                Ok(())
            })
            .await?;

        self.get_task(id).await
    }

    /// Move a task to `to`. Entering `done` stamps `completed_at`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown task or `InvalidState` for a
    /// disallowed transition.
    pub async fn transition_task(
        &self,
        id: &str,
        to: TaskStatus,
        reason: Option<&str>,
    ) -> Result<Task, DatabaseError> {
        self.db()
            .transaction(async {
                let current = self.get_task(id).await?;
                if !current.status.can_transition_to(to) {
                    return Err(DatabaseError::InvalidState(format!(
                        "cannot move task from {} to {to}",
                        current.status
                    )));
                }
                let now = Utc::now();
                let completed_at = (to == TaskStatus::Done).then(|| now.to_rfc3339());
                self.db()
                    .execute_with(
                        "UPDATE tasks SET status = ?1, completed_at = ?2, updated_at = ?3
                         WHERE id = ?4",
                        || {
                            libsql::params![
                                to.as_str(),
                                completed_at.as_deref(),
                                now.to_rfc3339(),
                                id
                            ]
                        },
                    )
                    .await?;
                let detail = StatusChangedDetail {
                    from: current.status.as_str().to_string(),
                    to: to.as_str().to_string(),
                    reason: reason.map(String::from),
                };
                self.record_audit(
                    EntityType::Task,
                    id,
                    AuditAction::StatusChanged,
                    Some(to_json(&detail)?),
                )
                .await?;
                Ok(())
            })
            .await?;

        self.get_task(id).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the task does not exist.
    pub async fn delete_task(&self, id: &str) -> Result<(), DatabaseError> {
        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Task, id).await?;
                self.db()
                    .execute_with("DELETE FROM tasks WHERE id = ?1", || [id])
                    .await?;
                self.record_audit(EntityType::Task, id, AuditAction::Deleted, None)
                    .await?;
                Ok(())
            })
            .await
    }
}
