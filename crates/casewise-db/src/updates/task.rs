//! Task update builder.
//!
//! Status changes go through `transition_task`, never through an update.

use chrono::NaiveDate;
use serde::Serialize;

use casewise_core::requests::UpdateTaskRequest;

use super::{SetClause, trimmed};

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_participant_id: Option<Option<String>>,
}

impl TaskUpdate {
    pub(crate) fn set_clause(&self) -> SetClause {
        let mut clause = SetClause::default();
        clause.text("description", self.description.as_ref());
        clause.nullable_date("due_date", self.due_date.as_ref());
        clause.nullable_text(
            "assigned_participant_id",
            self.assigned_participant_id.as_ref(),
        );
        clause
    }
}

impl From<UpdateTaskRequest> for TaskUpdate {
    fn from(req: UpdateTaskRequest) -> Self {
        Self {
            description: trimmed(req.description),
            due_date: req.due_date,
            assigned_participant_id: req.assigned_participant_id,
        }
    }
}

pub struct TaskUpdateBuilder(TaskUpdate);

impl TaskUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(TaskUpdate::default())
    }

    #[must_use]
    pub fn description(mut self, val: impl Into<String>) -> Self {
        self.0.description = Some(val.into());
        self
    }

    #[must_use]
    pub fn due_date(mut self, val: Option<NaiveDate>) -> Self {
        self.0.due_date = Some(val);
        self
    }

    #[must_use]
    pub fn assigned_participant_id(mut self, val: Option<String>) -> Self {
        self.0.assigned_participant_id = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> TaskUpdate {
        self.0
    }
}

impl Default for TaskUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
