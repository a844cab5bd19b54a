//! Case update builder.

use chrono::NaiveDate;
use serde::Serialize;

use casewise_core::requests::UpdateCaseRequest;

use super::{SetClause, trimmed};

#[derive(Debug, Clone, Default, Serialize)]
pub struct CaseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_email: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurer: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injury_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injury_description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_summary: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtw_goal: Option<Option<String>>,
}

impl CaseUpdate {
    pub(crate) fn set_clause(&self) -> SetClause {
        let mut clause = SetClause::default();
        clause.text("worker_name", self.worker_name.as_ref());
        clause.text("claim_number", self.claim_number.as_ref());
        clause.nullable_text("worker_email", self.worker_email.as_ref());
        clause.nullable_text("worker_phone", self.worker_phone.as_ref());
        clause.nullable_text("insurer", self.insurer.as_ref());
        clause.nullable_text("employer", self.employer.as_ref());
        clause.nullable_date("injury_date", self.injury_date.as_ref());
        clause.nullable_text("injury_description", self.injury_description.as_ref());
        clause.nullable_text("capacity_summary", self.capacity_summary.as_ref());
        clause.nullable_text("rtw_goal", self.rtw_goal.as_ref());
        clause
    }
}

impl From<UpdateCaseRequest> for CaseUpdate {
    fn from(req: UpdateCaseRequest) -> Self {
        Self {
            worker_name: trimmed(req.worker_name),
            claim_number: trimmed(req.claim_number),
            worker_email: req.worker_email,
            worker_phone: req.worker_phone,
            insurer: req.insurer,
            employer: req.employer,
            injury_date: req.injury_date,
            injury_description: req.injury_description,
            capacity_summary: req.capacity_summary,
            rtw_goal: req.rtw_goal,
        }
    }
}

pub struct CaseUpdateBuilder(CaseUpdate);

impl CaseUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(CaseUpdate::default())
    }

    #[must_use]
    pub fn worker_name(mut self, val: impl Into<String>) -> Self {
        self.0.worker_name = Some(val.into());
        self
    }

    #[must_use]
    pub fn claim_number(mut self, val: impl Into<String>) -> Self {
        self.0.claim_number = Some(val.into());
        self
    }

    #[must_use]
    pub fn insurer(mut self, val: Option<String>) -> Self {
        self.0.insurer = Some(val);
        self
    }

    #[must_use]
    pub fn employer(mut self, val: Option<String>) -> Self {
        self.0.employer = Some(val);
        self
    }

    #[must_use]
    pub fn injury_date(mut self, val: Option<NaiveDate>) -> Self {
        self.0.injury_date = Some(val);
        self
    }

    #[must_use]
    pub fn capacity_summary(mut self, val: Option<String>) -> Self {
        self.0.capacity_summary = Some(val);
        self
    }

    #[must_use]
    pub fn rtw_goal(mut self, val: Option<String>) -> Self {
        self.0.rtw_goal = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> CaseUpdate {
        self.0
    }
}

impl Default for CaseUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
