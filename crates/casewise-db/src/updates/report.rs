//! Report update builder. Only drafts accept updates.

use serde::Serialize;

use casewise_core::requests::UpdateReportRequest;

use super::{SetClause, trimmed};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ReportUpdate {
    pub(crate) fn set_clause(&self) -> SetClause {
        let mut clause = SetClause::default();
        clause.text("title", self.title.as_ref());
        clause.text("content", self.content.as_ref());
        clause
    }

    /// Audit detail: which fields changed, without echoing report content.
    pub(crate) fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.content.is_some() {
            fields.push("content");
        }
        fields
    }
}

impl From<UpdateReportRequest> for ReportUpdate {
    fn from(req: UpdateReportRequest) -> Self {
        Self {
            title: trimmed(req.title),
            content: req.content,
        }
    }
}

pub struct ReportUpdateBuilder(ReportUpdate);

impl ReportUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ReportUpdate::default())
    }

    #[must_use]
    pub fn title(mut self, val: impl Into<String>) -> Self {
        self.0.title = Some(val.into());
        self
    }

    #[must_use]
    pub fn content(mut self, val: impl Into<String>) -> Self {
        self.0.content = Some(val.into());
        self
    }

    #[must_use]
    pub fn build(self) -> ReportUpdate {
        self.0
    }
}

impl Default for ReportUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
