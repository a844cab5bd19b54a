use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ReportStatus, ReportType};

/// A drafted (usually AI-generated) report for a case.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Report {
    pub id: String,
    pub case_id: String,
    pub report_type: ReportType,
    pub title: String,
    pub content: String,
    pub status: ReportStatus,
    /// Model that produced the first draft, if any.
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}
