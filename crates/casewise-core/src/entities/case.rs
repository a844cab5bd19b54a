use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::CaseStatus;

/// A rehabilitation case for one injured worker under one claim.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Case {
    pub id: String,
    pub worker_name: String,
    pub worker_email: Option<String>,
    pub worker_phone: Option<String>,
    /// Insurer's claim reference. Unique across cases.
    pub claim_number: String,
    pub insurer: Option<String>,
    pub employer: Option<String>,
    pub injury_date: Option<NaiveDate>,
    pub injury_description: Option<String>,
    pub status: CaseStatus,
    /// Free-text summary of the worker's current functional capacity.
    pub capacity_summary: Option<String>,
    /// Agreed return-to-work goal, e.g. "pre-injury role, full hours".
    pub rtw_goal: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
