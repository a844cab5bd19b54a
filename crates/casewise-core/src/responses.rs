//! Response types returned as JSON by the HTTP API.
//!
//! Plain entity reads return the entity itself; these structs cover the
//! composite and non-entity shapes.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{Case, Interaction, Participant, Report, Task};
use crate::summary::Summary;

/// Response from `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: bool,
    pub ai_configured: bool,
}

/// Response from `GET /api/auth/session` and `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SessionInfo {
    pub authenticated: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response from `GET /api/cases/{id}/overview`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CaseOverview {
    pub case: Case,
    pub participants: Vec<Participant>,
    /// Most recent first.
    pub recent_interactions: Vec<Interaction>,
    pub open_tasks: Vec<Task>,
    pub overdue_tasks: u32,
    pub reports: Vec<Report>,
}

/// Response from the summary endpoints: the stored markdown plus its parsed
/// sections.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SummaryResponse {
    pub interaction_id: String,
    pub markdown: Option<String>,
    pub sections: Summary,
}

/// Response from `POST /api/interactions/{id}/transcribe`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TranscriptionResponse {
    pub interaction: Interaction,
    pub transcript_chars: u64,
    pub summarized: bool,
}

/// Response from `POST /api/cases/{id}/capacity-summary`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CapacitySummaryResponse {
    pub case: Case,
    pub model: String,
}

/// Response from `DELETE` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DeletedResponse {
    pub id: String,
    pub deleted: bool,
}

/// Response from `GET /api/schemas`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SchemaListResponse {
    pub schemas: Vec<String>,
}
