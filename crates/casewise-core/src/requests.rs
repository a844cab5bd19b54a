//! Request payloads accepted by the HTTP API.
//!
//! Every payload is checked twice: structurally against its JSON Schema (see
//! `casewise-schema`), then semantically through [`Validate`]. Update payloads
//! distinguish "absent" from "null" with `Option<Option<T>>`: an absent field
//! is left unchanged, an explicit `null` clears the column.

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::enums::{CaseStatus, InteractionType, ParticipantRole, ReportType, TaskStatus};
use crate::errors::CoreError;

const MAX_NAME_LEN: usize = 200;
const MAX_TEXT_LEN: usize = 100_000;
const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// Semantic validation beyond what the JSON Schema can express.
pub trait Validate {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` describing the first offending field.
    fn validate(&self) -> Result<(), CoreError>;
}

/// Deserialize a present field (including `null`) as `Some(inner)`.
///
/// Combined with `#[serde(default)]` this yields `None` for an absent field,
/// `Some(None)` for `null`, and `Some(Some(v))` for a value.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// The new value of a nullable PATCH field, if one was supplied.
fn set_value(field: Option<&Option<String>>) -> Option<&str> {
    field.and_then(Option::as_deref)
}

fn require_text(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    check_len(field, value, max)
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.chars().count() > max {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<(), CoreError> {
    value.map_or(Ok(()), |v| check_len(field, v, max))
}

fn optional_email(field: &str, value: Option<&str>) -> Result<(), CoreError> {
    let Some(email) = value else {
        return Ok(());
    };
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        })
        && !email.chars().any(char::is_whitespace);
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} '{email}' is not a valid email address"
        )))
    }
}

fn optional_phone(field: &str, value: Option<&str>) -> Result<(), CoreError> {
    let Some(phone) = value else {
        return Ok(());
    };
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    if allowed && (6..=15).contains(&digits) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} '{phone}' is not a valid phone number"
        )))
    }
}

fn past_date(field: &str, value: Option<NaiveDate>) -> Result<(), CoreError> {
    match value {
        Some(date) if date > Utc::now().date_naive() => Err(CoreError::Validation(format!(
            "{field} must not be in the future"
        ))),
        _ => Ok(()),
    }
}

fn optional_duration(value: Option<u32>) -> Result<(), CoreError> {
    match value {
        Some(minutes) if minutes > MAX_DURATION_MINUTES => Err(CoreError::Validation(format!(
            "duration_minutes must be at most {MAX_DURATION_MINUTES}"
        ))),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), CoreError> {
        require_text("password", &self.password, 1_000)
    }
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCaseRequest {
    pub worker_name: String,
    pub claim_number: String,
    #[serde(default)]
    pub worker_email: Option<String>,
    #[serde(default)]
    pub worker_phone: Option<String>,
    #[serde(default)]
    pub insurer: Option<String>,
    #[serde(default)]
    pub employer: Option<String>,
    #[serde(default)]
    pub injury_date: Option<NaiveDate>,
    #[serde(default)]
    pub injury_description: Option<String>,
    #[serde(default)]
    pub rtw_goal: Option<String>,
}

impl Validate for CreateCaseRequest {
    fn validate(&self) -> Result<(), CoreError> {
        require_text("worker_name", &self.worker_name, MAX_NAME_LEN)?;
        require_text("claim_number", &self.claim_number, 64)?;
        optional_email("worker_email", self.worker_email.as_deref())?;
        optional_phone("worker_phone", self.worker_phone.as_deref())?;
        optional_text("insurer", self.insurer.as_deref(), MAX_NAME_LEN)?;
        optional_text("employer", self.employer.as_deref(), MAX_NAME_LEN)?;
        optional_text(
            "injury_description",
            self.injury_description.as_deref(),
            MAX_TEXT_LEN,
        )?;
        optional_text("rtw_goal", self.rtw_goal.as_deref(), MAX_TEXT_LEN)?;
        past_date("injury_date", self.injury_date)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateCaseRequest {
    #[serde(default)]
    pub worker_name: Option<String>,
    #[serde(default)]
    pub claim_number: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub worker_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub worker_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub insurer: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub employer: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<NaiveDate>")]
    pub injury_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub injury_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub capacity_summary: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub rtw_goal: Option<Option<String>>,
}

impl Validate for UpdateCaseRequest {
    fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.worker_name {
            require_text("worker_name", name, MAX_NAME_LEN)?;
        }
        if let Some(claim) = &self.claim_number {
            require_text("claim_number", claim, 64)?;
        }
        optional_email("worker_email", set_value(self.worker_email.as_ref()))?;
        optional_phone("worker_phone", set_value(self.worker_phone.as_ref()))?;
        optional_text("insurer", set_value(self.insurer.as_ref()), MAX_NAME_LEN)?;
        optional_text("employer", set_value(self.employer.as_ref()), MAX_NAME_LEN)?;
        optional_text(
            "injury_description",
            set_value(self.injury_description.as_ref()),
            MAX_TEXT_LEN,
        )?;
        optional_text(
            "capacity_summary",
            set_value(self.capacity_summary.as_ref()),
            MAX_TEXT_LEN,
        )?;
        optional_text("rtw_goal", set_value(self.rtw_goal.as_ref()), MAX_TEXT_LEN)?;
        past_date("injury_date", self.injury_date.flatten())
    }
}

/// Body of `POST /api/cases/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CaseStatusRequest {
    pub status: CaseStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Validate for CaseStatusRequest {
    fn validate(&self) -> Result<(), CoreError> {
        optional_text("reason", self.reason.as_deref(), MAX_TEXT_LEN)
    }
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateParticipantRequest {
    pub role: ParticipantRole,
    pub name: String,
    #[serde(default)]
    pub organisation: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for CreateParticipantRequest {
    fn validate(&self) -> Result<(), CoreError> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        optional_text("organisation", self.organisation.as_deref(), MAX_NAME_LEN)?;
        optional_email("email", self.email.as_deref())?;
        optional_phone("phone", self.phone.as_deref())?;
        optional_text("notes", self.notes.as_deref(), MAX_TEXT_LEN)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateParticipantRequest {
    #[serde(default)]
    pub role: Option<ParticipantRole>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub organisation: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub notes: Option<Option<String>>,
}

impl Validate for UpdateParticipantRequest {
    fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.name {
            require_text("name", name, MAX_NAME_LEN)?;
        }
        optional_text(
            "organisation",
            set_value(self.organisation.as_ref()),
            MAX_NAME_LEN,
        )?;
        optional_email("email", set_value(self.email.as_ref()))?;
        optional_phone("phone", set_value(self.phone.as_ref()))?;
        optional_text("notes", set_value(self.notes.as_ref()), MAX_TEXT_LEN)
    }
}

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateInteractionRequest {
    pub case_id: String,
    pub interaction_type: InteractionType,
    pub subject: String,
    /// Defaults to the time of the request.
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub participant_ids: Vec<String>,
}

impl Validate for CreateInteractionRequest {
    fn validate(&self) -> Result<(), CoreError> {
        require_text("case_id", &self.case_id, 64)?;
        require_text("subject", &self.subject, MAX_NAME_LEN)?;
        optional_duration(self.duration_minutes)?;
        optional_text("notes", self.notes.as_deref(), MAX_TEXT_LEN)?;
        optional_text("transcript", self.transcript.as_deref(), MAX_TEXT_LEN * 5)?;
        let mut ids = self.participant_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.participant_ids.len() {
            return Err(CoreError::Validation(
                "participant_ids must not contain duplicates".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateInteractionRequest {
    #[serde(default)]
    pub interaction_type: Option<InteractionType>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<u32>")]
    pub duration_minutes: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub transcript: Option<Option<String>>,
}

impl Validate for UpdateInteractionRequest {
    fn validate(&self) -> Result<(), CoreError> {
        if let Some(subject) = &self.subject {
            require_text("subject", subject, MAX_NAME_LEN)?;
        }
        optional_duration(self.duration_minutes.flatten())?;
        optional_text("notes", set_value(self.notes.as_ref()), MAX_TEXT_LEN)?;
        optional_text(
            "transcript",
            set_value(self.transcript.as_ref()),
            MAX_TEXT_LEN * 5,
        )
    }
}

/// Body of `PUT /api/interactions/{id}/summary`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SummaryUpdateRequest {
    pub summary: String,
}

impl Validate for SummaryUpdateRequest {
    fn validate(&self) -> Result<(), CoreError> {
        check_len("summary", &self.summary, MAX_TEXT_LEN)
    }
}

/// Body of `PATCH /api/interactions/{id}/summary/sections/{index}`.
///
/// Fields are applied in declaration order. `text` and `items` are mutually
/// exclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SectionEditRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub heading: Option<Option<String>>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<String>>,
    #[serde(default)]
    pub add_item: Option<String>,
    #[serde(default)]
    pub remove_item: Option<usize>,
}

impl Validate for SectionEditRequest {
    fn validate(&self) -> Result<(), CoreError> {
        if self.text.is_some() && self.items.is_some() {
            return Err(CoreError::Validation(
                "text and items cannot both be set".into(),
            ));
        }
        let empty = self.heading.is_none()
            && self.text.is_none()
            && self.items.is_none()
            && self.add_item.is_none()
            && self.remove_item.is_none();
        if empty {
            return Err(CoreError::Validation("no section edits supplied".into()));
        }
        if let Some(Some(heading)) = &self.heading {
            require_text("heading", heading, MAX_NAME_LEN)?;
        }
        if let Some(item) = &self.add_item {
            require_text("add_item", item, MAX_TEXT_LEN)?;
        }
        Ok(())
    }
}

/// Body of `POST /api/interactions/{id}/summary/sections`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SectionCreateRequest {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<String>>,
    /// Insert position; appends when absent.
    #[serde(default)]
    pub position: Option<usize>,
}

impl Validate for SectionCreateRequest {
    fn validate(&self) -> Result<(), CoreError> {
        if self.text.is_some() && self.items.is_some() {
            return Err(CoreError::Validation(
                "text and items cannot both be set".into(),
            ));
        }
        if let Some(heading) = &self.heading {
            require_text("heading", heading, MAX_NAME_LEN)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    pub case_id: String,
    pub description: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_participant_id: Option<String>,
}

impl Validate for CreateTaskRequest {
    fn validate(&self) -> Result<(), CoreError> {
        require_text("case_id", &self.case_id, 64)?;
        require_text("description", &self.description, MAX_TEXT_LEN)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<NaiveDate>")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub assigned_participant_id: Option<Option<String>>,
}

impl Validate for UpdateTaskRequest {
    fn validate(&self) -> Result<(), CoreError> {
        if let Some(description) = &self.description {
            require_text("description", description, MAX_TEXT_LEN)?;
        }
        Ok(())
    }
}

/// Body of `POST /api/tasks/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TaskStatusRequest {
    pub status: TaskStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Validate for TaskStatusRequest {
    fn validate(&self) -> Result<(), CoreError> {
        optional_text("reason", self.reason.as_deref(), MAX_TEXT_LEN)
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GenerateReportRequest {
    pub case_id: String,
    pub report_type: ReportType,
    /// Overrides the report type's default title.
    #[serde(default)]
    pub title: Option<String>,
    /// Extra guidance from the consultant appended to the prompt.
    #[serde(default)]
    pub instructions: Option<String>,
}

impl Validate for GenerateReportRequest {
    fn validate(&self) -> Result<(), CoreError> {
        require_text("case_id", &self.case_id, 64)?;
        if let Some(title) = &self.title {
            require_text("title", title, MAX_NAME_LEN)?;
        }
        optional_text("instructions", self.instructions.as_deref(), 4_000)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateReportRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl Validate for UpdateReportRequest {
    fn validate(&self) -> Result<(), CoreError> {
        if let Some(title) = &self.title {
            require_text("title", title, MAX_NAME_LEN)?;
        }
        if let Some(content) = &self.content {
            check_len("content", content, MAX_TEXT_LEN)?;
        }
        Ok(())
    }
}
