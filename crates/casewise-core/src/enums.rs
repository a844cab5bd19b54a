//! Status enums, entity types, and audit actions for Casewise.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! Status enums with state machines provide `allowed_next_states()` to enforce
//! valid transitions at the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// CaseStatus
// ---------------------------------------------------------------------------

/// Status of a rehabilitation case.
///
/// ```text
/// open    → active | closed
/// active  → on_hold | closed
/// on_hold → active | closed
/// closed  → active (reopened)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Open,
    Active,
    OnHold,
    Closed,
}

impl CaseStatus {
    /// Valid next states from the current state.
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Open => &[Self::Active, Self::Closed],
            Self::Active => &[Self::OnHold, Self::Closed],
            Self::OnHold => &[Self::Active, Self::Closed],
            Self::Closed => &[Self::Active],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ParticipantRole
// ---------------------------------------------------------------------------

/// The part a participant plays in a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Worker,
    Insurer,
    Employer,
    Gp,
    Specialist,
    Physiotherapist,
    Psychologist,
    Lawyer,
    Other,
}

impl ParticipantRole {
    /// Every role, in display order.
    pub const ALL: [Self; 9] = [
        Self::Worker,
        Self::Insurer,
        Self::Employer,
        Self::Gp,
        Self::Specialist,
        Self::Physiotherapist,
        Self::Psychologist,
        Self::Lawyer,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Insurer => "insurer",
            Self::Employer => "employer",
            Self::Gp => "gp",
            Self::Specialist => "specialist",
            Self::Physiotherapist => "physiotherapist",
            Self::Psychologist => "psychologist",
            Self::Lawyer => "lawyer",
            Self::Other => "other",
        }
    }

    /// Human-readable label used in prompts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Worker => "Injured worker",
            Self::Insurer => "Insurer",
            Self::Employer => "Employer",
            Self::Gp => "General practitioner",
            Self::Specialist => "Specialist",
            Self::Physiotherapist => "Physiotherapist",
            Self::Psychologist => "Psychologist",
            Self::Lawyer => "Legal representative",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// InteractionType
// ---------------------------------------------------------------------------

/// Kind of contact recorded against a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    PhoneCall,
    Meeting,
    Email,
    Note,
    CaseConference,
    AudioRecording,
}

impl InteractionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PhoneCall => "phone_call",
            Self::Meeting => "meeting",
            Self::Email => "email",
            Self::Note => "note",
            Self::CaseConference => "case_conference",
            Self::AudioRecording => "audio_recording",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PhoneCall => "Phone call",
            Self::Meeting => "Meeting",
            Self::Email => "Email",
            Self::Note => "File note",
            Self::CaseConference => "Case conference",
            Self::AudioRecording => "Audio recording",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// Status of a task.
///
/// ```text
/// open        → in_progress | done | cancelled
/// in_progress → done | blocked | cancelled
/// blocked     → in_progress | cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Blocked,
    Done,
    Cancelled,
}

impl TaskStatus {
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Open => &[Self::InProgress, Self::Done, Self::Cancelled],
            Self::InProgress => &[Self::Done, Self::Blocked, Self::Cancelled],
            Self::Blocked => &[Self::InProgress, Self::Cancelled],
            Self::Done | Self::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether the task still needs attention.
    #[must_use]
    pub const fn is_outstanding(self) -> bool {
        matches!(self, Self::Open | Self::InProgress | Self::Blocked)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReportType
// ---------------------------------------------------------------------------

/// Kind of report a consultant can have drafted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    InitialAssessment,
    ProgressReport,
    RtwPlan,
    ClosureReport,
    CaseConferenceSummary,
}

impl ReportType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitialAssessment => "initial_assessment",
            Self::ProgressReport => "progress_report",
            Self::RtwPlan => "rtw_plan",
            Self::ClosureReport => "closure_report",
            Self::CaseConferenceSummary => "case_conference_summary",
        }
    }

    /// Default report title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::InitialAssessment => "Initial Needs Assessment",
            Self::ProgressReport => "Progress Report",
            Self::RtwPlan => "Return to Work Plan",
            Self::ClosureReport => "Case Closure Report",
            Self::CaseConferenceSummary => "Case Conference Summary",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReportStatus
// ---------------------------------------------------------------------------

/// Status of a report.
///
/// ```text
/// draft → final
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Draft,
    Final,
}

impl ReportStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Final],
            Self::Final => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Type of action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    StatusChanged,
    Linked,
    Unlinked,
    Summarized,
    Transcribed,
    Generated,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::StatusChanged => "status_changed",
            Self::Linked => "linked",
            Self::Unlinked => "unlinked",
            Self::Summarized => "summarized",
            Self::Transcribed => "transcribed",
            Self::Generated => "generated",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Type of entity in the system, used in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Case,
    Participant,
    Interaction,
    Task,
    Report,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Case => "case",
            Self::Participant => "participant",
            Self::Interaction => "interaction",
            Self::Task => "task",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
