//! Interaction update builder.
//!
//! Summary and transcript are written through dedicated repo methods so they
//! get their own audit actions; this covers the consultant-edited fields.

use chrono::{DateTime, Utc};
use serde::Serialize;

use casewise_core::enums::InteractionType;
use casewise_core::requests::UpdateInteractionRequest;

use super::{SetClause, trimmed};

#[derive(Debug, Clone, Default, Serialize)]
pub struct InteractionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_type: Option<InteractionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Option<String>>,
}

impl InteractionUpdate {
    pub(crate) fn set_clause(&self) -> SetClause {
        let mut clause = SetClause::default();
        clause.enum_str(
            "interaction_type",
            self.interaction_type.map(InteractionType::as_str),
        );
        clause.text("subject", self.subject.as_ref());
        clause.datetime("occurred_at", self.occurred_at);
        clause.nullable_u32("duration_minutes", self.duration_minutes.as_ref());
        clause.nullable_text("notes", self.notes.as_ref());
        clause.nullable_text("transcript", self.transcript.as_ref());
        clause
    }
}

impl From<UpdateInteractionRequest> for InteractionUpdate {
    fn from(req: UpdateInteractionRequest) -> Self {
        Self {
            interaction_type: req.interaction_type,
            subject: trimmed(req.subject),
            occurred_at: req.occurred_at,
            duration_minutes: req.duration_minutes,
            notes: req.notes,
            transcript: req.transcript,
        }
    }
}

pub struct InteractionUpdateBuilder(InteractionUpdate);

impl InteractionUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(InteractionUpdate::default())
    }

    #[must_use]
    pub fn subject(mut self, val: impl Into<String>) -> Self {
        self.0.subject = Some(val.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, val: Option<String>) -> Self {
        self.0.notes = Some(val);
        self
    }

    #[must_use]
    pub fn duration_minutes(mut self, val: Option<u32>) -> Self {
        self.0.duration_minutes = Some(val);
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, val: DateTime<Utc>) -> Self {
        self.0.occurred_at = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> InteractionUpdate {
        self.0
    }
}

impl Default for InteractionUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
