use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::InteractionType;

/// A contact recorded against a case: a call, a meeting, a file note, or a
/// transcribed recording.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Interaction {
    pub id: String,
    pub case_id: String,
    pub interaction_type: InteractionType,
    pub subject: String,
    pub occurred_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
    pub transcript: Option<String>,
    /// Markdown summary, parsed and edited via [`crate::summary`].
    pub ai_summary: Option<String>,
    /// Participants present, in link order.
    pub participant_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interaction {
    /// The richest text available for downstream prompts: summary, then
    /// notes, then transcript.
    #[must_use]
    pub fn best_text(&self) -> Option<&str> {
        [&self.ai_summary, &self.notes, &self.transcript]
            .into_iter()
            .filter_map(Option::as_deref)
            .find(|s| !s.trim().is_empty())
    }
}
