//! Participant update builder.

use serde::Serialize;

use casewise_core::enums::ParticipantRole;
use casewise_core::requests::UpdateParticipantRequest;

use super::{SetClause, trimmed};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParticipantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ParticipantRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organisation: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl ParticipantUpdate {
    pub(crate) fn set_clause(&self) -> SetClause {
        let mut clause = SetClause::default();
        clause.enum_str("role", self.role.map(ParticipantRole::as_str));
        clause.text("name", self.name.as_ref());
        clause.nullable_text("organisation", self.organisation.as_ref());
        clause.nullable_text("email", self.email.as_ref());
        clause.nullable_text("phone", self.phone.as_ref());
        clause.nullable_text("notes", self.notes.as_ref());
        clause
    }
}

impl From<UpdateParticipantRequest> for ParticipantUpdate {
    fn from(req: UpdateParticipantRequest) -> Self {
        Self {
            role: req.role,
            name: trimmed(req.name),
            organisation: req.organisation,
            email: req.email,
            phone: req.phone,
            notes: req.notes,
        }
    }
}

pub struct ParticipantUpdateBuilder(ParticipantUpdate);

impl ParticipantUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ParticipantUpdate::default())
    }

    #[must_use]
    pub fn role(mut self, val: ParticipantRole) -> Self {
        self.0.role = Some(val);
        self
    }

    #[must_use]
    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.0.name = Some(val.into());
        self
    }

    #[must_use]
    pub fn organisation(mut self, val: Option<String>) -> Self {
        self.0.organisation = Some(val);
        self
    }

    #[must_use]
    pub fn email(mut self, val: Option<String>) -> Self {
        self.0.email = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> ParticipantUpdate {
        self.0
    }
}

impl Default for ParticipantUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
