//! Participant repository.

use chrono::Utc;

use casewise_core::entities::Participant;
use casewise_core::enums::{AuditAction, EntityType};
use casewise_core::ids::PREFIX_PARTICIPANT;
use casewise_core::requests::CreateParticipantRequest;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, to_json};
use crate::service::CasewiseService;
use crate::updates::participant::ParticipantUpdate;

const SELECT_COLS: &str =
    "id, case_id, role, name, organisation, email, phone, notes, created_at, updated_at";

fn row_to_participant(row: &libsql::Row) -> Result<Participant, DatabaseError> {
    Ok(Participant {
        id: row.get(0)?,
        case_id: row.get(1)?,
        role: parse_enum(&row.get::<String>(2)?)?,
        name: row.get(3)?,
        organisation: get_opt_string(row, 4)?,
        email: get_opt_string(row, 5)?,
        phone: get_opt_string(row, 6)?,
        notes: get_opt_string(row, 7)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

impl CasewiseService {
    /// Add a participant to a case.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the case does not exist.
    pub async fn create_participant(
        &self,
        case_id: &str,
        req: &CreateParticipantRequest,
    ) -> Result<Participant, DatabaseError> {
        let now = Utc::now();
        let participant = Participant {
            id: self.db().generate_id(PREFIX_PARTICIPANT).await?,
            case_id: case_id.to_string(),
            role: req.role,
            name: req.name.trim().to_string(),
            organisation: req.organisation.clone(),
            email: req.email.clone(),
            phone: req.phone.clone(),
            notes: req.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Case, case_id).await?;
                self.db()
                    .execute_with(
                        &format!(
                            "INSERT INTO participants ({SELECT_COLS})
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                        ),
                        || {
                            libsql::params![
                                participant.id.as_str(),
                                participant.case_id.as_str(),
                                participant.role.as_str(),
                                participant.name.as_str(),
                                participant.organisation.as_deref(),
                                participant.email.as_deref(),
                                participant.phone.as_deref(),
                                participant.notes.as_deref(),
                                now.to_rfc3339(),
                                now.to_rfc3339()
                            ]
                        },
                    )
                    .await?;
                self.record_audit(
                    EntityType::Participant,
                    &participant.id,
                    AuditAction::Created,
                    Some(serde_json::json!({ "case_id": case_id, "role": participant.role })),
                )
                .await?;
                Ok(())
            })
            .await?;

        Ok(participant)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no participant has this ID.
    pub async fn get_participant(&self, id: &str) -> Result<Participant, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} FROM participants WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Participant, id))?;
        row_to_participant(&row)
    }

    /// Participants on a case in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the case does not exist.
    pub async fn list_participants(&self, case_id: &str) -> Result<Vec<Participant>, DatabaseError> {
        self.ensure_exists(EntityType::Case, case_id).await?;
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {SELECT_COLS} FROM participants WHERE case_id = ?1
                     ORDER BY created_at, rowid"
                ),
                || [case_id],
            )
            .await?;
        let mut participants = Vec::new();
        while let Some(row) = rows.next().await? {
            participants.push(row_to_participant(&row)?);
        }
        Ok(participants)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the participant does not exist.
    pub async fn update_participant(
        &self,
        id: &str,
        update: ParticipantUpdate,
    ) -> Result<Participant, DatabaseError> {
        let clause = update.set_clause();
        if clause.is_empty() {
            return self.get_participant(id).await;
        }

        let (sql, params) = clause.into_update("participants", id, Utc::now());
        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Participant, id).await?;
                self.db()
                    .execute_with(&sql, || libsql::params_from_iter(params.clone()))
                    .await?;
                self.record_audit(
                    EntityType::Participant,
                    id,
                    AuditAction::Updated,
                    Some(to_json(&update)?),
                )
                .await?;
                Ok(())
            })
            .await?;

        self.get_participant(id).await
    }

    /// Delete a participant. Interaction links go with it; tasks assigned to
    /// it become unassigned.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the participant does not exist.
    pub async fn delete_participant(&self, id: &str) -> Result<(), DatabaseError> {
        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Participant, id).await?;
                self.db()
                    .execute_with("DELETE FROM participants WHERE id = ?1", || [id])
                    .await?;
                self.record_audit(EntityType::Participant, id, AuditAction::Deleted, None)
                    .await?;
                Ok(())
            })
            .await
    }
}
