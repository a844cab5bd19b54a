//! Repository modules implementing CRUD operations for all Casewise entities.
//!
//! Each module adds methods to `CasewiseService` via `impl CasewiseService`
//! blocks. Every write runs inside [`crate::CasewiseDb::transaction`]: the
//! connection is shared, so a bare write could otherwise land inside another
//! task's open transaction.

pub mod audit;
pub mod case;
pub mod interaction;
pub mod overview;
pub mod participant;
pub mod report;
pub mod session;
pub mod task;

use casewise_core::enums::EntityType;

use crate::error::DatabaseError;
use crate::helpers::entity_type_to_table;
use crate::service::CasewiseService;

impl CasewiseService {
    /// Fail with `NotFound` unless a row with `id` exists in the entity's table.
    pub(crate) async fn ensure_exists(
        &self,
        entity_type: EntityType,
        id: &str,
    ) -> Result<(), DatabaseError> {
        let table = entity_type_to_table(entity_type);
        let mut rows = self
            .db()
            .query_with(&format!("SELECT 1 FROM {table} WHERE id = ?1"), || [id])
            .await?;
        if rows.next().await?.is_some() {
            Ok(())
        } else {
            Err(DatabaseError::not_found(entity_type, id))
        }
    }

    /// The case a participant belongs to.
    pub(crate) async fn participant_case_id(
        &self,
        participant_id: &str,
    ) -> Result<String, DatabaseError> {
        let mut rows = self
            .db()
            .query_with("SELECT case_id FROM participants WHERE id = ?1", || {
                [participant_id]
            })
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Participant, participant_id))?;
        Ok(row.get::<String>(0)?)
    }

    /// Fail with `Validation` unless the participant exists and belongs to `case_id`.
    pub(crate) async fn ensure_participant_in_case(
        &self,
        participant_id: &str,
        case_id: &str,
    ) -> Result<(), DatabaseError> {
        let owner = match self.participant_case_id(participant_id).await {
            Ok(owner) => owner,
            Err(DatabaseError::NotFound { .. }) => {
                return Err(DatabaseError::Validation(format!(
                    "participant {participant_id} does not exist"
                )));
            }
            Err(e) => return Err(e),
        };
        if owner == case_id {
            Ok(())
        } else {
            Err(DatabaseError::Validation(format!(
                "participant {participant_id} belongs to a different case"
            )))
        }
    }
}
