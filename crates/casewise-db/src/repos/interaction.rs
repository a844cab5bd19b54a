//! Interaction repository: CRUD, participant links, summaries, transcripts.

use std::collections::HashMap;

use chrono::Utc;

use casewise_core::audit_detail::{AiDetail, LinkedDetail};
use casewise_core::entities::Interaction;
use casewise_core::enums::{AuditAction, EntityType, InteractionType};
use casewise_core::ids::PREFIX_INTERACTION;
use casewise_core::requests::CreateInteractionRequest;

use crate::error::DatabaseError;
use crate::helpers::{
    fts_query, get_opt_string, get_opt_u32, parse_datetime, parse_enum, to_json,
};
use crate::service::CasewiseService;
use crate::updates::interaction::InteractionUpdate;

const SELECT_COLS: &str = "id, case_id, interaction_type, subject, occurred_at, duration_minutes, \
     notes, transcript, ai_summary, created_at, updated_at";

fn row_to_interaction(row: &libsql::Row) -> Result<Interaction, DatabaseError> {
    Ok(Interaction {
        id: row.get(0)?,
        case_id: row.get(1)?,
        interaction_type: parse_enum(&row.get::<String>(2)?)?,
        subject: row.get(3)?,
        occurred_at: parse_datetime(&row.get::<String>(4)?)?,
        duration_minutes: get_opt_u32(row, 5)?,
        notes: get_opt_string(row, 6)?,
        transcript: get_opt_string(row, 7)?,
        ai_summary: get_opt_string(row, 8)?,
        participant_ids: Vec::new(),
        created_at: parse_datetime(&row.get::<String>(9)?)?,
        updated_at: parse_datetime(&row.get::<String>(10)?)?,
    })
}

/// Filter criteria for interaction listing.
#[derive(Debug, Default)]
pub struct InteractionFilter {
    pub case_id: Option<String>,
    pub interaction_type: Option<InteractionType>,
    /// Free-text search over subject, notes, transcript, and summary.
    pub query: Option<String>,
    pub limit: Option<u32>,
}

impl CasewiseService {
    /// Record an interaction and link its participants in the given order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the case does not exist, or `Validation` if a
    /// participant is unknown or belongs to another case.
    pub async fn create_interaction(
        &self,
        req: &CreateInteractionRequest,
    ) -> Result<Interaction, DatabaseError> {
        let now = Utc::now();
        let interaction = Interaction {
            id: self.db().generate_id(PREFIX_INTERACTION).await?,
            case_id: req.case_id.clone(),
            interaction_type: req.interaction_type,
            subject: req.subject.trim().to_string(),
            occurred_at: req.occurred_at.unwrap_or(now),
            duration_minutes: req.duration_minutes,
            notes: req.notes.clone(),
            transcript: req.transcript.clone(),
            ai_summary: None,
            participant_ids: req.participant_ids.clone(),
            created_at: now,
            updated_at: now,
        };

        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Case, &interaction.case_id)
                    .await?;
                for participant_id in &interaction.participant_ids {
                    self.ensure_participant_in_case(participant_id, &interaction.case_id)
                        .await?;
                }
                self.db()
                    .execute_with(
                        &format!(
                            "INSERT INTO interactions ({SELECT_COLS})
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                        ),
                        || {
                            libsql::params![
                                interaction.id.as_str(),
                                interaction.case_id.as_str(),
                                interaction.interaction_type.as_str(),
                                interaction.subject.as_str(),
                                interaction.occurred_at.to_rfc3339(),
                                interaction.duration_minutes,
                                interaction.notes.as_deref(),
                                interaction.transcript.as_deref(),
                                interaction.ai_summary.as_deref(),
                                now.to_rfc3339(),
                                now.to_rfc3339()
                            ]
                        },
                    )
                    .await?;
                for (position, participant_id) in interaction.participant_ids.iter().enumerate() {
                    self.insert_link(&interaction.id, participant_id, position)
                        .await?;
                }
                self.record_audit(
                    EntityType::Interaction,
                    &interaction.id,
                    AuditAction::Created,
                    Some(serde_json::json!({
                        "case_id": interaction.case_id,
                        "interaction_type": interaction.interaction_type,
                    })),
                )
                .await?;
                Ok(())
            })
            .await?;

        Ok(interaction)
    }

    async fn insert_link(
        &self,
        interaction_id: &str,
        participant_id: &str,
        position: usize,
    ) -> Result<(), DatabaseError> {
        let position = i64::try_from(position).map_err(|e| DatabaseError::Other(e.into()))?;
        self.db()
            .execute_with(
                "INSERT INTO interaction_participants (interaction_id, participant_id, position, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                || {
                    libsql::params![
                        interaction_id,
                        participant_id,
                        position,
                        Utc::now().to_rfc3339()
                    ]
                },
            )
            .await?;
        Ok(())
    }

    /// Fill `participant_ids` for each interaction with one query.
    async fn attach_participants(
        &self,
        interactions: &mut [Interaction],
    ) -> Result<(), DatabaseError> {
        if interactions.is_empty() {
            return Ok(());
        }
        let placeholders = (1..=interactions.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let params: Vec<libsql::Value> = interactions
            .iter()
            .map(|i| libsql::Value::Text(i.id.clone()))
            .collect();
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT interaction_id, participant_id FROM interaction_participants
                     WHERE interaction_id IN ({placeholders})
                     ORDER BY interaction_id, position"
                ),
                || libsql::params_from_iter(params.clone()),
            )
            .await?;

        let mut links: HashMap<String, Vec<String>> = HashMap::new();
        while let Some(row) = rows.next().await? {
            links
                .entry(row.get::<String>(0)?)
                .or_default()
                .push(row.get::<String>(1)?);
        }
        for interaction in interactions {
            interaction.participant_ids = links.remove(&interaction.id).unwrap_or_default();
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no interaction has this ID.
    pub async fn get_interaction(&self, id: &str) -> Result<Interaction, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} FROM interactions WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Interaction, id))?;
        let mut found = [row_to_interaction(&row)?];
        self.attach_participants(&mut found).await?;
        let [interaction] = found;
        Ok(interaction)
    }

    /// List interactions, most recent `occurred_at` first, or by relevance
    /// when searching.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_interactions(
        &self,
        filter: &InteractionFilter,
    ) -> Result<Vec<Interaction>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        let fts = filter.query.as_deref().and_then(fts_query);
        let searching = fts.is_some();
        if let Some(fts) = fts {
            params.push(libsql::Value::Text(fts));
            conditions.push(format!("interactions_fts MATCH ?{}", params.len()));
        }
        if let Some(ref case_id) = filter.case_id {
            params.push(libsql::Value::Text(case_id.clone()));
            conditions.push(format!("i.case_id = ?{}", params.len()));
        }
        if let Some(kind) = filter.interaction_type {
            params.push(libsql::Value::Text(kind.as_str().to_string()));
            conditions.push(format!("i.interaction_type = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let (from, order) = if searching {
            (
                "interactions_fts JOIN interactions i ON i.rowid = interactions_fts.rowid",
                "rank",
            )
        } else {
            ("interactions i", "i.occurred_at DESC, i.rowid DESC")
        };
        let cols = SELECT_COLS
            .split(", ")
            .map(|col| format!("i.{col}"))
            .collect::<Vec<_>>()
            .join(", ");
        let limit = filter.limit.unwrap_or(50);
        let sql = format!("SELECT {cols} FROM {from} {where_clause} ORDER BY {order} LIMIT {limit}");

        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut interactions = Vec::new();
        while let Some(row) = rows.next().await? {
            interactions.push(row_to_interaction(&row)?);
        }
        self.attach_participants(&mut interactions).await?;
        Ok(interactions)
    }

    /// The `limit` most recent interactions on a case, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn interactions_for_case(
        &self,
        case_id: &str,
        limit: u32,
    ) -> Result<Vec<Interaction>, DatabaseError> {
        self.list_interactions(&InteractionFilter {
            case_id: Some(case_id.to_string()),
            limit: Some(limit),
            ..Default::default()
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the interaction does not exist.
    pub async fn update_interaction(
        &self,
        id: &str,
        update: InteractionUpdate,
    ) -> Result<Interaction, DatabaseError> {
        let clause = update.set_clause();
        if clause.is_empty() {
            return self.get_interaction(id).await;
        }

        let (sql, params) = clause.into_update("interactions", id, Utc::now());
        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Interaction, id).await?;
                self.db()
                    .execute_with(&sql, || libsql::params_from_iter(params.clone()))
                    .await?;
                self.record_audit(
                    EntityType::Interaction,
                    id,
                    AuditAction::Updated,
                    Some(to_json(&update)?),
                )
                .await?;
                Ok(())
            })
            .await?;

        self.get_interaction(id).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the interaction does not exist.
    pub async fn delete_interaction(&self, id: &str) -> Result<(), DatabaseError> {
        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Interaction, id).await?;
                self.db()
                    .execute_with("DELETE FROM interactions WHERE id = ?1", || [id])
                    .await?;
                self.record_audit(EntityType::Interaction, id, AuditAction::Deleted, None)
                    .await?;
                Ok(())
            })
            .await
    }

    /// Link a participant from the same case. Linking an already linked
    /// participant is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown interaction or participant, and
    /// `Validation` if the participant belongs to another case.
    pub async fn link_participant(
        &self,
        interaction_id: &str,
        participant_id: &str,
    ) -> Result<Interaction, DatabaseError> {
        self.db()
            .transaction(async {
                let interaction = self.get_interaction(interaction_id).await?;
                let owner = self.participant_case_id(participant_id).await?;
                if owner != interaction.case_id {
                    return Err(DatabaseError::Validation(format!(
                        "participant {participant_id} belongs to a different case"
                    )));
                }
                if interaction.participant_ids.iter().any(|p| p == participant_id) {
                    return Ok(());
                }
                self.insert_link(
                    interaction_id,
                    participant_id,
                    interaction.participant_ids.len(),
                )
                .await?;
                let detail = LinkedDetail {
                    interaction_id: interaction_id.to_string(),
                    participant_id: participant_id.to_string(),
                };
                self.record_audit(
                    EntityType::Interaction,
                    interaction_id,
                    AuditAction::Linked,
                    Some(to_json(&detail)?),
                )
                .await?;
                Ok(())
            })
            .await?;

        self.get_interaction(interaction_id).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the interaction does not exist or the
    /// participant is not linked to it.
    pub async fn unlink_participant(
        &self,
        interaction_id: &str,
        participant_id: &str,
    ) -> Result<Interaction, DatabaseError> {
        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Interaction, interaction_id)
                    .await?;
                let removed = self
                    .db()
                    .execute_with(
                        "DELETE FROM interaction_participants
                         WHERE interaction_id = ?1 AND participant_id = ?2",
                        || libsql::params![interaction_id, participant_id],
                    )
                    .await?;
                if removed == 0 {
                    return Err(DatabaseError::NotFound {
                        entity_type: "participant link".into(),
                        id: format!("{interaction_id}/{participant_id}"),
                    });
                }
                let detail = LinkedDetail {
                    interaction_id: interaction_id.to_string(),
                    participant_id: participant_id.to_string(),
                };
                self.record_audit(
                    EntityType::Interaction,
                    interaction_id,
                    AuditAction::Unlinked,
                    Some(to_json(&detail)?),
                )
                .await?;
                Ok(())
            })
            .await?;

        self.get_interaction(interaction_id).await
    }

    /// Replace (or with `None`, clear) the markdown summary. `generated`
    /// marks a model-written summary and is recorded as `summarized`;
    /// without it the change is a consultant edit.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the interaction does not exist.
    pub async fn set_summary(
        &self,
        id: &str,
        summary: Option<&str>,
        generated: Option<&AiDetail>,
    ) -> Result<Interaction, DatabaseError> {
        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Interaction, id).await?;
                self.db()
                    .execute_with(
                        "UPDATE interactions SET ai_summary = ?1, updated_at = ?2 WHERE id = ?3",
                        || libsql::params![summary, Utc::now().to_rfc3339(), id],
                    )
                    .await?;
                let (action, detail) = match generated {
                    Some(ai) => (AuditAction::Summarized, to_json(ai)?),
                    None => (
                        AuditAction::Updated,
                        serde_json::json!({ "ai_summary": summary.map(str::len) }),
                    ),
                };
                self.record_audit(EntityType::Interaction, id, action, Some(detail))
                    .await?;
                Ok(())
            })
            .await?;

        self.get_interaction(id).await
    }

    /// Store a transcript produced by the transcription API.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the interaction does not exist.
    pub async fn set_transcript(
        &self,
        id: &str,
        transcript: &str,
        generated: &AiDetail,
    ) -> Result<Interaction, DatabaseError> {
        self.db()
            .transaction(async {
                self.ensure_exists(EntityType::Interaction, id).await?;
                self.db()
                    .execute_with(
                        "UPDATE interactions SET transcript = ?1, updated_at = ?2 WHERE id = ?3",
                        || libsql::params![transcript, Utc::now().to_rfc3339(), id],
                    )
                    .await?;
                self.record_audit(
                    EntityType::Interaction,
                    id,
                    AuditAction::Transcribed,
                    Some(to_json(generated)?),
                )
                .await?;
                Ok(())
            })
            .await?;

        self.get_interaction(id).await
    }
}
