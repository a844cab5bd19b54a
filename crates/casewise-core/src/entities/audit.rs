use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::enums::{AuditAction, EntityType};

/// One row of the append-only audit trail. Written in the same transaction
/// as the mutation it records.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub action: AuditAction,
    /// Action-specific payload, see [`crate::audit_detail`].
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Decode `detail` as one of the [`crate::audit_detail`] shapes.
    ///
    /// Returns `None` when there is no detail or it has a different shape.
    #[must_use]
    pub fn detail_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.detail
            .as_ref()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}
