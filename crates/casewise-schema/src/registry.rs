//! Central schema registry for all Casewise types.
//!
//! The `SchemaRegistry` builds JSON Schemas from casewise-core types at
//! construction time using [`schemars::schema_for!`] and compiles a
//! `jsonschema` validator for each so request validation does no schema work
//! per call.

use std::collections::HashMap;

use schemars::schema_for;
use serde::de::DeserializeOwned;

use crate::error::SchemaError;

/// Central store of all JSON Schemas in the Casewise system.
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, serde_json::Value>,
    validators: HashMap<&'static str, jsonschema::Validator>,
}

/// Insert a schema into the map, converting the `schemars` output to a
/// `serde_json::Value`. Panics if `serde_json::to_value` fails (should be
/// infallible for valid `schemars` output).
macro_rules! register {
    ($map:expr, $name:expr, $ty:ty) => {
        $map.insert($name, serde_json::to_value(schema_for!($ty)).unwrap());
    };
}

impl SchemaRegistry {
    /// Build a new registry containing all entity, request, response, and
    /// audit-detail schemas from casewise-core.
    ///
    /// # Panics
    ///
    /// Panics if `serde_json::to_value` fails on any `schemars`-generated
    /// schema. This is not expected in practice because `schemars` always
    /// produces valid JSON-serialisable output.
    #[must_use]
    pub fn new() -> Self {
        use casewise_core::{audit_detail, entities, requests, responses};

        let mut schemas = HashMap::new();

        // --- Entities ---
        register!(schemas, "case", entities::Case);
        register!(schemas, "participant", entities::Participant);
        register!(schemas, "interaction", entities::Interaction);
        register!(schemas, "task", entities::Task);
        register!(schemas, "report", entities::Report);
        register!(schemas, "audit_entry", entities::AuditEntry);

        // --- Request payloads ---
        register!(schemas, "login_request", requests::LoginRequest);
        register!(schemas, "create_case_request", requests::CreateCaseRequest);
        register!(schemas, "update_case_request", requests::UpdateCaseRequest);
        register!(schemas, "case_status_request", requests::CaseStatusRequest);
        register!(
            schemas,
            "create_participant_request",
            requests::CreateParticipantRequest
        );
        register!(
            schemas,
            "update_participant_request",
            requests::UpdateParticipantRequest
        );
        register!(
            schemas,
            "create_interaction_request",
            requests::CreateInteractionRequest
        );
        register!(
            schemas,
            "update_interaction_request",
            requests::UpdateInteractionRequest
        );
        register!(
            schemas,
            "summary_update_request",
            requests::SummaryUpdateRequest
        );
        register!(schemas, "section_edit_request", requests::SectionEditRequest);
        register!(
            schemas,
            "section_create_request",
            requests::SectionCreateRequest
        );
        register!(schemas, "create_task_request", requests::CreateTaskRequest);
        register!(schemas, "update_task_request", requests::UpdateTaskRequest);
        register!(schemas, "task_status_request", requests::TaskStatusRequest);
        register!(
            schemas,
            "generate_report_request",
            requests::GenerateReportRequest
        );
        register!(schemas, "update_report_request", requests::UpdateReportRequest);

        // --- Responses ---
        register!(schemas, "health_response", responses::HealthResponse);
        register!(schemas, "session_info", responses::SessionInfo);
        register!(schemas, "case_overview", responses::CaseOverview);
        register!(schemas, "summary_response", responses::SummaryResponse);
        register!(
            schemas,
            "transcription_response",
            responses::TranscriptionResponse
        );
        register!(
            schemas,
            "capacity_summary_response",
            responses::CapacitySummaryResponse
        );

        // --- Audit details ---
        register!(
            schemas,
            "status_changed_detail",
            audit_detail::StatusChangedDetail
        );
        register!(schemas, "linked_detail", audit_detail::LinkedDetail);
        register!(schemas, "ai_detail", audit_detail::AiDetail);

        let validators = schemas
            .iter()
            .filter_map(|(name, schema)| {
                jsonschema::validator_for(schema)
                    .ok()
                    .map(|validator| (*name, validator))
            })
            .collect();

        Self {
            schemas,
            validators,
        }
    }

    /// Get a schema by name. Returns `None` if not found.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.schemas.get(name)
    }

    /// Validate a JSON value against a named schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotFound` if the schema name is unknown,
    /// `SchemaError::Generation` if the schema failed to compile, or
    /// `SchemaError::ValidationFailed` if validation produces errors.
    pub fn validate(&self, name: &str, instance: &serde_json::Value) -> Result<(), SchemaError> {
        if self.get(name).is_none() {
            return Err(SchemaError::NotFound(name.to_string()));
        }
        let validator = self
            .validators
            .get(name)
            .ok_or_else(|| SchemaError::Generation(format!("schema '{name}' did not compile")))?;

        let errors: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| format!("{e}"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed { errors })
        }
    }

    /// Validate against a named schema, then deserialize into `T`.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::validate`], or `SchemaError::Deserialize` when
    /// serde rejects a value the schema accepted.
    pub fn parse<T: DeserializeOwned>(
        &self,
        name: &str,
        instance: serde_json::Value,
    ) -> Result<T, SchemaError> {
        self.validate(name, &instance)?;
        serde_json::from_value(instance).map_err(|e| SchemaError::Deserialize(e.to_string()))
    }

    /// List all registered schema names.
    #[must_use]
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.schemas.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
