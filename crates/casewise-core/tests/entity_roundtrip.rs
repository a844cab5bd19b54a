//! Serde roundtrip and JsonSchema validation tests for entity and response types.

use casewise_core::audit_detail::{AiDetail, LinkedDetail, StatusChangedDetail};
use casewise_core::entities::*;
use casewise_core::enums::*;
use casewise_core::responses::*;
use casewise_core::summary::Summary;
use chrono::{NaiveDate, TimeZone, Utc};
use schemars::schema_for;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn sample_case() -> Case {
    Case {
        id: "cas-a3f8b2c1".into(),
        worker_name: "Dana Whitfield".into(),
        worker_email: Some("dana@example.com".into()),
        worker_phone: None,
        claim_number: "WC-2024-0117".into(),
        insurer: Some("Allianz".into()),
        employer: Some("Northside Logistics".into()),
        injury_date: NaiveDate::from_ymd_opt(2024, 3, 2),
        injury_description: Some("Right shoulder strain lifting cartons".into()),
        status: CaseStatus::Active,
        capacity_summary: None,
        rtw_goal: Some("Pre-injury role, full hours".into()),
        created_at: Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap(),
    }
}

fn sample_interaction() -> Interaction {
    Interaction {
        id: "int-b7a3f9e2".into(),
        case_id: "cas-a3f8b2c1".into(),
        interaction_type: InteractionType::PhoneCall,
        subject: "Initial contact".into(),
        occurred_at: Utc.with_ymd_and_hms(2024, 3, 11, 14, 30, 0).unwrap(),
        duration_minutes: Some(25),
        notes: Some("Worker keen to return.".into()),
        transcript: None,
        ai_summary: Some("## Key Points\n- Keen to return\n".into()),
        participant_ids: vec!["par-c4e2d1f0".into()],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

roundtrip_and_validate!(case_roundtrip, Case, sample_case());

roundtrip_and_validate!(
    participant_roundtrip,
    Participant,
    Participant {
        id: "par-c4e2d1f0".into(),
        case_id: "cas-a3f8b2c1".into(),
        role: ParticipantRole::Gp,
        name: "Dr Priya Natarajan".into(),
        organisation: Some("Harbour Medical Centre".into()),
        email: None,
        phone: Some("02 9555 0101".into()),
        notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(interaction_roundtrip, Interaction, sample_interaction());

roundtrip_and_validate!(
    task_roundtrip,
    Task,
    Task {
        id: "tsk-a8d3e2b5".into(),
        case_id: "cas-a3f8b2c1".into(),
        description: "Request updated certificate of capacity".into(),
        due_date: NaiveDate::from_ymd_opt(2024, 3, 20),
        status: TaskStatus::Done,
        assigned_participant_id: Some("par-c4e2d1f0".into()),
        completed_at: Some(Utc::now()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    report_roundtrip,
    Report,
    Report {
        id: "rpt-e5a2d9f3".into(),
        case_id: "cas-a3f8b2c1".into(),
        report_type: ReportType::RtwPlan,
        title: "Return to Work Plan".into(),
        content: "## Goal\nPre-injury duties by June.\n".into(),
        status: ReportStatus::Draft,
        model: Some("gpt-4o-mini".into()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        finalized_at: None,
    }
);

roundtrip_and_validate!(
    audit_roundtrip,
    AuditEntry,
    AuditEntry {
        id: "aud-f3b7c1e4".into(),
        entity_type: EntityType::Task,
        entity_id: "tsk-a8d3e2b5".into(),
        action: AuditAction::StatusChanged,
        detail: Some(
            serde_json::to_value(StatusChangedDetail {
                from: "open".into(),
                to: "done".into(),
                reason: None,
            })
            .unwrap()
        ),
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    linked_detail_roundtrip,
    LinkedDetail,
    LinkedDetail {
        interaction_id: "int-b7a3f9e2".into(),
        participant_id: "par-c4e2d1f0".into(),
    }
);

roundtrip_and_validate!(
    ai_detail_roundtrip,
    AiDetail,
    AiDetail {
        model: "gpt-4o-mini".into(),
        chars: 1_204,
        duration_ms: 2_310,
    }
);

roundtrip_and_validate!(
    summary_response_roundtrip,
    SummaryResponse,
    SummaryResponse {
        interaction_id: "int-b7a3f9e2".into(),
        markdown: Some("Preamble\n\n## Actions\n- Call GP\n".into()),
        sections: Summary::parse("Preamble\n\n## Actions\n- Call GP\n"),
    }
);

roundtrip_and_validate!(
    overview_roundtrip,
    CaseOverview,
    CaseOverview {
        case: sample_case(),
        participants: vec![],
        recent_interactions: vec![sample_interaction()],
        open_tasks: vec![],
        overdue_tasks: 0,
        reports: vec![],
    }
);

#[test]
fn enum_values_serialize_snake_case() {
    assert_eq!(
        serde_json::to_value(CaseStatus::OnHold).unwrap(),
        serde_json::json!("on_hold")
    );
    assert_eq!(
        serde_json::to_value(InteractionType::CaseConference).unwrap(),
        serde_json::json!("case_conference")
    );
    assert_eq!(
        serde_json::to_value(ReportType::RtwPlan).unwrap(),
        serde_json::json!("rtw_plan")
    );
}

#[test]
fn case_schema_rejects_unknown_status() {
    let schema = serde_json::to_value(schema_for!(Case)).unwrap();
    let mut instance = serde_json::to_value(sample_case()).unwrap();
    instance["status"] = serde_json::json!("archived");
    let errors = validate_against_schema(&schema, &instance);
    assert!(!errors.is_empty());
}
