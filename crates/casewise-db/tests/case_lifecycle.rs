//! Case file lifecycle integration tests
//!
//! - Cascading deletes across every child table
//! - Audit entries outliving the entities they describe
//! - Concurrent writers on one shared service
//! - Persistence across reopen of a file-backed database

use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use casewise_config::DatabaseConfig;
use casewise_core::enums::{AuditAction, CaseStatus, InteractionType, ParticipantRole, ReportType};
use casewise_core::requests::{
    CreateCaseRequest, CreateInteractionRequest, CreateParticipantRequest, CreateTaskRequest,
};
use casewise_db::error::DatabaseError;
use casewise_db::repos::audit::AuditFilter;
use casewise_db::repos::interaction::InteractionFilter;
use casewise_db::repos::report::{NewReport, ReportFilter};
use casewise_db::repos::task::TaskFilter;
use casewise_db::service::CasewiseService;

async fn test_service() -> CasewiseService {
    CasewiseService::new_local(":memory:").await.unwrap()
}

fn case_request(claim: &str) -> CreateCaseRequest {
    CreateCaseRequest {
        worker_name: "Dana Whitfield".into(),
        claim_number: claim.into(),
        worker_email: None,
        worker_phone: None,
        insurer: None,
        employer: None,
        injury_date: NaiveDate::from_ymd_opt(2024, 3, 2),
        injury_description: None,
        rtw_goal: None,
    }
}

async fn count(svc: &CasewiseService, table: &str) -> i64 {
    let mut rows = svc
        .db()
        .query_with(&format!("SELECT count(*) FROM {table}"), || ())
        .await
        .unwrap();
    rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap()
}

// ---------------------------------------------------------------------------
// Cascades
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deleting_a_case_removes_its_whole_file() {
    let svc = test_service().await;
    let case = svc.create_case(&case_request("WC-1")).await.unwrap();
    let keep = svc.create_case(&case_request("WC-2")).await.unwrap();

    let gp = svc
        .create_participant(
            &case.id,
            &CreateParticipantRequest {
                role: ParticipantRole::Gp,
                name: "Dr Natarajan".into(),
                organisation: None,
                email: None,
                phone: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    svc.create_interaction(&CreateInteractionRequest {
        case_id: case.id.clone(),
        interaction_type: InteractionType::Meeting,
        subject: "Initial assessment".into(),
        occurred_at: None,
        duration_minutes: Some(60),
        notes: Some("Met worker and GP".into()),
        transcript: None,
        participant_ids: vec![gp.id.clone()],
    })
    .await
    .unwrap();
    svc.create_task(&CreateTaskRequest {
        case_id: case.id.clone(),
        description: "Send plan to insurer".into(),
        due_date: None,
        assigned_participant_id: Some(gp.id.clone()),
    })
    .await
    .unwrap();
    svc.create_report(&NewReport {
        case_id: &case.id,
        report_type: ReportType::InitialAssessment,
        title: "Initial Needs Assessment",
        content: "## Background\nShoulder strain.\n",
        generated: None,
    })
    .await
    .unwrap();

    svc.delete_case(&case.id).await.unwrap();

    for table in [
        "participants",
        "interactions",
        "interaction_participants",
        "tasks",
        "reports",
    ] {
        assert_eq!(count(&svc, table).await, 0, "{table} should be empty");
    }
    assert!(svc.get_case(&keep.id).await.is_ok());

    let trail = svc
        .query_audit(&AuditFilter {
            entity_id: Some(case.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(trail[0].action, AuditAction::Deleted);

    let interactions = svc
        .list_interactions(&InteractionFilter {
            query: Some("assessment".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(interactions.is_empty(), "FTS index should drop deleted rows");
}

#[tokio::test]
async fn child_lists_are_scoped_to_their_case() {
    let svc = test_service().await;
    let a = svc.create_case(&case_request("WC-A")).await.unwrap();
    let b = svc.create_case(&case_request("WC-B")).await.unwrap();
    for case_id in [&a.id, &b.id, &b.id] {
        svc.create_task(&CreateTaskRequest {
            case_id: case_id.clone(),
            description: "Follow up".into(),
            due_date: None,
            assigned_participant_id: None,
        })
        .await
        .unwrap();
        svc.create_report(&NewReport {
            case_id,
            report_type: ReportType::ProgressReport,
            title: "Progress Report",
            content: "",
            generated: None,
        })
        .await
        .unwrap();
    }

    let tasks = svc
        .list_tasks(&TaskFilter {
            case_id: Some(b.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(tasks.len(), 2);
    let reports = svc
        .list_reports(&ReportFilter {
            case_id: Some(a.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(reports.len(), 1);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_all_commit() {
    let svc = Arc::new(test_service().await);
    let case = svc.create_case(&case_request("WC-BUSY")).await.unwrap();

    let mut handles = Vec::new();
    for n in 0..16 {
        let svc = Arc::clone(&svc);
        let case_id = case.id.clone();
        handles.push(tokio::spawn(async move {
            svc.create_task(&CreateTaskRequest {
                case_id,
                description: format!("Task {n}"),
                due_date: None,
                assigned_participant_id: None,
            })
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(count(&svc, "tasks").await, 16);
    assert!(svc.db().conn().is_autocommit());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_writer_does_not_poison_others() {
    let svc = Arc::new(test_service().await);
    svc.create_case(&case_request("WC-DUP")).await.unwrap();

    let mut handles = Vec::new();
    for n in 0..8 {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            let claim = if n % 2 == 0 {
                "WC-DUP".to_string()
            } else {
                format!("WC-{n}")
            };
            svc.create_case(&case_request(&claim)).await
        }));
    }
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => {}
            Err(DatabaseError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(conflicts, 4);
    assert_eq!(count(&svc, "cases").await, 5);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn file_database_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        path: dir
            .path()
            .join("data")
            .join("casewise.db")
            .to_string_lossy()
            .into_owned(),
        ..Default::default()
    };

    let id = {
        let svc = CasewiseService::open(&config).await.unwrap();
        let case = svc.create_case(&case_request("WC-FILE")).await.unwrap();
        svc.transition_case(&case.id, CaseStatus::Active, None)
            .await
            .unwrap();
        case.id
    };

    let svc = CasewiseService::open(&config).await.unwrap();
    let case = svc.get_case(&id).await.unwrap();
    assert_eq!(case.status, CaseStatus::Active);
}
