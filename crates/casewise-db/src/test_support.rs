//! Shared test utilities for casewise-db unit tests.

pub(crate) mod helpers {
    use casewise_core::entities::{Case, Participant};
    use casewise_core::enums::ParticipantRole;
    use casewise_core::requests::{CreateCaseRequest, CreateParticipantRequest};

    use crate::service::CasewiseService;

    /// Create an in-memory service.
    pub async fn test_service() -> CasewiseService {
        CasewiseService::new_local(":memory:").await.unwrap()
    }

    pub fn case_request(worker_name: &str, claim_number: &str) -> CreateCaseRequest {
        CreateCaseRequest {
            worker_name: worker_name.into(),
            claim_number: claim_number.into(),
            worker_email: None,
            worker_phone: None,
            insurer: Some("Allianz".into()),
            employer: Some("Northside Logistics".into()),
            injury_date: None,
            injury_description: Some("Right shoulder strain lifting cartons".into()),
            rtw_goal: None,
        }
    }

    /// Create a case with a unique claim number derived from the name.
    pub async fn create_test_case(svc: &CasewiseService, worker_name: &str) -> Case {
        let claim = format!("WC-{}", worker_name.replace(' ', "-").to_uppercase());
        svc.create_case(&case_request(worker_name, &claim)).await.unwrap()
    }

    pub async fn create_test_participant(
        svc: &CasewiseService,
        case_id: &str,
        role: ParticipantRole,
        name: &str,
    ) -> Participant {
        svc.create_participant(
            case_id,
            &CreateParticipantRequest {
                role,
                name: name.into(),
                organisation: None,
                email: None,
                phone: None,
                notes: None,
            },
        )
        .await
        .unwrap()
    }
}
