//! Composite read for the case dashboard.

use chrono::Utc;

use casewise_core::responses::CaseOverview;

use crate::error::DatabaseError;
use crate::repos::report::ReportFilter;
use crate::repos::task::TaskFilter;
use crate::service::CasewiseService;

/// Interactions included in an overview.
pub const RECENT_INTERACTIONS: u32 = 10;

impl CasewiseService {
    /// The case with its participants, recent interactions, outstanding
    /// tasks, and reports.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the case does not exist.
    pub async fn case_overview(&self, case_id: &str) -> Result<CaseOverview, DatabaseError> {
        let case = self.get_case(case_id).await?;
        let participants = self.list_participants(case_id).await?;
        let recent_interactions = self
            .interactions_for_case(case_id, RECENT_INTERACTIONS)
            .await?;
        let open_tasks = self
            .list_tasks(&TaskFilter {
                case_id: Some(case_id.to_string()),
                outstanding: true,
                limit: Some(500),
                ..Default::default()
            })
            .await?;
        let today = Utc::now().date_naive();
        let overdue = open_tasks.iter().filter(|t| t.is_overdue(today)).count();
        let reports = self
            .list_reports(&ReportFilter {
                case_id: Some(case_id.to_string()),
                ..Default::default()
            })
            .await?;

        Ok(CaseOverview {
            case,
            participants,
            recent_interactions,
            open_tasks,
            overdue_tasks: u32::try_from(overdue).unwrap_or(u32::MAX),
            reports,
        })
    }
}
