use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::model::shift::WorkShift;

/// Approval state of a work schedule.
///
/// `in_review` is accepted on input as another name for `on_approval`;
/// output always uses `on_approval`.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScheduleStatus {
    Draft,
    #[serde(alias = "in_review")]
    #[strum(to_string = "on_approval", serialize = "in_review")]
    OnApproval,
    Approved,
    Rejected,
}

impl ScheduleStatus {
    /// Shifts may only be added, edited or removed before a decision is made.
    pub fn is_editable(self) -> bool {
        matches!(self, ScheduleStatus::Draft | ScheduleStatus::OnApproval)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 7,
    "pickup_point_id": 3,
    "start_date": "2024-01-01",
    "end_date": "2024-01-07",
    "status": "draft",
    "created_at": "2024-01-01T00:00:00Z"
}))]
pub struct WorkSchedule {
    pub id: u64,
    pub employee_id: u64,
    pub pickup_point_id: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub status: ScheduleStatus,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl WorkSchedule {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewSchedule {
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = 3)]
    pub pickup_point_id: u64,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-07", value_type = String, format = "date")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ScheduleFilter {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Filter by pickup point ID
    pub pickup_point_id: Option<u64>,
    /// Filter by status (`in_review` is accepted)
    pub status: Option<ScheduleStatus>,
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Items per page
    pub per_page: Option<u32>,
}

impl ScheduleFilter {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.per_page())
    }

    pub fn matches(&self, schedule: &WorkSchedule) -> bool {
        self.employee_id.is_none_or(|id| schedule.employee_id == id)
            && self
                .pickup_point_id
                .is_none_or(|id| schedule.pickup_point_id == id)
            && self.status.is_none_or(|s| schedule.status == s)
    }
}

/// A schedule together with every shift it owns. Loaded and saved as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAggregate {
    pub schedule: WorkSchedule,
    pub shifts: Vec<WorkShift>,
}

impl ScheduleAggregate {
    pub fn id(&self) -> u64 {
        self.schedule.id
    }

    pub fn status(&self) -> ScheduleStatus {
        self.schedule.status
    }

    pub fn shift(&self, shift_id: u64) -> Option<&WorkShift> {
        self.shifts.iter().find(|s| s.id == shift_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_review_is_a_synonym_for_on_approval() {
        assert_eq!(
            "in_review".parse::<ScheduleStatus>().ok(),
            Some(ScheduleStatus::OnApproval)
        );
        assert_eq!(
            "on_approval".parse::<ScheduleStatus>().ok(),
            Some(ScheduleStatus::OnApproval)
        );
        let parsed: ScheduleStatus = serde_json::from_str("\"in_review\"").unwrap();
        assert_eq!(parsed, ScheduleStatus::OnApproval);
        assert_eq!(ScheduleStatus::OnApproval.to_string(), "on_approval");
        assert_eq!(
            serde_json::to_string(&ScheduleStatus::OnApproval).unwrap(),
            "\"on_approval\""
        );
    }

    #[test]
    fn page_offsets() {
        let first = ScheduleFilter::default();
        assert_eq!(first.offset(), 0);
        let huge = ScheduleFilter {
            page: Some(u32::MAX),
            per_page: Some(100),
            ..Default::default()
        };
        assert_eq!(huge.offset(), 429_496_729_400);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("archived".parse::<ScheduleStatus>().is_err());
    }

    #[test]
    fn only_undecided_schedules_are_editable() {
        assert!(ScheduleStatus::Draft.is_editable());
        assert!(ScheduleStatus::OnApproval.is_editable());
        assert!(!ScheduleStatus::Approved.is_editable());
        assert!(!ScheduleStatus::Rejected.is_editable());
    }
}
