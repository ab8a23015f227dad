use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Worked hours and approved shift count of an employee over the report window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 7,
    "report_date": "2024-01-31",
    "total_hours": 36.5,
    "approved_shifts": 5,
    "created_at": "2024-01-31T10:00:00Z"
}))]
pub struct WorkScheduleReport {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub report_date: NaiveDate,
    pub total_hours: f64,
    pub approved_shifts: u32,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkScheduleReport {
    pub employee_id: u64,
    pub report_date: NaiveDate,
    pub total_hours: f64,
    pub approved_shifts: u32,
}
