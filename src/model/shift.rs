use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Anything occupying a time range on one calendar day.
pub trait TimeSlot {
    fn date(&self) -> NaiveDate;
    fn start_time(&self) -> NaiveTime;
    fn end_time(&self) -> NaiveTime;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 11,
    "schedule_id": 1,
    "employee_id": 7,
    "date": "2024-01-01",
    "start_time": "09:00:00",
    "end_time": "13:00:00",
    "is_approved": false
}))]
pub struct WorkShift {
    pub id: u64,
    pub schedule_id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
    pub is_approved: bool,
}

/// Payload for a shift that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewShift {
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:00:00", value_type = String)]
    pub start_time: NaiveTime,
    #[schema(example = "13:00:00", value_type = String)]
    pub end_time: NaiveTime,
}

/// Partial edit of a stored shift; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ShiftPatch {
    pub employee_id: Option<u64>,
    #[schema(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
}

impl WorkShift {
    pub fn apply(&self, patch: &ShiftPatch) -> WorkShift {
        WorkShift {
            employee_id: patch.employee_id.unwrap_or(self.employee_id),
            date: patch.date.unwrap_or(self.date),
            start_time: patch.start_time.unwrap_or(self.start_time),
            end_time: patch.end_time.unwrap_or(self.end_time),
            ..self.clone()
        }
    }
}

impl TimeSlot for WorkShift {
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn start_time(&self) -> NaiveTime {
        self.start_time
    }
    fn end_time(&self) -> NaiveTime {
        self.end_time
    }
}

impl TimeSlot for NewShift {
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn start_time(&self) -> NaiveTime {
        self.start_time
    }
    fn end_time(&self) -> NaiveTime {
        self.end_time
    }
}
