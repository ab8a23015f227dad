use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "first_name": "Ivan",
        "middle_name": "Petrovich",
        "last_name": "Sidorov",
        "email": "ivan.sidorov@agency.example",
        "phone_number": "+70000000002",
        "date_of_birth": "1990-01-01",
        "date_of_hire": "2024-01-01",
        "position": "Operator",
        "role": "employee",
        "agent_id": 1,
        "default_pickup_point_id": 3,
        "is_active": true
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Ivan")]
    pub first_name: String,

    #[schema(example = "Petrovich", nullable = true)]
    pub middle_name: Option<String>,

    #[schema(example = "Sidorov")]
    pub last_name: String,

    #[schema(example = "ivan.sidorov@agency.example")]
    pub email: String,

    #[schema(example = "+70000000002", nullable = true)]
    pub phone_number: Option<String>,

    #[schema(example = "1990-01-01", value_type = Option<String>, format = "date")]
    pub date_of_birth: Option<NaiveDate>,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub date_of_hire: NaiveDate,

    #[schema(example = "Operator")]
    pub position: String,

    #[schema(example = "employee")]
    pub role: String,

    #[schema(example = 1)]
    pub agent_id: u64,

    #[schema(example = 3, nullable = true)]
    pub default_pickup_point_id: Option<u64>,

    #[schema(example = true)]
    pub is_active: bool,
}

impl Employee {
    /// "Last First Middle", without a trailing blank when there is no middle name.
    pub fn full_name(&self) -> String {
        format!(
            "{} {} {}",
            self.last_name,
            self.first_name,
            self.middle_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(middle: Option<&str>) -> Employee {
        Employee {
            id: 1,
            first_name: "John".into(),
            middle_name: middle.map(str::to_string),
            last_name: "Doe".into(),
            email: "john.doe@example.com".into(),
            phone_number: None,
            date_of_birth: None,
            date_of_hire: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            position: "Manager".into(),
            role: "manager".into(),
            agent_id: 1,
            default_pickup_point_id: None,
            is_active: true,
        }
    }

    #[test]
    fn full_name_orders_last_first_middle() {
        assert_eq!(employee(Some("Paul")).full_name(), "Doe John Paul");
        assert_eq!(employee(None).full_name(), "Doe John");
    }
}
