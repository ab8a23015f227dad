use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payroll accounting window of an agent. Worked hours, late arrivals and
/// parcel handovers are accumulated per day inside it.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AccountingPeriod {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "January 2024")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 1)]
    pub agent_id: u64,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-31", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl AccountingPeriod {
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.start_date <= today && today <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(start: &str, end: &str) -> AccountingPeriod {
        AccountingPeriod {
            id: 1,
            name: "p".into(),
            description: None,
            agent_id: 1,
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn active_includes_both_bounds() {
        let p = period("2024-01-01", "2024-01-31");
        assert!(p.is_active("2024-01-01".parse().unwrap()));
        assert!(p.is_active("2024-01-31".parse().unwrap()));
        assert!(!p.is_active("2024-02-01".parse().unwrap()));
        assert!(!p.is_active("2023-12-31".parse().unwrap()));
    }
}
