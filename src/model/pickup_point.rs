use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PickupPoint {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "PVZ Central")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "12 Market St")]
    pub address: String,
    #[schema(example = 1)]
    pub agent_id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}
