use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An agent owns one or more pickup points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "North Logistics",
    "description": "Owns the northern district points",
    "email": "north@agency.example",
    "phone_number": "+70000000001",
    "created_at": "2024-01-01T00:00:00Z",
    "updated_at": "2024-01-01T00:00:00Z"
}))]
pub struct Agent {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub email: String,
    pub phone_number: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

/// The mutable fields of an agent. Doubles as the change-log snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AgentFields {
    #[schema(example = "North Logistics")]
    pub name: String,
    #[schema(example = "Owns the northern district points", nullable = true)]
    pub description: Option<String>,
    #[schema(example = "north@agency.example", format = "email")]
    pub email: String,
    #[schema(example = "+70000000001")]
    pub phone_number: String,
}

impl AgentFields {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("agent name must not be empty".into());
        }
        if !self.email.contains('@') {
            return Err("agent email is not valid".into());
        }
        if self.phone_number.trim().is_empty() || self.phone_number.len() > 15 {
            return Err("agent phone number must be 1 to 15 characters".into());
        }
        Ok(())
    }
}

impl From<&Agent> for AgentFields {
    fn from(agent: &Agent) -> Self {
        Self {
            name: agent.name.clone(),
            description: agent.description.clone(),
            email: agent.email.clone(),
            phone_number: agent.phone_number.clone(),
        }
    }
}
