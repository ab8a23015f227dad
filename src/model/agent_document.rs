use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::model::{agent::AgentFields, change_log::ChangeAction};

/// A request to create, update or delete an agent, kept as a document so the
/// mutation can be audited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AgentDocument {
    #[schema(example = 1)]
    pub id: u64,
    /// Agent the document acted on; kept after the agent is deleted.
    #[schema(example = 5)]
    pub agent_id: u64,
    #[schema(example = "update")]
    pub action: ChangeAction,
    #[schema(example = 2)]
    pub user_id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({
    "action": "update",
    "agent_id": 5,
    "data": {
        "name": "North Logistics",
        "description": null,
        "email": "north@agency.example",
        "phone_number": "+70000000001"
    }
}))]
pub struct NewAgentDocument {
    pub action: ChangeAction,
    /// Required for update and delete, forbidden for create.
    pub agent_id: Option<u64>,
    /// Required for create and update.
    pub data: Option<AgentFields>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct AgentDocumentFilter {
    /// Filter by agent ID
    pub agent_id: Option<u64>,
    /// Filter by action
    pub action: Option<ChangeAction>,
}

impl AgentDocumentFilter {
    pub fn matches(&self, document: &AgentDocument) -> bool {
        self.agent_id.is_none_or(|id| document.agent_id == id)
            && self.action.is_none_or(|a| document.action == a)
    }
}
