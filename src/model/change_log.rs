use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::model::{
    agent::AgentFields,
    schedule::{ScheduleAggregate, ScheduleStatus},
    shift::WorkShift,
};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

/// Kinds of documents the change log knows how to reference.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentKind {
    AgentDocument,
    WorkSchedule,
}

/// Field values of a schedule at one point in time, shifts included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    pub employee_id: u64,
    pub pickup_point_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ScheduleStatus,
    pub shifts: Vec<WorkShift>,
}

impl From<&ScheduleAggregate> for ScheduleSnapshot {
    fn from(aggregate: &ScheduleAggregate) -> Self {
        let s = &aggregate.schedule;
        Self {
            employee_id: s.employee_id,
            pickup_point_id: s.pickup_point_id,
            start_date: s.start_date,
            end_date: s.end_date,
            status: s.status,
            shifts: aggregate.shifts.clone(),
        }
    }
}

/// What changed, on which document. Each document kind carries its own
/// snapshot type; `previous` is absent for creation, `new` for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "document_type", rename_all = "snake_case")]
pub enum DocumentChange {
    AgentDocument {
        document_id: u64,
        previous: Option<AgentFields>,
        new: Option<AgentFields>,
    },
    WorkSchedule {
        document_id: u64,
        previous: Option<ScheduleSnapshot>,
        new: Option<ScheduleSnapshot>,
    },
}

/// Storage shape of a [`DocumentChange`]: a kind tag, an id and two loose
/// JSON snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeParts {
    pub kind: DocumentKind,
    pub document_id: u64,
    pub previous: Option<Value>,
    pub new: Option<Value>,
}

impl DocumentChange {
    pub fn kind(&self) -> DocumentKind {
        match self {
            DocumentChange::AgentDocument { .. } => DocumentKind::AgentDocument,
            DocumentChange::WorkSchedule { .. } => DocumentKind::WorkSchedule,
        }
    }

    pub fn document_id(&self) -> u64 {
        match self {
            DocumentChange::AgentDocument { document_id, .. }
            | DocumentChange::WorkSchedule { document_id, .. } => *document_id,
        }
    }

    pub fn to_parts(&self) -> Result<ChangeParts, serde_json::Error> {
        let (previous, new) = match self {
            DocumentChange::AgentDocument { previous, new, .. } => (
                previous.as_ref().map(serde_json::to_value).transpose()?,
                new.as_ref().map(serde_json::to_value).transpose()?,
            ),
            DocumentChange::WorkSchedule { previous, new, .. } => (
                previous.as_ref().map(serde_json::to_value).transpose()?,
                new.as_ref().map(serde_json::to_value).transpose()?,
            ),
        };
        Ok(ChangeParts {
            kind: self.kind(),
            document_id: self.document_id(),
            previous,
            new,
        })
    }

    pub fn from_parts(parts: ChangeParts) -> Result<Self, serde_json::Error> {
        let ChangeParts {
            kind,
            document_id,
            previous,
            new,
        } = parts;
        Ok(match kind {
            DocumentKind::AgentDocument => DocumentChange::AgentDocument {
                document_id,
                previous: previous.map(serde_json::from_value).transpose()?,
                new: new.map(serde_json::from_value).transpose()?,
            },
            DocumentKind::WorkSchedule => DocumentChange::WorkSchedule {
                document_id,
                previous: previous.map(serde_json::from_value).transpose()?,
                new: new.map(serde_json::from_value).transpose()?,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewChangeLogEntry {
    pub change: DocumentChange,
    pub action: ChangeAction,
    pub actor_id: u64,
}

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeLogEntry {
    pub id: u64,
    pub change: DocumentChange,
    pub action: ChangeAction,
    pub actor_id: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ChangeLogFilter {
    /// Filter by document type
    pub document_type: Option<DocumentKind>,
    /// Filter by document ID
    pub document_id: Option<u64>,
    /// Filter by acting user ID
    pub actor_id: Option<u64>,
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Items per page
    pub per_page: Option<u32>,
}

impl ChangeLogFilter {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.per_page())
    }

    pub fn matches(&self, entry: &ChangeLogEntry) -> bool {
        self.document_type.is_none_or(|k| entry.change.kind() == k)
            && self
                .document_id
                .is_none_or(|id| entry.change.document_id() == id)
            && self.actor_id.is_none_or(|id| entry.actor_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_change_survives_storage_shape() {
        let change = DocumentChange::AgentDocument {
            document_id: 4,
            previous: None,
            new: Some(AgentFields {
                name: "North".into(),
                description: None,
                email: "n@example.com".into(),
                phone_number: "1".into(),
            }),
        };
        let parts = change.to_parts().unwrap();
        assert_eq!(parts.kind, DocumentKind::AgentDocument);
        assert_eq!(parts.document_id, 4);
        assert!(parts.previous.is_none());
        assert_eq!(DocumentChange::from_parts(parts).unwrap(), change);
    }

    #[test]
    fn snapshot_of_wrong_kind_is_refused() {
        let parts = ChangeParts {
            kind: DocumentKind::WorkSchedule,
            document_id: 1,
            previous: Some(serde_json::json!({"name": "not a schedule"})),
            new: None,
        };
        assert!(DocumentChange::from_parts(parts).is_err());
    }

    #[test]
    fn last_page_offset_does_not_overflow() {
        let filter = ChangeLogFilter {
            page: Some(u32::MAX),
            per_page: Some(100),
            ..Default::default()
        };
        assert_eq!(filter.offset(), u64::from(u32::MAX - 1) * 100);
    }

    #[test]
    fn document_kind_tags_are_snake_case() {
        assert_eq!(DocumentKind::AgentDocument.to_string(), "agent_document");
        assert_eq!(
            "work_schedule".parse::<DocumentKind>().ok(),
            Some(DocumentKind::WorkSchedule)
        );
    }
}
