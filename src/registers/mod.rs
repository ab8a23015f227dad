//! Registers: append-only records produced as a side effect of documents.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::change_log::{ChangeAction, ChangeLogEntry, DocumentChange, NewChangeLogEntry};
use crate::store::ChangeLogStore;

/// Writes change-log entries after a document mutation has been stored.
///
/// A failed write is logged and swallowed: the primary mutation is already
/// committed and is never undone because its audit record could not be kept.
pub struct ChangeLogRecorder<L> {
    log: Arc<L>,
}

impl<L> Clone for ChangeLogRecorder<L> {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
        }
    }
}

impl<L: ChangeLogStore> ChangeLogRecorder<L> {
    pub fn new(log: Arc<L>) -> Self {
        Self { log }
    }

    pub async fn record(
        &self,
        change: DocumentChange,
        action: ChangeAction,
        actor_id: u64,
    ) -> Option<ChangeLogEntry> {
        let kind = change.kind();
        let document_id = change.document_id();
        let entry = NewChangeLogEntry {
            change,
            action,
            actor_id,
        };

        match self.log.append(&entry).await {
            Ok(stored) => {
                debug!(entry_id = stored.id, document_type = %kind, document_id, %action, "Change recorded");
                Some(stored)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    document_type = %kind,
                    document_id,
                    %action,
                    actor_id,
                    "Failed to record change; the document mutation stands"
                );
                None
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::BrokenChangeLog;
    use super::*;
    use crate::model::agent::AgentFields;
    use crate::model::change_log::ChangeLogFilter;
    use crate::store::InMemoryStore;

    fn created_agent() -> DocumentChange {
        DocumentChange::AgentDocument {
            document_id: 1,
            previous: None,
            new: Some(AgentFields {
                name: "North".into(),
                description: None,
                email: "north@example.com".into(),
                phone_number: "100".into(),
            }),
        }
    }

    #[actix_web::test]
    async fn recorded_entries_are_listed_newest_first() {
        let store = Arc::new(InMemoryStore::new());
        let recorder = ChangeLogRecorder::new(store.clone());

        recorder.record(created_agent(), ChangeAction::Create, 5).await.unwrap();
        recorder.record(created_agent(), ChangeAction::Update, 6).await.unwrap();

        let (entries, total) = store.list_entries(&ChangeLogFilter::default()).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(entries[0].action, ChangeAction::Update);
        assert_eq!(entries[0].actor_id, 6);
        assert_eq!(entries[1].action, ChangeAction::Create);
    }

    #[actix_web::test]
    async fn failed_write_is_swallowed() {
        let recorder = ChangeLogRecorder::new(Arc::new(BrokenChangeLog));
        assert!(recorder.record(created_agent(), ChangeAction::Create, 5).await.is_none());
    }
}
