//! Agent lifecycle documents.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::{Entity, ServiceError};
use crate::model::{
    agent::{Agent, AgentFields},
    agent_document::{AgentDocument, AgentDocumentFilter, NewAgentDocument},
    change_log::{ChangeAction, DocumentChange},
};
use crate::registers::ChangeLogRecorder;
use crate::store::{AgentStore, ChangeLogStore};

/// A validated agent document, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AgentCommand {
    Create(AgentFields),
    Update(u64, AgentFields),
    Delete(u64),
}

impl TryFrom<NewAgentDocument> for AgentCommand {
    type Error = ServiceError;

    fn try_from(doc: NewAgentDocument) -> Result<Self, Self::Error> {
        let command = match (doc.action, doc.agent_id, doc.data) {
            (ChangeAction::Create, None, Some(data)) => AgentCommand::Create(data),
            (ChangeAction::Create, Some(_), _) => {
                return Err(ServiceError::Validation(
                    "agent_id must not be set when creating an agent".into(),
                ));
            }
            (ChangeAction::Update, Some(id), Some(data)) => AgentCommand::Update(id, data),
            (ChangeAction::Delete, Some(id), _) => AgentCommand::Delete(id),
            (ChangeAction::Delete, None, _) => {
                return Err(ServiceError::Validation(
                    "agent_id is required to delete an agent".into(),
                ));
            }
            (action, _, _) => {
                return Err(ServiceError::Validation(format!(
                    "agent_id and data are required to {action} an agent"
                )));
            }
        };

        match &command {
            AgentCommand::Create(fields) | AgentCommand::Update(_, fields) => {
                fields.validate().map_err(ServiceError::Validation)?
            }
            AgentCommand::Delete(_) => {}
        }
        Ok(command)
    }
}

pub struct AgentDocumentService<S, L = S> {
    store: Arc<S>,
    recorder: ChangeLogRecorder<L>,
}

impl<S: AgentStore, L: ChangeLogStore> AgentDocumentService<S, L> {
    pub fn new(store: Arc<S>, log: Arc<L>) -> Self {
        Self {
            store,
            recorder: ChangeLogRecorder::new(log),
        }
    }

    async fn existing_agent(&self, agent_id: u64) -> Result<Agent, ServiceError> {
        self.store
            .load_agent(agent_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(Entity::Agent, agent_id))
    }

    /// Applies the document to the agent book, stores the document and
    /// records the agent snapshots before and after.
    #[instrument(skip(self, doc), fields(action = %doc.action))]
    pub async fn submit(
        &self,
        doc: NewAgentDocument,
        actor_id: u64,
    ) -> Result<AgentDocument, ServiceError> {
        let action = doc.action;
        let (agent_id, previous, new) = match AgentCommand::try_from(doc)? {
            AgentCommand::Create(fields) => {
                let agent = self.store.insert_agent(&fields).await?;
                (agent.id, None, Some(AgentFields::from(&agent)))
            }
            AgentCommand::Update(id, fields) => {
                let before = self.existing_agent(id).await?;
                let after = self.store.update_agent(id, &fields).await?;
                (id, Some(AgentFields::from(&before)), Some(AgentFields::from(&after)))
            }
            AgentCommand::Delete(id) => {
                let before = self.existing_agent(id).await?;
                if !self.store.delete_agent(id).await? {
                    return Err(ServiceError::not_found(Entity::Agent, id));
                }
                (id, Some(AgentFields::from(&before)), None)
            }
        };

        let document = self
            .store
            .insert_agent_document(agent_id, action, actor_id)
            .await?;
        info!(document_id = document.id, agent_id, "Agent document applied");

        self.recorder
            .record(
                DocumentChange::AgentDocument {
                    document_id: document.id,
                    previous,
                    new,
                },
                action,
                actor_id,
            )
            .await;
        Ok(document)
    }

    pub async fn get_document(&self, document_id: u64) -> Result<AgentDocument, ServiceError> {
        self.store
            .load_agent_document(document_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(Entity::AgentDocument, document_id))
    }

    pub async fn list_documents(
        &self,
        filter: &AgentDocumentFilter,
    ) -> Result<Vec<AgentDocument>, ServiceError> {
        Ok(self.store.list_agent_documents(filter).await?)
    }

    pub async fn get_agent(&self, agent_id: u64) -> Result<Agent, ServiceError> {
        self.existing_agent(agent_id).await
    }

    pub async fn list_agents(&self) -> Result<Vec<Agent>, ServiceError> {
        Ok(self.store.list_agents().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::change_log::ChangeLogFilter;
    use crate::registers::testing::BrokenChangeLog;
    use crate::store::InMemoryStore;

    fn fields(email: &str, phone: &str) -> AgentFields {
        AgentFields {
            name: "North Logistics".into(),
            description: None,
            email: email.into(),
            phone_number: phone.into(),
        }
    }

    fn create(email: &str, phone: &str) -> NewAgentDocument {
        NewAgentDocument {
            action: ChangeAction::Create,
            agent_id: None,
            data: Some(fields(email, phone)),
        }
    }

    fn service() -> (Arc<InMemoryStore>, AgentDocumentService<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), AgentDocumentService::new(store.clone(), store))
    }

    #[actix_web::test]
    async fn lifecycle_is_recorded_with_snapshots() {
        let (store, svc) = service();
        let created = svc.submit(create("a@x.io", "100"), 1).await.unwrap();
        let agent_id = created.agent_id;

        let update = NewAgentDocument {
            action: ChangeAction::Update,
            agent_id: Some(agent_id),
            data: Some(AgentFields {
                name: "South Logistics".into(),
                ..fields("a@x.io", "100")
            }),
        };
        svc.submit(update, 2).await.unwrap();
        assert_eq!(svc.get_agent(agent_id).await.unwrap().name, "South Logistics");

        let delete = NewAgentDocument {
            action: ChangeAction::Delete,
            agent_id: Some(agent_id),
            data: None,
        };
        let deleted = svc.submit(delete, 3).await.unwrap();
        assert_eq!(deleted.agent_id, agent_id);
        assert!(matches!(
            svc.get_agent(agent_id).await,
            Err(ServiceError::NotFound { entity: Entity::Agent, .. })
        ));

        let (entries, total) = store.list_entries(&ChangeLogFilter::default()).await.unwrap();
        assert_eq!(total, 3);
        let actions: Vec<_> = entries.iter().rev().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![ChangeAction::Create, ChangeAction::Update, ChangeAction::Delete]
        );
        match &entries[1].change {
            DocumentChange::AgentDocument { previous, new, .. } => {
                assert_eq!(previous.as_ref().unwrap().name, "North Logistics");
                assert_eq!(new.as_ref().unwrap().name, "South Logistics");
            }
            other => panic!("unexpected change {other:?}"),
        }
        assert_eq!(svc.list_documents(&AgentDocumentFilter::default()).await.unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn malformed_documents_are_refused() {
        let (store, svc) = service();
        let cases = [
            NewAgentDocument { action: ChangeAction::Create, agent_id: None, data: None },
            NewAgentDocument {
                action: ChangeAction::Create,
                agent_id: Some(1),
                data: Some(fields("a@x.io", "1")),
            },
            NewAgentDocument { action: ChangeAction::Update, agent_id: Some(1), data: None },
            NewAgentDocument { action: ChangeAction::Delete, agent_id: None, data: None },
            create("not-an-email", "1"),
        ];
        for doc in cases {
            assert!(matches!(svc.submit(doc, 1).await, Err(ServiceError::Validation(_))));
        }
        assert!(store.list_agents().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn unknown_agent_and_duplicates() {
        let (_, svc) = service();
        let missing = NewAgentDocument {
            action: ChangeAction::Delete,
            agent_id: Some(77),
            data: None,
        };
        assert!(matches!(
            svc.submit(missing, 1).await,
            Err(ServiceError::NotFound { entity: Entity::Agent, id: 77 })
        ));

        svc.submit(create("a@x.io", "100"), 1).await.unwrap();
        assert!(matches!(
            svc.submit(create("a@x.io", "200"), 1).await,
            Err(ServiceError::Duplicate(_))
        ));
    }

    #[actix_web::test]
    async fn broken_change_log_keeps_the_agent() {
        let store = Arc::new(InMemoryStore::new());
        let svc = AgentDocumentService::new(store.clone(), Arc::new(BrokenChangeLog));
        let doc = svc.submit(create("a@x.io", "100"), 1).await.unwrap();
        assert!(store.load_agent(doc.agent_id).await.unwrap().is_some());
        assert_eq!(svc.get_document(doc.id).await.unwrap(), doc);
    }
}
