use actix_web::{HttpResponse, Responder, web};

use crate::{
    auth::auth::AuthUser,
    documents::AgentDocumentService,
    model::{
        agent::Agent,
        agent_document::{AgentDocument, AgentDocumentFilter, NewAgentDocument},
    },
    store::Backend,
};

/// Apply an agent document: create, update or delete an agent.
#[utoipa::path(
    post,
    path = "/api/agent-documents",
    request_body = NewAgentDocument,
    responses(
        (status = 201, description = "Document applied", body = AgentDocument),
        (status = 400, description = "Missing agent_id or data for the action"),
        (status = 404, description = "Agent not found"),
        (status = 409, description = "Email or phone number already used")
    ),
    tag = "Agent",
    security(("bearer_auth" = []))
)]
pub async fn create_agent_document<S: Backend>(
    auth: AuthUser,
    service: web::Data<AgentDocumentService<S>>,
    payload: web::Json<NewAgentDocument>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let document = service.submit(payload.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::Created().json(document))
}

#[utoipa::path(
    get,
    path = "/api/agent-documents",
    params(AgentDocumentFilter),
    responses((status = 200, description = "Agent documents, newest first", body = [AgentDocument])),
    tag = "Agent",
    security(("bearer_auth" = []))
)]
pub async fn list_agent_documents<S: Backend>(
    auth: AuthUser,
    service: web::Data<AgentDocumentService<S>>,
    query: web::Query<AgentDocumentFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    Ok(HttpResponse::Ok().json(service.list_documents(&query).await?))
}

#[utoipa::path(
    get,
    path = "/api/agent-documents/{id}",
    params(("id", Path, description = "Agent document ID")),
    responses(
        (status = 200, description = "Agent document", body = AgentDocument),
        (status = 404, description = "Agent document not found")
    ),
    tag = "Agent",
    security(("bearer_auth" = []))
)]
pub async fn get_agent_document<S: Backend>(
    auth: AuthUser,
    service: web::Data<AgentDocumentService<S>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    Ok(HttpResponse::Ok().json(service.get_document(path.into_inner()).await?))
}

#[utoipa::path(
    get,
    path = "/api/agents",
    responses((status = 200, description = "All agents", body = [Agent])),
    tag = "Agent",
    security(("bearer_auth" = []))
)]
pub async fn list_agents<S: Backend>(
    _auth: AuthUser,
    service: web::Data<AgentDocumentService<S>>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(service.list_agents().await?))
}

#[utoipa::path(
    get,
    path = "/api/agents/{id}",
    params(("id", Path, description = "Agent ID")),
    responses(
        (status = 200, description = "Agent", body = Agent),
        (status = 404, description = "Agent not found")
    ),
    tag = "Agent",
    security(("bearer_auth" = []))
)]
pub async fn get_agent<S: Backend>(
    _auth: AuthUser,
    service: web::Data<AgentDocumentService<S>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(service.get_agent(path.into_inner()).await?))
}
