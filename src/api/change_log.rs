use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::error;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    model::change_log::{ChangeAction, ChangeLogEntry, ChangeLogFilter, DocumentKind},
    store::ChangeLogStore,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ChangeLogResponse {
    pub id: u64,
    pub document_type: DocumentKind,
    pub document_id: u64,
    pub action: ChangeAction,
    /// Absent for creation.
    pub previous_data: Option<Value>,
    /// Absent for deletion.
    pub new_data: Option<Value>,
    pub actor_id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<ChangeLogEntry> for ChangeLogResponse {
    type Error = serde_json::Error;

    fn try_from(entry: ChangeLogEntry) -> Result<Self, Self::Error> {
        let parts = entry.change.to_parts()?;
        Ok(Self {
            id: entry.id,
            document_type: parts.kind,
            document_id: parts.document_id,
            action: entry.action,
            previous_data: parts.previous,
            new_data: parts.new,
            actor_id: entry.actor_id,
            timestamp: entry.timestamp,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChangeLogListResponse {
    pub data: Vec<ChangeLogResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Change-log register, newest first.
#[utoipa::path(
    get,
    path = "/api/change-log",
    params(ChangeLogFilter),
    responses((status = 200, description = "Paginated change-log entries", body = ChangeLogListResponse)),
    tag = "ChangeLog",
    security(("bearer_auth" = []))
)]
pub async fn list_change_log<S: ChangeLogStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    query: web::Query<ChangeLogFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    let filter = query.into_inner();

    let (entries, total) = store.list_entries(&filter).await.map_err(|e| {
        error!(error = %e, "Failed to list change log");
        ErrorInternalServerError("Internal Server Error")
    })?;
    let data = entries
        .into_iter()
        .map(ChangeLogResponse::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(ChangeLogListResponse {
        data,
        page: filter.page(),
        per_page: filter.per_page(),
        total,
    }))
}
