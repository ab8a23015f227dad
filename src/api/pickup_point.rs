use crate::{auth::auth::AuthUser, model::pickup_point::PickupPoint};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

const SELECT_POINT: &str =
    "SELECT id, name, description, address, agent_id, created_at FROM pickup_points";

#[derive(Deserialize, ToSchema)]
pub struct CreatePickupPoint {
    #[schema(example = "PVZ Central")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "12 Market St")]
    pub address: String,
    #[schema(example = 1)]
    pub agent_id: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PickupPointQuery {
    /// Filter by owning agent
    pub agent_id: Option<u64>,
}

fn db_error(e: sqlx::Error) -> actix_web::Error {
    error!(error = %e, "Pickup point query failed");
    ErrorInternalServerError("Internal Server Error")
}

#[utoipa::path(
    post,
    path = "/api/pickup-points",
    request_body = CreatePickupPoint,
    responses(
        (status = 201, description = "Pickup point created", body = PickupPoint),
        (status = 400, description = "Invalid payload or unknown agent")
    ),
    tag = "PickupPoint",
    security(("bearer_auth" = []))
)]
pub async fn create_pickup_point(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePickupPoint>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    if payload.name.trim().is_empty() || payload.address.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "name and address are required"
        })));
    }

    let result = sqlx::query(
        "INSERT INTO pickup_points (name, description, address, agent_id) VALUES (?, ?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.address)
    .bind(payload.agent_id)
    .execute(pool.get_ref())
    .await;

    let id = match result {
        Ok(done) => done.last_insert_id(),
        Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("agent {} does not exist", payload.agent_id)
            })));
        }
        Err(e) => return Err(db_error(e)),
    };
    info!(pickup_point_id = id, agent_id = payload.agent_id, "Pickup point created");

    let point = sqlx::query_as::<_, PickupPoint>(&format!("{SELECT_POINT} WHERE id = ?"))
        .bind(id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(db_error)?;
    Ok(HttpResponse::Created().json(point))
}

#[utoipa::path(
    get,
    path = "/api/pickup-points",
    params(PickupPointQuery),
    responses((status = 200, description = "Pickup points", body = [PickupPoint])),
    tag = "PickupPoint",
    security(("bearer_auth" = []))
)]
pub async fn list_pickup_points(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PickupPointQuery>,
) -> actix_web::Result<impl Responder> {
    let points = match query.agent_id {
        Some(agent_id) => {
            sqlx::query_as::<_, PickupPoint>(&format!("{SELECT_POINT} WHERE agent_id = ? ORDER BY name"))
                .bind(agent_id)
                .fetch_all(pool.get_ref())
                .await
        }
        None => {
            sqlx::query_as::<_, PickupPoint>(&format!("{SELECT_POINT} ORDER BY name"))
                .fetch_all(pool.get_ref())
                .await
        }
    }
    .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(points))
}

#[utoipa::path(
    get,
    path = "/api/pickup-points/{id}",
    params(("id", Path, description = "Pickup point ID")),
    responses(
        (status = 200, description = "Pickup point", body = PickupPoint),
        (status = 404, description = "Pickup point not found")
    ),
    tag = "PickupPoint",
    security(("bearer_auth" = []))
)]
pub async fn get_pickup_point(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let point = sqlx::query_as::<_, PickupPoint>(&format!("{SELECT_POINT} WHERE id = ?"))
        .bind(path.into_inner())
        .fetch_optional(pool.get_ref())
        .await
        .map_err(db_error)?;

    Ok(match point {
        Some(p) => HttpResponse::Ok().json(p),
        None => HttpResponse::NotFound().json(json!({ "message": "Pickup point not found" })),
    })
}
