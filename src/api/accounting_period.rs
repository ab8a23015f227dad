use crate::{auth::auth::AuthUser, model::accounting_period::AccountingPeriod};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

const SELECT_PERIOD: &str = "SELECT id, name, description, agent_id, start_date, end_date, created_at FROM accounting_periods";

#[derive(Deserialize, ToSchema)]
pub struct CreateAccountingPeriod {
    #[schema(example = "January 2024")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 1)]
    pub agent_id: u64,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-31", value_type = String, format = "date")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AccountingPeriodQuery {
    pub agent_id: Option<u64>,
    /// Only periods covering today
    pub active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct AccountingPeriodResponse {
    #[serde(flatten)]
    pub period: AccountingPeriod,
    pub is_active: bool,
}

impl AccountingPeriodResponse {
    fn at(period: AccountingPeriod, today: NaiveDate) -> Self {
        Self {
            is_active: period.is_active(today),
            period,
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn db_error(e: sqlx::Error) -> actix_web::Error {
    error!(error = %e, "Accounting period query failed");
    ErrorInternalServerError("Internal Server Error")
}

#[utoipa::path(
    post,
    path = "/api/accounting-periods",
    request_body = CreateAccountingPeriod,
    responses(
        (status = 201, description = "Accounting period created", body = AccountingPeriodResponse),
        (status = 400, description = "start_date after end_date or unknown agent")
    ),
    tag = "AccountingPeriod",
    security(("bearer_auth" = []))
)]
pub async fn create_accounting_period(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAccountingPeriod>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    if payload.start_date > payload.end_date {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "start_date cannot be after end_date"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO accounting_periods (name, description, agent_id, start_date, end_date)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.agent_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
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
    info!(accounting_period_id = id, agent_id = payload.agent_id, "Accounting period created");

    let period = sqlx::query_as::<_, AccountingPeriod>(&format!("{SELECT_PERIOD} WHERE id = ?"))
        .bind(id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(db_error)?;
    Ok(HttpResponse::Created().json(AccountingPeriodResponse::at(period, today())))
}

#[utoipa::path(
    get,
    path = "/api/accounting-periods",
    params(AccountingPeriodQuery),
    responses((status = 200, description = "Accounting periods", body = [AccountingPeriodResponse])),
    tag = "AccountingPeriod",
    security(("bearer_auth" = []))
)]
pub async fn list_accounting_periods(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AccountingPeriodQuery>,
) -> actix_web::Result<impl Responder> {
    let periods = match query.agent_id {
        Some(agent_id) => {
            sqlx::query_as::<_, AccountingPeriod>(&format!(
                "{SELECT_PERIOD} WHERE agent_id = ? ORDER BY start_date DESC"
            ))
            .bind(agent_id)
            .fetch_all(pool.get_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, AccountingPeriod>(&format!("{SELECT_PERIOD} ORDER BY start_date DESC"))
                .fetch_all(pool.get_ref())
                .await
        }
    }
    .map_err(db_error)?;

    let today = today();
    let data: Vec<_> = periods
        .into_iter()
        .map(|p| AccountingPeriodResponse::at(p, today))
        .filter(|p| query.active.is_none_or(|active| p.is_active == active))
        .collect();
    Ok(HttpResponse::Ok().json(data))
}

#[utoipa::path(
    get,
    path = "/api/accounting-periods/{id}",
    params(("id", Path, description = "Accounting period ID")),
    responses(
        (status = 200, description = "Accounting period", body = AccountingPeriodResponse),
        (status = 404, description = "Accounting period not found")
    ),
    tag = "AccountingPeriod",
    security(("bearer_auth" = []))
)]
pub async fn get_accounting_period(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let period = sqlx::query_as::<_, AccountingPeriod>(&format!("{SELECT_PERIOD} WHERE id = ?"))
        .bind(path.into_inner())
        .fetch_optional(pool.get_ref())
        .await
        .map_err(db_error)?;

    Ok(match period {
        Some(p) => HttpResponse::Ok().json(AccountingPeriodResponse::at(p, today())),
        None => HttpResponse::NotFound().json(json!({ "message": "Accounting period not found" })),
    })
}
