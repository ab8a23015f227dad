use crate::{
    auth::auth::AuthUser,
    model::{employee::Employee, role::Role},
    utils::db_utils::{SqlValue, WhereClause, bind_query, bind_query_as, bind_query_scalar, build_update_sql},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

/// Columns a partial update may touch.
const UPDATABLE: &[&str] = &[
    "first_name",
    "middle_name",
    "last_name",
    "email",
    "phone_number",
    "date_of_birth",
    "date_of_hire",
    "position",
    "role",
    "agent_id",
    "default_pickup_point_id",
];

const SELECT_EMPLOYEE: &str = r#"
    SELECT id, first_name, middle_name, last_name, email, phone_number, date_of_birth,
           date_of_hire, position, role, agent_id, default_pickup_point_id, is_active
    FROM employees
"#;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Ivan")]
    pub first_name: String,
    #[schema(example = "Petrovich")]
    pub middle_name: Option<String>,
    #[schema(example = "Sidorov")]
    pub last_name: String,
    #[schema(example = "ivan@agency.example", format = "email")]
    pub email: String,
    #[schema(example = "+70000000002")]
    pub phone_number: Option<String>,
    #[schema(example = "1990-01-01", format = "date", value_type = Option<String>)]
    pub date_of_birth: Option<NaiveDate>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date_of_hire: NaiveDate,
    #[schema(example = "Operator")]
    pub position: String,
    #[serde(default)]
    pub role: Role,
    #[schema(example = 1)]
    pub agent_id: u64,
    #[schema(example = 3)]
    pub default_pickup_point_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Filter by agent
    pub agent_id: Option<u64>,
    /// Filter by active flag
    pub is_active: Option<bool>,
    /// Search by name or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeResponse {
    #[serde(flatten)]
    pub employee: Employee,
    #[schema(example = "Sidorov Ivan Petrovich")]
    pub full_name: String,
}

impl From<Employee> for EmployeeResponse {
    fn from(employee: Employee) -> Self {
        Self {
            full_name: employee.full_name(),
            employee,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<EmployeeResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

fn db_error(e: sqlx::Error) -> actix_web::Error {
    error!(error = %e, "Employee query failed");
    ErrorInternalServerError("Internal Server Error")
}

async fn fetch_employee(pool: &MySqlPool, employee_id: u64) -> actix_web::Result<Option<Employee>> {
    sqlx::query_as::<_, Employee>(&format!("{SELECT_EMPLOYEE} WHERE id = ?"))
        .bind(employee_id)
        .fetch_optional(pool)
        .await
        .map_err(db_error)
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": "Employee not found" }))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = EmployeeResponse),
        (status = 400, description = "Invalid payload or unknown agent / pickup point"),
        (status = 409, description = "Email already used"),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "message": "Something went wrong, Contact with system admin"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "first_name and last_name are required"
        })));
    }
    if !payload.email.contains('@') {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": "email is not valid" })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (first_name, middle_name, last_name, email, phone_number, date_of_birth,
         date_of_hire, position, role, agent_id, default_pickup_point_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.first_name)
    .bind(&payload.middle_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone_number)
    .bind(payload.date_of_birth)
    .bind(payload.date_of_hire)
    .bind(&payload.position)
    .bind(payload.role.to_string())
    .bind(payload.agent_id)
    .bind(payload.default_pickup_point_id)
    .execute(pool.get_ref())
    .await;

    let id = match result {
        Ok(done) => done.last_insert_id(),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Ok(HttpResponse::Conflict().json(json!({ "message": "Email already used" })));
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Agent or pickup point does not exist"
            })));
        }
        Err(e) => {
            error!(error = %e, "Failed to Create Employee");
            return Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })));
        }
    };

    info!(employee_id = id, created_by = auth.user_id, "Employee created");
    match fetch_employee(pool.get_ref(), id).await? {
        Some(employee) => Ok(HttpResponse::Created().json(EmployeeResponse::from(employee))),
        None => Ok(not_found()),
    }
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = u64::from(page - 1) * u64::from(per_page);

    let mut filter = WhereClause::new();
    filter.push_opt("agent_id = ?", query.agent_id);
    filter.push_opt("is_active = ?", query.is_active);
    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let like = SqlValue::from(format!("%{}%", search.trim()));
        filter.push_many(
            "(first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)",
            vec![like.clone(), like.clone(), like],
        );
    }
    let where_clause = filter.sql();

    let count_sql = format!("SELECT COUNT(*) FROM employees{}", where_clause);
    debug!(sql = %count_sql, "Counting employees");
    let total = bind_query_scalar(sqlx::query_scalar::<_, i64>(&count_sql), &filter.values)
        .fetch_one(pool.get_ref())
        .await
        .map_err(db_error)?;

    let data_sql = format!("{SELECT_EMPLOYEE}{where_clause} ORDER BY id DESC LIMIT ? OFFSET ?");
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");
    let employees = bind_query_as(sqlx::query_as::<_, Employee>(&data_sql), &filter.values)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees.into_iter().map(EmployeeResponse::from).collect(),
        page,
        per_page,
        total,
    }))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeResponse),
        (status = 400, description = "Unknown or empty fields"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    let employee_id = path.into_inner();

    let update = build_update_sql("employees", &body, UPDATABLE, "id", employee_id)?;
    if fetch_employee(pool.get_ref(), employee_id).await?.is_none() {
        return Ok(not_found());
    }

    bind_query(sqlx::query(&update.sql), &update.values)
        .execute(pool.get_ref())
        .await
        .map_err(db_error)?;
    info!(employee_id, updated_by = auth.user_id, "Employee updated");

    match fetch_employee(pool.get_ref(), employee_id).await? {
        Some(employee) => Ok(HttpResponse::Ok().json(EmployeeResponse::from(employee))),
        None => Ok(not_found()),
    }
}

/// Deactivate Employee. The record is kept for schedules and reports.
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}/deactivate",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee deactivated", body = EmployeeResponse),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn deactivate_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    let employee_id = path.into_inner();

    let Some(mut employee) = fetch_employee(pool.get_ref(), employee_id).await? else {
        return Ok(not_found());
    };

    if employee.is_active {
        sqlx::query("UPDATE employees SET is_active = FALSE WHERE id = ?")
            .bind(employee_id)
            .execute(pool.get_ref())
            .await
            .map_err(db_error)?;
        employee.is_active = false;
        info!(employee_id, updated_by = auth.user_id, "Employee deactivated");
    }

    Ok(HttpResponse::Ok().json(EmployeeResponse::from(employee)))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeResponse),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = path.into_inner();

    match fetch_employee(pool.get_ref(), employee_id).await? {
        Some(employee) => Ok(HttpResponse::Ok().json(EmployeeResponse::from(employee))),
        None => Ok(not_found()),
    }
}
