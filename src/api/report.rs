use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;

use crate::{
    auth::auth::AuthUser, model::report::WorkScheduleReport, scheduling::ScheduleService,
    store::Backend,
};

/// Summarise an employee's approved shifts over the report window ending today.
#[utoipa::path(
    post,
    path = "/api/reports/work-schedule/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 201, description = "Report generated and stored", body = WorkScheduleReport),
        (status = 404, description = "Employee not found")
    ),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn generate_work_schedule_report<S: Backend>(
    auth: AuthUser,
    service: web::Data<ScheduleService<S>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    let report = service
        .generate_report(path.into_inner(), Utc::now().date_naive())
        .await?;
    Ok(HttpResponse::Created().json(report))
}
