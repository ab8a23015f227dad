use actix_web::{HttpResponse, Responder, error::ErrorForbidden, web};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    model::{
        schedule::{NewSchedule, ScheduleAggregate, ScheduleFilter, WorkSchedule},
        shift::{NewShift, ShiftPatch, TimeSlot, WorkShift},
    },
    scheduling::{ScheduleService, conflict::ShiftConflict, is_conflicting},
    store::Backend,
};

/// A schedule with all of its shifts.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleDetail {
    #[serde(flatten)]
    pub schedule: WorkSchedule,
    pub shifts: Vec<WorkShift>,
}

impl From<ScheduleAggregate> for ScheduleDetail {
    fn from(aggregate: ScheduleAggregate) -> Self {
        Self {
            schedule: aggregate.schedule,
            shifts: aggregate.shifts,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleListResponse {
    pub data: Vec<WorkSchedule>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 3)]
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConflictReport {
    /// `true` when no two shifts overlap.
    pub conflict_free: bool,
    pub conflicts: Vec<ShiftConflict>,
}

/// A bare time range, used by the pairwise check.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct Slot {
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:00:00", value_type = String)]
    pub start_time: NaiveTime,
    #[schema(example = "13:00:00", value_type = String)]
    pub end_time: NaiveTime,
}

impl TimeSlot for Slot {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    fn end_time(&self) -> NaiveTime {
        self.end_time
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConflictCheckRequest {
    pub first: Slot,
    pub second: Slot,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConflictCheckResponse {
    pub conflicting: bool,
}

/// Employees see and submit only their own schedules.
fn ensure_own(auth: &AuthUser, schedule: &WorkSchedule) -> actix_web::Result<()> {
    if auth.is_employee() && auth.employee_id != Some(schedule.employee_id) {
        return Err(ErrorForbidden("Not your schedule"));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/schedules",
    params(ScheduleFilter),
    responses((status = 200, description = "Paginated schedules, newest first", body = ScheduleListResponse)),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
pub async fn list_schedules<S: Backend>(
    auth: AuthUser,
    service: web::Data<ScheduleService<S>>,
    query: web::Query<ScheduleFilter>,
) -> actix_web::Result<impl Responder> {
    let mut filter = query.into_inner();
    if auth.is_employee() {
        filter.employee_id = Some(auth.employee_id.unwrap_or_default());
    }

    let (data, total) = service.list_schedules(&filter).await?;
    Ok(HttpResponse::Ok().json(ScheduleListResponse {
        data,
        page: filter.page(),
        per_page: filter.per_page(),
        total,
    }))
}

#[utoipa::path(
    post,
    path = "/api/schedules",
    request_body = NewSchedule,
    responses(
        (status = 201, description = "Draft schedule created", body = WorkSchedule),
        (status = 400, description = "start_date after end_date"),
        (status = 404, description = "Unknown employee or pickup point")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
pub async fn create_schedule<S: Backend>(
    auth: AuthUser,
    service: web::Data<ScheduleService<S>>,
    payload: web::Json<NewSchedule>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    let schedule = service.create_schedule(&payload, auth.user_id).await?;
    Ok(HttpResponse::Created().json(schedule))
}

#[utoipa::path(
    get,
    path = "/api/schedules/{id}",
    params(("id", Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule with shifts", body = ScheduleDetail),
        (status = 404, description = "Schedule not found")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
pub async fn get_schedule<S: Backend>(
    auth: AuthUser,
    service: web::Data<ScheduleService<S>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let aggregate = service.get_schedule(path.into_inner()).await?;
    ensure_own(&auth, &aggregate.schedule)?;
    Ok(HttpResponse::Ok().json(ScheduleDetail::from(aggregate)))
}

#[utoipa::path(
    delete,
    path = "/api/schedules/{id}",
    params(("id", Path, description = "Schedule ID")),
    responses(
        (status = 204, description = "Schedule and its shifts deleted"),
        (status = 404, description = "Schedule not found")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
pub async fn delete_schedule<S: Backend>(
    auth: AuthUser,
    service: web::Data<ScheduleService<S>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    service.delete_schedule(path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/schedules/{id}/conflicts",
    params(("id", Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Overlapping shift pairs", body = ConflictReport),
        (status = 403, description = "Another employee's schedule"),
        (status = 404, description = "Schedule not found")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
pub async fn schedule_conflicts<S: Backend>(
    auth: AuthUser,
    service: web::Data<ScheduleService<S>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let schedule_id = path.into_inner();
    if auth.is_employee() {
        ensure_own(&auth, &service.get_schedule(schedule_id).await?.schedule)?;
    }
    let conflicts = service.list_conflicts(schedule_id).await?;
    Ok(HttpResponse::Ok().json(ConflictReport {
        conflict_free: conflicts.is_empty(),
        conflicts,
    }))
}

#[utoipa::path(
    put,
    path = "/api/schedules/{id}/submit",
    params(("id", Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule on approval", body = ScheduleDetail),
        (status = 400, description = "Schedule already decided"),
        (status = 404, description = "Schedule not found")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
pub async fn submit_schedule<S: Backend>(
    auth: AuthUser,
    service: web::Data<ScheduleService<S>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let schedule_id = path.into_inner();
    if auth.is_employee() {
        ensure_own(&auth, &service.get_schedule(schedule_id).await?.schedule)?;
    }
    let aggregate = service.submit(schedule_id, auth.user_id).await?;
    Ok(HttpResponse::Ok().json(ScheduleDetail::from(aggregate)))
}

#[utoipa::path(
    put,
    path = "/api/schedules/{id}/approve",
    params(("id", Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule and all shifts approved", body = ScheduleDetail),
        (status = 400, description = "Schedule was rejected"),
        (status = 404, description = "Schedule not found"),
        (status = 409, description = "Two shifts overlap; nothing was changed")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
pub async fn approve_schedule<S: Backend>(
    auth: AuthUser,
    service: web::Data<ScheduleService<S>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    let aggregate = service.approve(path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(ScheduleDetail::from(aggregate)))
}

#[utoipa::path(
    put,
    path = "/api/schedules/{id}/reject",
    params(("id", Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule rejected", body = ScheduleDetail),
        (status = 400, description = "Schedule was approved"),
        (status = 404, description = "Schedule not found")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
pub async fn reject_schedule<S: Backend>(
    auth: AuthUser,
    service: web::Data<ScheduleService<S>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    let aggregate = service.reject(path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(ScheduleDetail::from(aggregate)))
}

#[utoipa::path(
    post,
    path = "/api/schedules/{id}/shifts",
    params(("id", Path, description = "Schedule ID")),
    request_body = NewShift,
    responses(
        (status = 201, description = "Shift added", body = WorkShift),
        (status = 400, description = "Invalid range or schedule no longer editable"),
        (status = 404, description = "Schedule or employee not found"),
        (status = 409, description = "Overlaps an existing shift")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
pub async fn add_shift<S: Backend>(
    auth: AuthUser,
    service: web::Data<ScheduleService<S>>,
    path: web::Path<u64>,
    payload: web::Json<NewShift>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    let shift = service
        .add_shift(path.into_inner(), &payload, auth.user_id)
        .await?;
    Ok(HttpResponse::Created().json(shift))
}

#[utoipa::path(
    put,
    path = "/api/schedules/{id}/shifts/{shift_id}",
    params(
        ("id", Path, description = "Schedule ID"),
        ("shift_id", Path, description = "Shift ID")
    ),
    request_body = ShiftPatch,
    responses(
        (status = 200, description = "Shift updated", body = WorkShift),
        (status = 400, description = "Invalid range or schedule no longer editable"),
        (status = 404, description = "Schedule or shift not found"),
        (status = 409, description = "Overlaps another shift")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
pub async fn update_shift<S: Backend>(
    auth: AuthUser,
    service: web::Data<ScheduleService<S>>,
    path: web::Path<(u64, u64)>,
    payload: web::Json<ShiftPatch>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    let (schedule_id, shift_id) = path.into_inner();
    let shift = service
        .update_shift(schedule_id, shift_id, &payload, auth.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(shift))
}

#[utoipa::path(
    delete,
    path = "/api/schedules/{id}/shifts/{shift_id}",
    params(
        ("id", Path, description = "Schedule ID"),
        ("shift_id", Path, description = "Shift ID")
    ),
    responses(
        (status = 204, description = "Shift removed"),
        (status = 400, description = "Schedule no longer editable"),
        (status = 404, description = "Schedule or shift not found")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
pub async fn remove_shift<S: Backend>(
    auth: AuthUser,
    service: web::Data<ScheduleService<S>>,
    path: web::Path<(u64, u64)>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    let (schedule_id, shift_id) = path.into_inner();
    service
        .remove_shift(schedule_id, shift_id, auth.user_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Pairwise overlap check for two ranges that need not be stored.
#[utoipa::path(
    post,
    path = "/api/shifts/conflict-check",
    request_body = ConflictCheckRequest,
    responses((status = 200, description = "Whether the two ranges overlap", body = ConflictCheckResponse)),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
pub async fn conflict_check(
    _auth: AuthUser,
    payload: web::Json<ConflictCheckRequest>,
) -> impl Responder {
    let conflicting = is_conflicting(&payload.first, &payload.second);
    debug!(conflicting, "Pairwise shift check");
    HttpResponse::Ok().json(ConflictCheckResponse { conflicting })
}
