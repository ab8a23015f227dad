use crate::api::{
    accounting_period::{AccountingPeriodResponse, CreateAccountingPeriod},
    change_log::{ChangeLogListResponse, ChangeLogResponse},
    employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery, EmployeeResponse},
    pickup_point::CreatePickupPoint,
    schedule::{
        ConflictCheckRequest, ConflictCheckResponse, ConflictReport, ScheduleDetail,
        ScheduleListResponse, Slot,
    },
};
use crate::auth::auth::AuthUser;
use crate::model::{
    accounting_period::AccountingPeriod,
    agent::{Agent, AgentFields},
    agent_document::{AgentDocument, AgentDocumentFilter, NewAgentDocument},
    change_log::{ChangeAction, DocumentKind},
    employee::Employee,
    pickup_point::PickupPoint,
    report::WorkScheduleReport,
    role::Role,
    schedule::{NewSchedule, ScheduleStatus, WorkSchedule},
    shift::{NewShift, ShiftPatch, WorkShift},
};
use crate::models::{LoginReqDto, RegisterReq, TokenPair};
use crate::scheduling::conflict::{ConflictingShift, ShiftConflict};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agency Desk API",
        version = "1.0.0",
        description = r#"
## Pickup-point agency back office

Reference books (agents, pickup points, employees, accounting periods),
agent lifecycle documents, and employee work schedules with a
draft → on_approval → approved / rejected workflow.

### Work schedules
- Shifts are checked pairwise on insert and edit; two shifts on the same
  date conflict when their `[start, end)` ranges intersect.
- Approval flips every shift to approved and the schedule to `approved`
  in one step, and is refused with `409` while any two shifts overlap.
- Every document mutation is recorded in the change log.

### Security
Endpoints under `/api` require a **JWT Bearer** access token.
Schedule decisions and reference-book writes need the `manager` or `admin`
role; agent documents need `admin`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::register,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::schedule::list_schedules,
        crate::api::schedule::create_schedule,
        crate::api::schedule::get_schedule,
        crate::api::schedule::delete_schedule,
        crate::api::schedule::schedule_conflicts,
        crate::api::schedule::submit_schedule,
        crate::api::schedule::approve_schedule,
        crate::api::schedule::reject_schedule,
        crate::api::schedule::add_shift,
        crate::api::schedule::update_shift,
        crate::api::schedule::remove_shift,
        crate::api::schedule::conflict_check,

        crate::api::change_log::list_change_log,

        crate::api::agent_document::create_agent_document,
        crate::api::agent_document::list_agent_documents,
        crate::api::agent_document::get_agent_document,
        crate::api::agent_document::list_agents,
        crate::api::agent_document::get_agent,

        crate::api::report::generate_work_schedule_report,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::deactivate_employee,

        crate::api::pickup_point::create_pickup_point,
        crate::api::pickup_point::list_pickup_points,
        crate::api::pickup_point::get_pickup_point,

        crate::api::accounting_period::create_accounting_period,
        crate::api::accounting_period::list_accounting_periods,
        crate::api::accounting_period::get_accounting_period
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            TokenPair,
            AuthUser,
            Role,
            WorkSchedule,
            WorkShift,
            NewSchedule,
            NewShift,
            ShiftPatch,
            ScheduleStatus,
            ScheduleDetail,
            ScheduleListResponse,
            ConflictReport,
            ConflictingShift,
            ShiftConflict,
            Slot,
            ConflictCheckRequest,
            ConflictCheckResponse,
            ChangeAction,
            DocumentKind,
            ChangeLogResponse,
            ChangeLogListResponse,
            Agent,
            AgentFields,
            AgentDocument,
            AgentDocumentFilter,
            NewAgentDocument,
            WorkScheduleReport,
            Employee,
            CreateEmployee,
            EmployeeQuery,
            EmployeeResponse,
            EmployeeListResponse,
            PickupPoint,
            CreatePickupPoint,
            AccountingPeriod,
            AccountingPeriodResponse,
            CreateAccountingPeriod
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token rotation and registration"),
        (name = "Schedule", description = "Work schedules, shifts and approval"),
        (name = "ChangeLog", description = "Change-log register"),
        (name = "Agent", description = "Agents and agent documents"),
        (name = "Report", description = "Work schedule reports"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "PickupPoint", description = "Pickup points"),
        (name = "AccountingPeriod", description = "Accounting periods"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
