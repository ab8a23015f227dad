//! Persistence seams. The services only talk to these traits; `mysql` backs
//! the running server and `memory` backs tests and embedded use.

#![allow(async_fn_in_trait)]

pub mod memory;
pub mod mysql;

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::model::{
    agent::{Agent, AgentFields},
    agent_document::{AgentDocument, AgentDocumentFilter},
    change_log::{ChangeAction, ChangeLogEntry, ChangeLogFilter, NewChangeLogEntry},
    report::{NewWorkScheduleReport, WorkScheduleReport},
    schedule::{NewSchedule, ScheduleAggregate, ScheduleFilter, WorkSchedule},
    shift::{NewShift, WorkShift},
};

pub use memory::InMemoryStore;
pub use mysql::MySqlStore;

pub trait ScheduleStore {
    async fn employee_exists(&self, employee_id: u64) -> Result<bool, StoreError>;

    async fn pickup_point_exists(&self, pickup_point_id: u64) -> Result<bool, StoreError>;

    async fn insert_schedule(&self, new: &NewSchedule) -> Result<WorkSchedule, StoreError>;

    async fn load_schedule(&self, schedule_id: u64)
    -> Result<Option<ScheduleAggregate>, StoreError>;

    /// Page of schedules, newest first, plus the total matching count.
    async fn list_schedules(
        &self,
        filter: &ScheduleFilter,
    ) -> Result<(Vec<WorkSchedule>, i64), StoreError>;

    async fn insert_shift(&self, schedule_id: u64, new: &NewShift)
    -> Result<WorkShift, StoreError>;

    async fn update_shift(&self, shift: &WorkShift) -> Result<(), StoreError>;

    async fn delete_shift(&self, schedule_id: u64, shift_id: u64) -> Result<bool, StoreError>;

    /// Writes the status and every shift flag of `aggregate` as one unit:
    /// either all of it becomes visible or none of it.
    async fn save_decision(&self, aggregate: &ScheduleAggregate) -> Result<(), StoreError>;

    /// Removes the schedule together with its shifts.
    async fn delete_schedule(&self, schedule_id: u64) -> Result<bool, StoreError>;

    /// Approved shifts of `employee_id` dated within `[from, to]`.
    async fn approved_shifts_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WorkShift>, StoreError>;
}

/// Append-only audit storage. There is deliberately no update or delete.
pub trait ChangeLogStore {
    async fn append(&self, entry: &NewChangeLogEntry) -> Result<ChangeLogEntry, StoreError>;

    async fn list_entries(
        &self,
        filter: &ChangeLogFilter,
    ) -> Result<(Vec<ChangeLogEntry>, i64), StoreError>;
}

pub trait ReportStore {
    async fn insert_report(
        &self,
        report: &NewWorkScheduleReport,
    ) -> Result<WorkScheduleReport, StoreError>;
}

pub trait AgentStore {
    async fn insert_agent(&self, fields: &AgentFields) -> Result<Agent, StoreError>;

    async fn load_agent(&self, agent_id: u64) -> Result<Option<Agent>, StoreError>;

    async fn update_agent(&self, agent_id: u64, fields: &AgentFields) -> Result<Agent, StoreError>;

    async fn delete_agent(&self, agent_id: u64) -> Result<bool, StoreError>;

    async fn list_agents(&self) -> Result<Vec<Agent>, StoreError>;

    async fn insert_agent_document(
        &self,
        agent_id: u64,
        action: ChangeAction,
        user_id: u64,
    ) -> Result<AgentDocument, StoreError>;

    async fn load_agent_document(
        &self,
        document_id: u64,
    ) -> Result<Option<AgentDocument>, StoreError>;

    async fn list_agent_documents(
        &self,
        filter: &AgentDocumentFilter,
    ) -> Result<Vec<AgentDocument>, StoreError>;
}

/// Everything the HTTP layer needs from one storage backend.
pub trait Backend: ScheduleStore + ChangeLogStore + ReportStore + AgentStore + 'static {}

impl<T> Backend for T where T: ScheduleStore + ChangeLogStore + ReportStore + AgentStore + 'static {}
