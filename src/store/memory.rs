use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};

use crate::error::StoreError;
use crate::model::{
    agent::{Agent, AgentFields},
    agent_document::{AgentDocument, AgentDocumentFilter},
    change_log::{ChangeAction, ChangeLogEntry, ChangeLogFilter, NewChangeLogEntry},
    report::{NewWorkScheduleReport, WorkScheduleReport},
    schedule::{NewSchedule, ScheduleAggregate, ScheduleFilter, ScheduleStatus, WorkSchedule},
    shift::{NewShift, WorkShift},
};
use crate::store::{AgentStore, ChangeLogStore, ReportStore, ScheduleStore};

#[derive(Default)]
struct State {
    next_id: u64,
    employees: HashSet<u64>,
    pickup_points: HashSet<u64>,
    schedules: BTreeMap<u64, WorkSchedule>,
    shifts: BTreeMap<u64, WorkShift>,
    change_log: Vec<ChangeLogEntry>,
    reports: Vec<WorkScheduleReport>,
    agents: BTreeMap<u64, Agent>,
    agent_documents: BTreeMap<u64, AgentDocument>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn aggregate(&self, schedule_id: u64) -> Option<ScheduleAggregate> {
        let schedule = self.schedules.get(&schedule_id)?.clone();
        let shifts = self
            .shifts
            .values()
            .filter(|s| s.schedule_id == schedule_id)
            .cloned()
            .collect();
        Some(ScheduleAggregate { schedule, shifts })
    }

    fn ensure_unique_agent(&self, fields: &AgentFields, except: Option<u64>) -> Result<(), StoreError> {
        let clash = self.agents.values().find(|a| {
            Some(a.id) != except && (a.email == fields.email || a.phone_number == fields.phone_number)
        });
        match clash {
            Some(a) => Err(StoreError::Duplicate(format!(
                "agent email or phone number already used by agent {}",
                a.id
            ))),
            None => Ok(()),
        }
    }
}

/// Process-local store. Every call takes one lock over the whole state, so
/// each method is atomic on its own.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employee(self, employee_id: u64) -> Self {
        self.add_employee(employee_id);
        self
    }

    pub fn with_pickup_point(self, pickup_point_id: u64) -> Self {
        self.add_pickup_point(pickup_point_id);
        self
    }

    pub fn add_employee(&self, employee_id: u64) {
        self.state().employees.insert(employee_id);
    }

    pub fn add_pickup_point(&self, pickup_point_id: u64) {
        self.state().pickup_points.insert(pickup_point_id);
    }

    /// Reports generated so far, oldest first.
    pub fn reports(&self) -> Vec<WorkScheduleReport> {
        self.state().reports.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ScheduleStore for InMemoryStore {
    async fn employee_exists(&self, employee_id: u64) -> Result<bool, StoreError> {
        Ok(self.state().employees.contains(&employee_id))
    }

    async fn pickup_point_exists(&self, pickup_point_id: u64) -> Result<bool, StoreError> {
        Ok(self.state().pickup_points.contains(&pickup_point_id))
    }

    async fn insert_schedule(&self, new: &NewSchedule) -> Result<WorkSchedule, StoreError> {
        let mut state = self.state();
        let schedule = WorkSchedule {
            id: state.next_id(),
            employee_id: new.employee_id,
            pickup_point_id: new.pickup_point_id,
            start_date: new.start_date,
            end_date: new.end_date,
            status: ScheduleStatus::Draft,
            created_at: Utc::now(),
        };
        state.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    async fn load_schedule(
        &self,
        schedule_id: u64,
    ) -> Result<Option<ScheduleAggregate>, StoreError> {
        Ok(self.state().aggregate(schedule_id))
    }

    async fn list_schedules(
        &self,
        filter: &ScheduleFilter,
    ) -> Result<(Vec<WorkSchedule>, i64), StoreError> {
        let state = self.state();
        let matching: Vec<_> = state
            .schedules
            .values()
            .rev()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(filter.per_page() as usize)
            .collect();
        Ok((page, total))
    }

    async fn insert_shift(
        &self,
        schedule_id: u64,
        new: &NewShift,
    ) -> Result<WorkShift, StoreError> {
        let mut state = self.state();
        if !state.schedules.contains_key(&schedule_id) {
            return Err(StoreError::Corrupt(format!(
                "schedule {schedule_id} vanished before its shift was stored"
            )));
        }
        let shift = WorkShift {
            id: state.next_id(),
            schedule_id,
            employee_id: new.employee_id,
            date: new.date,
            start_time: new.start_time,
            end_time: new.end_time,
            is_approved: false,
        };
        state.shifts.insert(shift.id, shift.clone());
        Ok(shift)
    }

    async fn update_shift(&self, shift: &WorkShift) -> Result<(), StoreError> {
        let mut state = self.state();
        match state.shifts.get_mut(&shift.id) {
            Some(stored) if stored.schedule_id == shift.schedule_id => {
                *stored = shift.clone();
                Ok(())
            }
            _ => Err(StoreError::Corrupt(format!("shift {} vanished", shift.id))),
        }
    }

    async fn delete_shift(&self, schedule_id: u64, shift_id: u64) -> Result<bool, StoreError> {
        let mut state = self.state();
        match state.shifts.get(&shift_id) {
            Some(s) if s.schedule_id == schedule_id => {
                state.shifts.remove(&shift_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn save_decision(&self, aggregate: &ScheduleAggregate) -> Result<(), StoreError> {
        let mut state = self.state();
        let schedule_id = aggregate.id();
        if !state.schedules.contains_key(&schedule_id) {
            return Err(StoreError::Corrupt(format!("schedule {schedule_id} vanished")));
        }
        for shift in &aggregate.shifts {
            if let Some(stored) = state.shifts.get_mut(&shift.id) {
                stored.is_approved = shift.is_approved;
            }
        }
        if let Some(stored) = state.schedules.get_mut(&schedule_id) {
            stored.status = aggregate.status();
        }
        Ok(())
    }

    async fn delete_schedule(&self, schedule_id: u64) -> Result<bool, StoreError> {
        let mut state = self.state();
        if state.schedules.remove(&schedule_id).is_none() {
            return Ok(false);
        }
        state.shifts.retain(|_, s| s.schedule_id != schedule_id);
        Ok(true)
    }

    async fn approved_shifts_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WorkShift>, StoreError> {
        Ok(self
            .state()
            .shifts
            .values()
            .filter(|s| {
                s.employee_id == employee_id && s.is_approved && from <= s.date && s.date <= to
            })
            .cloned()
            .collect())
    }
}

impl ChangeLogStore for InMemoryStore {
    async fn append(&self, entry: &NewChangeLogEntry) -> Result<ChangeLogEntry, StoreError> {
        let mut state = self.state();
        let stored = ChangeLogEntry {
            id: state.next_id(),
            change: entry.change.clone(),
            action: entry.action,
            actor_id: entry.actor_id,
            timestamp: Utc::now(),
        };
        state.change_log.push(stored.clone());
        Ok(stored)
    }

    async fn list_entries(
        &self,
        filter: &ChangeLogFilter,
    ) -> Result<(Vec<ChangeLogEntry>, i64), StoreError> {
        let state = self.state();
        let matching: Vec<_> = state
            .change_log
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(filter.per_page() as usize)
            .collect();
        Ok((page, total))
    }
}

impl ReportStore for InMemoryStore {
    async fn insert_report(
        &self,
        report: &NewWorkScheduleReport,
    ) -> Result<WorkScheduleReport, StoreError> {
        let mut state = self.state();
        let stored = WorkScheduleReport {
            id: state.next_id(),
            employee_id: report.employee_id,
            report_date: report.report_date,
            total_hours: report.total_hours,
            approved_shifts: report.approved_shifts,
            created_at: Utc::now(),
        };
        state.reports.push(stored.clone());
        Ok(stored)
    }
}

impl AgentStore for InMemoryStore {
    async fn insert_agent(&self, fields: &AgentFields) -> Result<Agent, StoreError> {
        let mut state = self.state();
        state.ensure_unique_agent(fields, None)?;
        let now = Utc::now();
        let agent = Agent {
            id: state.next_id(),
            name: fields.name.clone(),
            description: fields.description.clone(),
            email: fields.email.clone(),
            phone_number: fields.phone_number.clone(),
            created_at: now,
            updated_at: now,
        };
        state.agents.insert(agent.id, agent.clone());
        Ok(agent)
    }

    async fn load_agent(&self, agent_id: u64) -> Result<Option<Agent>, StoreError> {
        Ok(self.state().agents.get(&agent_id).cloned())
    }

    async fn update_agent(&self, agent_id: u64, fields: &AgentFields) -> Result<Agent, StoreError> {
        let mut state = self.state();
        state.ensure_unique_agent(fields, Some(agent_id))?;
        let agent = state
            .agents
            .get_mut(&agent_id)
            .ok_or_else(|| StoreError::Corrupt(format!("agent {agent_id} vanished")))?;
        agent.name = fields.name.clone();
        agent.description = fields.description.clone();
        agent.email = fields.email.clone();
        agent.phone_number = fields.phone_number.clone();
        agent.updated_at = Utc::now();
        Ok(agent.clone())
    }

    async fn delete_agent(&self, agent_id: u64) -> Result<bool, StoreError> {
        Ok(self.state().agents.remove(&agent_id).is_some())
    }

    async fn list_agents(&self) -> Result<Vec<Agent>, StoreError> {
        Ok(self.state().agents.values().cloned().collect())
    }

    async fn insert_agent_document(
        &self,
        agent_id: u64,
        action: ChangeAction,
        user_id: u64,
    ) -> Result<AgentDocument, StoreError> {
        let mut state = self.state();
        let document = AgentDocument {
            id: state.next_id(),
            agent_id,
            action,
            user_id,
            created_at: Utc::now(),
        };
        state.agent_documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn load_agent_document(
        &self,
        document_id: u64,
    ) -> Result<Option<AgentDocument>, StoreError> {
        Ok(self.state().agent_documents.get(&document_id).cloned())
    }

    async fn list_agent_documents(
        &self,
        filter: &AgentDocumentFilter,
    ) -> Result<Vec<AgentDocument>, StoreError> {
        Ok(self
            .state()
            .agent_documents
            .values()
            .rev()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn new_schedule() -> NewSchedule {
        NewSchedule {
            employee_id: 7,
            pickup_point_id: 3,
            start_date: "2024-01-01".parse().unwrap(),
            end_date: "2024-01-07".parse().unwrap(),
        }
    }

    fn new_shift(day: &str) -> NewShift {
        NewShift {
            employee_id: 7,
            date: day.parse().unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        }
    }

    #[actix_web::test]
    async fn deleting_a_schedule_deletes_its_shifts() {
        let store = InMemoryStore::new();
        let keep = store.insert_schedule(&new_schedule()).await.unwrap();
        let gone = store.insert_schedule(&new_schedule()).await.unwrap();
        store.insert_shift(keep.id, &new_shift("2024-01-01")).await.unwrap();
        store.insert_shift(gone.id, &new_shift("2024-01-02")).await.unwrap();

        assert!(store.delete_schedule(gone.id).await.unwrap());
        assert!(store.load_schedule(gone.id).await.unwrap().is_none());
        assert_eq!(store.load_schedule(keep.id).await.unwrap().unwrap().shifts.len(), 1);
        assert!(!store.delete_schedule(gone.id).await.unwrap());
    }

    #[actix_web::test]
    async fn shift_of_another_schedule_is_not_deleted() {
        let store = InMemoryStore::new();
        let a = store.insert_schedule(&new_schedule()).await.unwrap();
        let b = store.insert_schedule(&new_schedule()).await.unwrap();
        let shift = store.insert_shift(a.id, &new_shift("2024-01-01")).await.unwrap();
        assert!(!store.delete_shift(b.id, shift.id).await.unwrap());
        assert!(store.delete_shift(a.id, shift.id).await.unwrap());
    }

    #[actix_web::test]
    async fn schedules_list_newest_first_with_total() {
        let store = InMemoryStore::new();
        for _ in 0..3 {
            store.insert_schedule(&new_schedule()).await.unwrap();
        }
        let filter = ScheduleFilter {
            per_page: Some(2),
            ..Default::default()
        };
        let (page, total) = store.list_schedules(&filter).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert!(page[0].id > page[1].id);
    }

    #[actix_web::test]
    async fn agent_email_and_phone_are_unique() {
        let store = InMemoryStore::new();
        let fields = AgentFields {
            name: "North".into(),
            description: None,
            email: "north@example.com".into(),
            phone_number: "100".into(),
        };
        let first = store.insert_agent(&fields).await.unwrap();
        let err = store.insert_agent(&fields).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        // updating an agent with its own values is not a clash
        store.update_agent(first.id, &fields).await.unwrap();
    }
}
