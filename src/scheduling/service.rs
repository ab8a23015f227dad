use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::error::{Entity, ServiceError};
use crate::model::{
    change_log::{ChangeAction, DocumentChange, ScheduleSnapshot},
    report::WorkScheduleReport,
    schedule::{NewSchedule, ScheduleAggregate, ScheduleFilter, WorkSchedule},
    shift::{NewShift, ShiftPatch, TimeSlot, WorkShift},
};
use crate::registers::ChangeLogRecorder;
use crate::scheduling::{
    conflict::{self, ShiftConflict},
    locks::ScheduleLocks,
    report,
    workflow::{self, Outcome},
};
use crate::store::{ChangeLogStore, ReportStore, ScheduleStore};

/// Schedule use cases. Every mutation of one schedule runs under that
/// schedule's lock, writes through the store, then records the change.
pub struct ScheduleService<S, L = S> {
    store: Arc<S>,
    recorder: ChangeLogRecorder<L>,
    locks: ScheduleLocks,
    report_window_days: u32,
}

pub const DEFAULT_REPORT_WINDOW_DAYS: u32 = 30;

impl<S, L> ScheduleService<S, L>
where
    S: ScheduleStore + ReportStore,
    L: ChangeLogStore,
{
    pub fn new(store: Arc<S>, log: Arc<L>) -> Self {
        Self {
            store,
            recorder: ChangeLogRecorder::new(log),
            locks: ScheduleLocks::new(),
            report_window_days: DEFAULT_REPORT_WINDOW_DAYS,
        }
    }

    pub fn with_report_window(mut self, days: u32) -> Self {
        self.report_window_days = days;
        self
    }

    async fn load(&self, schedule_id: u64) -> Result<ScheduleAggregate, ServiceError> {
        self.store
            .load_schedule(schedule_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(Entity::Schedule, schedule_id))
    }

    async fn ensure_employee(&self, employee_id: u64) -> Result<(), ServiceError> {
        if self.store.employee_exists(employee_id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found(Entity::Employee, employee_id))
        }
    }

    async fn record_update(
        &self,
        before: &ScheduleAggregate,
        after: &ScheduleAggregate,
        actor_id: u64,
    ) {
        let change = DocumentChange::WorkSchedule {
            document_id: after.id(),
            previous: Some(ScheduleSnapshot::from(before)),
            new: Some(ScheduleSnapshot::from(after)),
        };
        self.recorder
            .record(change, ChangeAction::Update, actor_id)
            .await;
    }

    pub async fn get_schedule(&self, schedule_id: u64) -> Result<ScheduleAggregate, ServiceError> {
        self.load(schedule_id).await
    }

    pub async fn list_schedules(
        &self,
        filter: &ScheduleFilter,
    ) -> Result<(Vec<WorkSchedule>, i64), ServiceError> {
        Ok(self.store.list_schedules(filter).await?)
    }

    #[instrument(skip(self, new), fields(employee_id = new.employee_id))]
    pub async fn create_schedule(
        &self,
        new: &NewSchedule,
        actor_id: u64,
    ) -> Result<WorkSchedule, ServiceError> {
        if new.start_date > new.end_date {
            return Err(ServiceError::Validation(
                "start_date cannot be after end_date".into(),
            ));
        }
        self.ensure_employee(new.employee_id).await?;
        if !self.store.pickup_point_exists(new.pickup_point_id).await? {
            return Err(ServiceError::not_found(
                Entity::PickupPoint,
                new.pickup_point_id,
            ));
        }

        let schedule = self.store.insert_schedule(new).await?;
        info!(schedule_id = schedule.id, "Schedule created");

        let created = ScheduleAggregate {
            schedule: schedule.clone(),
            shifts: Vec::new(),
        };
        self.recorder
            .record(
                DocumentChange::WorkSchedule {
                    document_id: schedule.id,
                    previous: None,
                    new: Some(ScheduleSnapshot::from(&created)),
                },
                ChangeAction::Create,
                actor_id,
            )
            .await;
        Ok(schedule)
    }

    #[instrument(skip(self))]
    pub async fn delete_schedule(&self, schedule_id: u64, actor_id: u64) -> Result<(), ServiceError> {
        let guard = self.locks.acquire(schedule_id).await;
        let before = self.load(schedule_id).await?;

        if !self.store.delete_schedule(schedule_id).await? {
            return Err(ServiceError::not_found(Entity::Schedule, schedule_id));
        }
        drop(guard);
        info!(schedule_id, shifts = before.shifts.len(), "Schedule deleted");

        self.recorder
            .record(
                DocumentChange::WorkSchedule {
                    document_id: schedule_id,
                    previous: Some(ScheduleSnapshot::from(&before)),
                    new: None,
                },
                ChangeAction::Delete,
                actor_id,
            )
            .await;
        Ok(())
    }

    fn validate_slot(
        aggregate: &ScheduleAggregate,
        slot: &impl TimeSlot,
    ) -> Result<(), ServiceError> {
        if slot.start_time() >= slot.end_time() {
            return Err(ServiceError::Validation(
                "shift start_time must be before end_time".into(),
            ));
        }
        if !aggregate.schedule.covers(slot.date()) {
            return Err(ServiceError::Validation(format!(
                "shift date {} is outside the schedule range {} .. {}",
                slot.date(),
                aggregate.schedule.start_date,
                aggregate.schedule.end_date
            )));
        }
        Ok(())
    }

    /// Adds a shift after checking it against every shift already stored.
    #[instrument(skip(self, new), fields(date = %new.date))]
    pub async fn add_shift(
        &self,
        schedule_id: u64,
        new: &NewShift,
        actor_id: u64,
    ) -> Result<WorkShift, ServiceError> {
        let _guard = self.locks.acquire(schedule_id).await;
        let before = self.load(schedule_id).await?;

        if !before.status().is_editable() {
            return Err(ServiceError::NotEditable(before.status()));
        }
        Self::validate_slot(&before, new)?;
        self.ensure_employee(new.employee_id).await?;
        conflict::check_candidate(&before.shifts, new, None).map_err(ServiceError::Conflict)?;

        let shift = self.store.insert_shift(schedule_id, new).await?;
        info!(schedule_id, shift_id = shift.id, "Shift added");

        let mut after = before.clone();
        after.shifts.push(shift.clone());
        self.record_update(&before, &after, actor_id).await;
        Ok(shift)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_shift(
        &self,
        schedule_id: u64,
        shift_id: u64,
        patch: &ShiftPatch,
        actor_id: u64,
    ) -> Result<WorkShift, ServiceError> {
        let _guard = self.locks.acquire(schedule_id).await;
        let before = self.load(schedule_id).await?;

        if !before.status().is_editable() {
            return Err(ServiceError::NotEditable(before.status()));
        }
        let current = before
            .shift(shift_id)
            .ok_or_else(|| ServiceError::not_found(Entity::Shift, shift_id))?;
        let edited = current.apply(patch);

        Self::validate_slot(&before, &edited)?;
        if edited.employee_id != current.employee_id {
            self.ensure_employee(edited.employee_id).await?;
        }
        conflict::check_candidate(&before.shifts, &edited, Some(shift_id))
            .map_err(ServiceError::Conflict)?;

        self.store.update_shift(&edited).await?;

        let mut after = before.clone();
        if let Some(slot) = after.shifts.iter_mut().find(|s| s.id == shift_id) {
            *slot = edited.clone();
        }
        self.record_update(&before, &after, actor_id).await;
        Ok(edited)
    }

    #[instrument(skip(self))]
    pub async fn remove_shift(
        &self,
        schedule_id: u64,
        shift_id: u64,
        actor_id: u64,
    ) -> Result<(), ServiceError> {
        let _guard = self.locks.acquire(schedule_id).await;
        let before = self.load(schedule_id).await?;

        if !before.status().is_editable() {
            return Err(ServiceError::NotEditable(before.status()));
        }
        if !self.store.delete_shift(schedule_id, shift_id).await? {
            return Err(ServiceError::not_found(Entity::Shift, shift_id));
        }

        let mut after = before.clone();
        after.shifts.retain(|s| s.id != shift_id);
        self.record_update(&before, &after, actor_id).await;
        Ok(())
    }

    /// `true` when no two shifts of the schedule overlap.
    pub async fn check_conflicts(&self, schedule_id: u64) -> Result<bool, ServiceError> {
        let aggregate = self.load(schedule_id).await?;
        Ok(conflict::check_conflicts(&aggregate.shifts))
    }

    pub async fn list_conflicts(&self, schedule_id: u64) -> Result<Vec<ShiftConflict>, ServiceError> {
        let aggregate = self.load(schedule_id).await?;
        Ok(conflict::find_conflicts(&aggregate.shifts))
    }

    async fn transition(
        &self,
        schedule_id: u64,
        actor_id: u64,
        step: fn(&mut ScheduleAggregate) -> Result<Outcome, ServiceError>,
    ) -> Result<ScheduleAggregate, ServiceError> {
        let _guard = self.locks.acquire(schedule_id).await;
        let before = self.load(schedule_id).await?;

        let mut after = before.clone();
        if step(&mut after)? == Outcome::Unchanged {
            return Ok(after);
        }

        self.store.save_decision(&after).await?;
        info!(schedule_id, from = %before.status(), to = %after.status(), "Schedule status changed");

        self.record_update(&before, &after, actor_id).await;
        Ok(after)
    }

    #[instrument(skip(self))]
    pub async fn submit(&self, schedule_id: u64, actor_id: u64) -> Result<ScheduleAggregate, ServiceError> {
        self.transition(schedule_id, actor_id, workflow::submit).await
    }

    /// Approves every shift and then the schedule, refusing while any two
    /// shifts overlap.
    #[instrument(skip(self))]
    pub async fn approve(&self, schedule_id: u64, actor_id: u64) -> Result<ScheduleAggregate, ServiceError> {
        self.transition(schedule_id, actor_id, workflow::approve)
            .await
            .inspect_err(|e| {
                if let ServiceError::Conflict(c) = e {
                    warn!(schedule_id, conflict = %c, "Approval refused");
                }
            })
    }

    #[instrument(skip(self))]
    pub async fn reject(&self, schedule_id: u64, actor_id: u64) -> Result<ScheduleAggregate, ServiceError> {
        self.transition(schedule_id, actor_id, workflow::reject).await
    }

    /// Summarises the approved shifts of the last report window and keeps
    /// the result.
    #[instrument(skip(self))]
    pub async fn generate_report(
        &self,
        employee_id: u64,
        today: NaiveDate,
    ) -> Result<WorkScheduleReport, ServiceError> {
        self.ensure_employee(employee_id).await?;
        let from = report::window_start(today, self.report_window_days);
        let shifts = self
            .store
            .approved_shifts_between(employee_id, from, today)
            .await?;
        let summary = report::summarize(employee_id, today, &shifts);
        let stored = self.store.insert_report(&summary).await?;
        info!(
            employee_id,
            report_id = stored.id,
            total_hours = stored.total_hours,
            approved_shifts = stored.approved_shifts,
            "Work schedule report generated"
        );
        Ok(stored)
    }
}

/// Pairwise check for two arbitrary shifts.
pub fn is_conflicting(a: &impl TimeSlot, b: &impl TimeSlot) -> bool {
    conflict::is_conflicting(a, b)
}
