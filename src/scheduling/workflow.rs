//! Status transitions of a schedule aggregate.
//!
//! ```text
//! draft ──submit──▶ on_approval
//!   │                  │
//!   ├──approve─────────┼──▶ approved   (every shift approved first)
//!   └──reject──────────┴──▶ rejected   (shifts untouched)
//! ```
//!
//! Nothing leaves `approved` or `rejected`; repeating the transition that
//! got there is a no-op. These functions only mutate the in-memory
//! aggregate, persisting is the caller's job.

use crate::error::ServiceError;
use crate::model::schedule::{ScheduleAggregate, ScheduleStatus};
use crate::scheduling::conflict;

/// Whether a transition changed anything that needs to be written.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    Changed,
    Unchanged,
}

fn invalid(from: ScheduleStatus, to: ScheduleStatus) -> ServiceError {
    ServiceError::InvalidTransition { from, to }
}

pub fn submit(aggregate: &mut ScheduleAggregate) -> Result<Outcome, ServiceError> {
    match aggregate.status() {
        ScheduleStatus::Draft => {
            aggregate.schedule.status = ScheduleStatus::OnApproval;
            Ok(Outcome::Changed)
        }
        ScheduleStatus::OnApproval => Ok(Outcome::Unchanged),
        from => Err(invalid(from, ScheduleStatus::OnApproval)),
    }
}

/// Approves every shift, then the schedule. Refused without touching
/// anything while two shifts overlap.
pub fn approve(aggregate: &mut ScheduleAggregate) -> Result<Outcome, ServiceError> {
    let from = aggregate.status();
    if from == ScheduleStatus::Rejected {
        return Err(invalid(from, ScheduleStatus::Approved));
    }

    if let Some(conflict) = conflict::find_conflict(&aggregate.shifts) {
        return Err(ServiceError::Conflict(conflict));
    }

    if from == ScheduleStatus::Approved && aggregate.shifts.iter().all(|s| s.is_approved) {
        return Ok(Outcome::Unchanged);
    }

    for shift in &mut aggregate.shifts {
        shift.is_approved = true;
    }
    aggregate.schedule.status = ScheduleStatus::Approved;
    Ok(Outcome::Changed)
}

/// Rejects the schedule. Shift flags are left as they are.
pub fn reject(aggregate: &mut ScheduleAggregate) -> Result<Outcome, ServiceError> {
    match aggregate.status() {
        ScheduleStatus::Draft | ScheduleStatus::OnApproval => {
            aggregate.schedule.status = ScheduleStatus::Rejected;
            Ok(Outcome::Changed)
        }
        ScheduleStatus::Rejected => Ok(Outcome::Unchanged),
        from @ ScheduleStatus::Approved => Err(invalid(from, ScheduleStatus::Rejected)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{schedule::WorkSchedule, shift::WorkShift};
    use chrono::{NaiveTime, Utc};

    fn shift(id: u64, start: &str, end: &str, approved: bool) -> WorkShift {
        WorkShift {
            id,
            schedule_id: 1,
            employee_id: 7,
            date: "2024-01-01".parse().unwrap(),
            start_time: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end_time: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
            is_approved: approved,
        }
    }

    fn aggregate(status: ScheduleStatus, shifts: Vec<WorkShift>) -> ScheduleAggregate {
        ScheduleAggregate {
            schedule: WorkSchedule {
                id: 1,
                employee_id: 7,
                pickup_point_id: 3,
                start_date: "2024-01-01".parse().unwrap(),
                end_date: "2024-01-07".parse().unwrap(),
                status,
                created_at: Utc::now(),
            },
            shifts,
        }
    }

    #[test]
    fn approve_marks_every_shift_then_the_schedule() {
        let mut agg = aggregate(
            ScheduleStatus::Draft,
            vec![shift(1, "09:00", "13:00", false), shift(2, "13:00", "17:00", false)],
        );
        assert_eq!(approve(&mut agg).unwrap(), Outcome::Changed);
        assert_eq!(agg.status(), ScheduleStatus::Approved);
        assert!(agg.shifts.iter().all(|s| s.is_approved));
    }

    #[test]
    fn approve_is_refused_on_conflict_and_changes_nothing() {
        let mut agg = aggregate(
            ScheduleStatus::OnApproval,
            vec![shift(1, "09:00", "14:00", false), shift(2, "13:00", "17:00", false)],
        );
        let before = agg.clone();
        let err = approve(&mut agg).unwrap_err();
        match err {
            ServiceError::Conflict(c) => {
                assert_eq!(c.first.id, Some(1));
                assert_eq!(c.second.id, Some(2));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(agg, before);
    }

    #[test]
    fn approving_twice_is_a_no_op() {
        let mut agg = aggregate(ScheduleStatus::Draft, vec![shift(1, "09:00", "13:00", false)]);
        approve(&mut agg).unwrap();
        let approved = agg.clone();
        assert_eq!(approve(&mut agg).unwrap(), Outcome::Unchanged);
        assert_eq!(agg, approved);
    }

    #[test]
    fn approve_without_shifts_only_flips_status() {
        let mut agg = aggregate(ScheduleStatus::Draft, vec![]);
        assert_eq!(approve(&mut agg).unwrap(), Outcome::Changed);
        assert_eq!(agg.status(), ScheduleStatus::Approved);
    }

    #[test]
    fn rejected_schedule_cannot_be_approved() {
        let mut agg = aggregate(ScheduleStatus::Rejected, vec![shift(1, "09:00", "13:00", false)]);
        assert!(matches!(
            approve(&mut agg),
            Err(ServiceError::InvalidTransition {
                from: ScheduleStatus::Rejected,
                to: ScheduleStatus::Approved
            })
        ));
        assert!(!agg.shifts[0].is_approved);
    }

    #[test]
    fn reject_leaves_shift_flags_alone() {
        let mut agg = aggregate(
            ScheduleStatus::OnApproval,
            vec![shift(1, "09:00", "13:00", true), shift(2, "13:00", "17:00", false)],
        );
        assert_eq!(reject(&mut agg).unwrap(), Outcome::Changed);
        assert_eq!(agg.status(), ScheduleStatus::Rejected);
        assert!(agg.shifts[0].is_approved);
        assert!(!agg.shifts[1].is_approved);
        assert_eq!(reject(&mut agg).unwrap(), Outcome::Unchanged);
    }

    #[test]
    fn approved_schedule_cannot_be_rejected_or_resubmitted() {
        let mut agg = aggregate(ScheduleStatus::Approved, vec![]);
        assert!(matches!(
            reject(&mut agg),
            Err(ServiceError::InvalidTransition { .. })
        ));
        assert!(matches!(
            submit(&mut agg),
            Err(ServiceError::InvalidTransition { .. })
        ));
        assert_eq!(agg.status(), ScheduleStatus::Approved);
    }

    #[test]
    fn submit_moves_draft_to_on_approval() {
        let mut agg = aggregate(ScheduleStatus::Draft, vec![]);
        assert_eq!(submit(&mut agg).unwrap(), Outcome::Changed);
        assert_eq!(agg.status(), ScheduleStatus::OnApproval);
        assert_eq!(submit(&mut agg).unwrap(), Outcome::Unchanged);
    }
}
