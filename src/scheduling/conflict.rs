//! Shift overlap detection.
//!
//! Two shifts conflict when they fall on the same date and their
//! `[start, end)` ranges intersect. A shift ending exactly when another
//! begins does not conflict.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

use crate::model::shift::{TimeSlot, WorkShift};

/// One side of a detected conflict. `id` is `None` for a shift that is
/// being proposed and has not been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConflictingShift {
    pub id: Option<u64>,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ShiftConflict {
    pub first: ConflictingShift,
    pub second: ConflictingShift,
}

impl ConflictingShift {
    fn of(id: Option<u64>, slot: &(impl TimeSlot + ?Sized)) -> Self {
        Self {
            id,
            date: slot.date(),
            start_time: slot.start_time(),
            end_time: slot.end_time(),
        }
    }
}

impl fmt::Display for ConflictingShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "shift #{id}")?,
            None => write!(f, "new shift")?,
        }
        write!(
            f,
            " ({} {}-{})",
            self.date,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

impl fmt::Display for ShiftConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} overlaps {}", self.first, self.second)
    }
}

/// Pairwise test: same date and overlapping half-open time ranges.
pub fn is_conflicting<A, B>(a: &A, b: &B) -> bool
where
    A: TimeSlot + ?Sized,
    B: TimeSlot + ?Sized,
{
    a.date() == b.date() && !(a.end_time() <= b.start_time() || b.end_time() <= a.start_time())
}

/// First colliding pair among `shifts`, in storage order.
pub fn find_conflict(shifts: &[WorkShift]) -> Option<ShiftConflict> {
    shifts.iter().enumerate().find_map(|(i, a)| {
        shifts[i + 1..]
            .iter()
            .find(|b| is_conflicting(a, *b))
            .map(|b| ShiftConflict {
                first: ConflictingShift::of(Some(a.id), a),
                second: ConflictingShift::of(Some(b.id), b),
            })
    })
}

/// Every colliding pair among `shifts`.
pub fn find_conflicts(shifts: &[WorkShift]) -> Vec<ShiftConflict> {
    let mut conflicts = Vec::new();
    for (i, a) in shifts.iter().enumerate() {
        for b in &shifts[i + 1..] {
            if is_conflicting(a, b) {
                conflicts.push(ShiftConflict {
                    first: ConflictingShift::of(Some(a.id), a),
                    second: ConflictingShift::of(Some(b.id), b),
                });
            }
        }
    }
    conflicts
}

/// `true` when no two shifts collide.
pub fn check_conflicts(shifts: &[WorkShift]) -> bool {
    find_conflict(shifts).is_none()
}

/// Checks a proposed shift against the stored ones before it is written.
/// `replacing` names a stored shift the candidate is an edit of; that shift
/// is not compared against its own new version.
pub fn check_candidate(
    existing: &[WorkShift],
    candidate: &impl TimeSlot,
    replacing: Option<u64>,
) -> Result<(), ShiftConflict> {
    match existing
        .iter()
        .filter(|s| Some(s.id) != replacing)
        .find(|s| is_conflicting(*s, candidate))
    {
        Some(hit) => Err(ShiftConflict {
            first: ConflictingShift::of(Some(hit.id), hit),
            second: ConflictingShift::of(replacing, candidate),
        }),
        None => Ok(()),
    }
}
