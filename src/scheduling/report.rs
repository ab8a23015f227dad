use chrono::{Days, NaiveDate};

use crate::model::report::NewWorkScheduleReport;
use crate::model::shift::WorkShift;

/// First day covered by a report generated on `report_date`.
pub fn window_start(report_date: NaiveDate, window_days: u32) -> NaiveDate {
    report_date
        .checked_sub_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Sums the worked time of approved shifts, rounded to hundredths of an hour.
pub fn summarize(
    employee_id: u64,
    report_date: NaiveDate,
    shifts: &[WorkShift],
) -> NewWorkScheduleReport {
    let approved: Vec<_> = shifts.iter().filter(|s| s.is_approved).collect();
    let minutes: i64 = approved
        .iter()
        .map(|s| (s.end_time - s.start_time).num_minutes().max(0))
        .sum();

    NewWorkScheduleReport {
        employee_id,
        report_date,
        total_hours: (minutes as f64 / 60.0 * 100.0).round() / 100.0,
        approved_shifts: approved.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn shift(start: (u32, u32), end: (u32, u32), approved: bool) -> WorkShift {
        WorkShift {
            id: 1,
            schedule_id: 1,
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            is_approved: approved,
        }
    }

    #[test]
    fn counts_minutes_not_just_hours() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let report = summarize(
            7,
            today,
            &[shift((9, 0), (13, 30), true), shift((14, 15), (18, 0), true)],
        );
        assert_eq!(report.approved_shifts, 2);
        assert_eq!(report.total_hours, 8.25);
    }

    #[test]
    fn unapproved_shifts_are_ignored() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let report = summarize(7, today, &[shift((9, 0), (17, 0), false)]);
        assert_eq!(report.approved_shifts, 0);
        assert_eq!(report.total_hours, 0.0);
    }

    #[test]
    fn window_goes_back_the_configured_number_of_days() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            window_start(today, 30),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
    }
}
