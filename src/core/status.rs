use chrono::{Duration, NaiveTime};

use crate::model::attendance::AttendanceStatus;
use crate::model::work_schedule::WorkSchedule;

/// Minutes past the scheduled start before a clock-in counts as late.
/// Policy constant, not per-schedule configurable.
pub const LATE_GRACE_MINUTES: i64 = 15;

/// Present-or-late decision for a clock-in at the given wall-clock time.
///
/// Users without a schedule are always `Present`. The comparison is on
/// time-of-day only; a clock-in strictly after start + grace is `Late`.
pub fn classify(clock_in_time: NaiveTime, schedule: Option<&WorkSchedule>) -> AttendanceStatus {
    let Some(schedule) = schedule else {
        return AttendanceStatus::Present;
    };

    let late_threshold = schedule.start_time + Duration::minutes(LATE_GRACE_MINUTES);
    if clock_in_time > late_threshold {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nine_to_five() -> WorkSchedule {
        WorkSchedule {
            id: 1,
            name: "Regular Shift".into(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            break_duration: 60,
            work_days: vec![1, 2, 3, 4, 5],
            is_active: true,
        }
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn early_clock_in_is_present() {
        let schedule = nine_to_five();
        assert_eq!(
            classify(at(8, 30, 0), Some(&schedule)),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn within_grace_is_present() {
        let schedule = nine_to_five();
        assert_eq!(
            classify(at(9, 14, 59), Some(&schedule)),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn exactly_on_threshold_is_present() {
        let schedule = nine_to_five();
        assert_eq!(
            classify(at(9, 15, 0), Some(&schedule)),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn past_grace_is_late() {
        let schedule = nine_to_five();
        assert_eq!(
            classify(at(9, 15, 1), Some(&schedule)),
            AttendanceStatus::Late
        );
        assert_eq!(
            classify(at(13, 0, 0), Some(&schedule)),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn no_schedule_is_always_present() {
        assert_eq!(classify(at(0, 0, 0), None), AttendanceStatus::Present);
        assert_eq!(classify(at(23, 59, 59), None), AttendanceStatus::Present);
    }
}
