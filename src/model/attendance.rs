use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Closed set of daily attendance statuses.
///
/// `Present` and `Late` are produced by the clock-in classifier; the rest are
/// administrative and survive any later clock event untouched.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Sick,
    Leave,
}

impl AttendanceStatus {
    /// Set by admins only, never by the clock-in/out flow.
    pub fn is_administrative(&self) -> bool {
        matches!(
            self,
            AttendanceStatus::Absent | AttendanceStatus::Sick | AttendanceStatus::Leave
        )
    }
}

/// One attendance row per (user, calendar date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 42,
        "user_id": 7,
        "location_id": 1,
        "date": "2026-08-06",
        "clock_in": "2026-08-06T08:58:12",
        "clock_out": null,
        "clock_in_latitude": -6.2087611,
        "clock_in_longitude": 106.8455870,
        "clock_out_latitude": null,
        "clock_out_longitude": null,
        "is_within_radius": true,
        "notes": null,
        "status": "present"
    })
)]
pub struct AttendanceRecord {
    #[schema(example = 42)]
    pub id: u64,

    #[schema(example = 7)]
    pub user_id: u64,

    /// Nearest active location at clock-in; null when none was active.
    #[schema(example = 1)]
    pub location_id: Option<u64>,

    #[schema(example = "2026-08-06", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "2026-08-06T08:58:12", value_type = String, format = "date-time")]
    pub clock_in: Option<NaiveDateTime>,

    #[schema(example = "2026-08-06T17:03:44", value_type = String, format = "date-time")]
    pub clock_out: Option<NaiveDateTime>,

    #[schema(example = -6.2087611)]
    pub clock_in_latitude: Option<f64>,

    #[schema(example = 106.8455870)]
    pub clock_in_longitude: Option<f64>,

    #[schema(example = -6.2087655)]
    pub clock_out_latitude: Option<f64>,

    #[schema(example = 106.8455912)]
    pub clock_out_longitude: Option<f64>,

    /// True only while every clock event so far happened inside the
    /// resolved location's radius.
    #[schema(example = true)]
    pub is_within_radius: bool,

    #[schema(example = "forgot badge", nullable = true)]
    pub notes: Option<String>,

    #[schema(example = "present")]
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    /// Worked minutes between clock-in and clock-out, 0 while either is open.
    pub fn work_minutes(&self) -> i64 {
        match (self.clock_in, self.clock_out) {
            (Some(start), Some(end)) => (end - start).num_minutes().max(0),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Late,
            AttendanceStatus::Absent,
            AttendanceStatus::Sick,
            AttendanceStatus::Leave,
        ] {
            let text = status.to_string();
            assert_eq!(text.parse::<AttendanceStatus>().unwrap(), status);
        }
        assert_eq!(AttendanceStatus::Late.to_string(), "late");
    }

    #[test]
    fn administrative_statuses() {
        assert!(!AttendanceStatus::Present.is_administrative());
        assert!(!AttendanceStatus::Late.is_administrative());
        assert!(AttendanceStatus::Absent.is_administrative());
        assert!(AttendanceStatus::Sick.is_administrative());
        assert!(AttendanceStatus::Leave.is_administrative());
    }

    #[test]
    fn work_minutes_requires_both_events() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let mut record = AttendanceRecord {
            id: 1,
            user_id: 1,
            location_id: None,
            date,
            clock_in: Some(date.and_hms_opt(9, 0, 0).unwrap()),
            clock_out: None,
            clock_in_latitude: None,
            clock_in_longitude: None,
            clock_out_latitude: None,
            clock_out_longitude: None,
            is_within_radius: false,
            notes: None,
            status: AttendanceStatus::Present,
        };
        assert_eq!(record.work_minutes(), 0);

        record.clock_out = Some(date.and_hms_opt(17, 30, 0).unwrap());
        assert_eq!(record.work_minutes(), 510);
    }
}
