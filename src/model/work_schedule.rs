use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named work-hour template assigned to users.
///
/// Only `start_time` feeds the lateness threshold; `work_days` uses
/// 0=Sunday .. 6=Saturday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Regular Shift",
        "start_time": "09:00:00",
        "end_time": "17:00:00",
        "break_duration": 60,
        "work_days": [1, 2, 3, 4, 5],
        "is_active": true
    })
)]
pub struct WorkSchedule {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Regular Shift")]
    pub name: String,

    #[schema(example = "09:00:00", value_type = String, format = "time")]
    pub start_time: NaiveTime,

    #[schema(example = "17:00:00", value_type = String, format = "time")]
    pub end_time: NaiveTime,

    /// Break duration in minutes
    #[schema(example = 60)]
    pub break_duration: u32,

    /// Working days, 0=Sunday .. 6=Saturday
    #[schema(example = json!([1, 2, 3, 4, 5]))]
    pub work_days: Vec<u8>,

    #[schema(example = true)]
    pub is_active: bool,
}

/// Raw row shape; `work_days` is stored as a JSON array column.
#[derive(Debug, sqlx::FromRow)]
pub struct WorkScheduleRow {
    pub id: u64,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_duration: u32,
    pub work_days: String,
    pub is_active: bool,
}

impl From<WorkScheduleRow> for WorkSchedule {
    fn from(row: WorkScheduleRow) -> Self {
        let work_days = serde_json::from_str(&row.work_days).unwrap_or_default();
        WorkSchedule {
            id: row.id,
            name: row.name,
            start_time: row.start_time,
            end_time: row.end_time,
            break_duration: row.break_duration,
            work_days,
            is_active: row.is_active,
        }
    }
}
