use crate::auth::auth::AuthUser;
use crate::core::recorder::{self, ClockError};
use crate::db::MySqlAttendanceStore;
use crate::model::attendance::AttendanceRecord;
use crate::model::work_schedule::{WorkSchedule, WorkScheduleRow};
use crate::utils::location_cache;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

pub const MAX_NOTES_LEN: usize = 1000;

#[derive(Deserialize, ToSchema)]
pub struct ClockReq {
    #[schema(example = -6.2087611)]
    pub latitude: f64,
    #[schema(example = 106.8455870)]
    pub longitude: f64,
    #[schema(example = "traffic on the way in", nullable = true)]
    pub notes: Option<String>,
}

/// Request-layer validation; the geofence core assumes in-range input.
fn validate_clock_req(req: &ClockReq) -> Result<(), &'static str> {
    if !req.latitude.is_finite() || !(-90.0..=90.0).contains(&req.latitude) {
        return Err("latitude must be between -90 and 90");
    }
    if !req.longitude.is_finite() || !(-180.0..=180.0).contains(&req.longitude) {
        return Err("longitude must be between -180 and 180");
    }
    if let Some(notes) = &req.notes {
        if notes.len() > MAX_NOTES_LEN {
            return Err("notes may not exceed 1000 characters");
        }
    }
    Ok(())
}

/// Work schedule assigned to a user, if any.
async fn user_schedule(
    pool: &MySqlPool,
    user_id: u64,
) -> Result<Option<WorkSchedule>, sqlx::Error> {
    let row = sqlx::query_as::<_, WorkScheduleRow>(
        r#"
        SELECT ws.id, ws.name, ws.start_time, ws.end_time,
               ws.break_duration, ws.work_days, ws.is_active
        FROM work_schedules ws
        INNER JOIN users u ON u.work_schedule_id = ws.id
        WHERE u.id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(WorkSchedule::from))
}

fn clock_error_response(e: ClockError) -> actix_web::Result<HttpResponse> {
    match e {
        ClockError::NotFound => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": e.to_string()
        }))),
        ClockError::NotOwner => Ok(HttpResponse::Forbidden().json(serde_json::json!({
            "message": e.to_string()
        }))),
        ClockError::AlreadyClockedIn | ClockError::AlreadyClockedOut => {
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": e.to_string()
            })))
        }
        ClockError::Store(e) => {
            tracing::error!(error = %e, "Attendance store failure");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/clock-in",
    request_body = ClockReq,
    responses(
        (status = 200, description = "Clocked in", body = Object, example = json!({
            "message": "Successfully clocked in!",
            "attendance": {"id": 42, "status": "present", "is_within_radius": true}
        })),
        (status = 400, description = "Already clocked in today, or invalid coordinates", body = Object, example = json!({
            "message": "You have already clocked in today."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClockReq>,
) -> actix_web::Result<impl Responder> {
    if let Err(msg) = validate_clock_req(&payload) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": msg })));
    }

    let locations = location_cache::active_locations(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load active locations");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let schedule = user_schedule(pool.get_ref(), auth.user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = auth.user_id, "Failed to load work schedule");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let store = MySqlAttendanceStore::new(pool.get_ref().clone());
    let now = Local::now().naive_local();

    match recorder::clock_in(
        &store,
        auth.user_id,
        schedule.as_ref(),
        &locations,
        payload.latitude,
        payload.longitude,
        payload.notes.as_deref(),
        now,
    )
    .await
    {
        Ok(outcome) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": outcome.message,
            "attendance": outcome.record
        }))),
        Err(e) => clock_error_response(e),
    }
}

/// Clock-out endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{id}/clock-out",
    params(("id" = u64, Path, description = "Attendance record id")),
    request_body = ClockReq,
    responses(
        (status = 200, description = "Clocked out", body = Object, example = json!({
            "message": "Successfully clocked out!",
            "attendance": {"id": 42, "status": "present", "is_within_radius": true}
        })),
        (status = 400, description = "Already clocked out today, or invalid coordinates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Record belongs to another user"),
        (status = 404, description = "No attendance record found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ClockReq>,
) -> actix_web::Result<impl Responder> {
    if let Err(msg) = validate_clock_req(&payload) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": msg })));
    }

    let record_id = path.into_inner();

    let locations = location_cache::active_locations(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load active locations");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let store = MySqlAttendanceStore::new(pool.get_ref().clone());
    let now = Local::now().naive_local();

    match recorder::clock_out(
        &store,
        record_id,
        auth.user_id,
        &locations,
        payload.latitude,
        payload.longitude,
        payload.notes.as_deref(),
        now,
    )
    .await
    {
        Ok(outcome) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": outcome.message,
            "attendance": outcome.record
        }))),
        Err(e) => clock_error_response(e),
    }
}

#[derive(Serialize, ToSchema)]
pub struct TodayResponse {
    pub attendance: Option<AttendanceRecord>,
    pub locations: Vec<crate::model::location::Location>,
    #[schema(example = true)]
    pub can_clock_in: bool,
    #[schema(example = false)]
    pub can_clock_out: bool,
}

/// Today's attendance state for the caller
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    responses(
        (status = 200, description = "Today's record (if any) plus active locations", body = TodayResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    use crate::core::store::AttendanceStore;

    let store = MySqlAttendanceStore::new(pool.get_ref().clone());
    let today = Local::now().naive_local().date();

    let attendance = store
        .find_by_user_and_date(auth.user_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = auth.user_id, "Failed to load today's attendance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let locations = location_cache::active_locations(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load active locations");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let can_clock_in = attendance
        .as_ref()
        .map(|a| a.clock_in.is_none())
        .unwrap_or(true);
    let can_clock_out = attendance
        .as_ref()
        .map(|a| a.clock_in.is_some() && a.clock_out.is_none())
        .unwrap_or(false);

    Ok(HttpResponse::Ok().json(TodayResponse {
        attendance,
        locations: locations.as_ref().clone(),
        can_clock_in,
        can_clock_out,
    }))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Pagination page number (1-based)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Records per page
    #[schema(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 57)]
    pub total: i64,
}

/// Caller's attendance history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Paginated attendance history", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendances WHERE user_id = ?",
    )
    .bind(auth.user_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to count attendance history");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let sql = format!(
        "{} WHERE user_id = ? ORDER BY date DESC LIMIT ? OFFSET ?",
        SELECT_RECORDS
    );
    let rows = sqlx::query_as::<_, AttendanceRowDto>(&sql)
        .bind(auth.user_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch attendance history");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    let records: Vec<AttendanceRecord> = rows.into_iter().map(AttendanceRecord::from).collect();

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: records,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

// -------------------------
// Admin endpoints
// -------------------------

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
    Date(NaiveDate),
    Bool(bool),
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    /// Earliest date (inclusive)
    #[schema(example = "2026-08-01", value_type = String, format = "date")]
    pub date_from: Option<NaiveDate>,
    /// Latest date (inclusive)
    #[schema(example = "2026-08-31", value_type = String, format = "date")]
    pub date_to: Option<NaiveDate>,
    /// Filter by user id
    #[schema(example = 7)]
    pub user_id: Option<u64>,
    /// Filter by status (present, late, absent, sick, leave)
    #[schema(example = "late")]
    pub status: Option<String>,
    /// "within" or "outside"
    #[schema(example = "outside")]
    pub radius_compliance: Option<String>,
    /// Pagination page number (1-based)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Records per page
    #[schema(example = 20)]
    pub per_page: Option<u64>,
}

/// All attendance records with filters (admin)
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(from) = query.date_from {
        where_sql.push_str(" AND date >= ?");
        args.push(FilterValue::Date(from));
    }
    if let Some(to) = query.date_to {
        where_sql.push_str(" AND date <= ?");
        args.push(FilterValue::Date(to));
    }
    if let Some(user_id) = query.user_id {
        where_sql.push_str(" AND user_id = ?");
        args.push(FilterValue::U64(user_id));
    }
    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }
    match query.radius_compliance.as_deref() {
        Some("within") => {
            where_sql.push_str(" AND is_within_radius = ?");
            args.push(FilterValue::Bool(true));
        }
        Some("outside") => {
            where_sql.push_str(" AND is_within_radius = ?");
            args.push(FilterValue::Bool(false));
        }
        _ => {}
    }

    let count_sql = format!("SELECT COUNT(*) FROM attendances{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
            FilterValue::Date(d) => count_q.bind(*d),
            FilterValue::Bool(b) => count_q.bind(*b),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count attendances");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "{}{} ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
        SELECT_RECORDS, where_sql
    );
    let mut data_q = sqlx::query_as::<_, AttendanceRowDto>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s.to_owned()),
            FilterValue::Date(d) => data_q.bind(d),
            FilterValue::Bool(b) => data_q.bind(b),
        };
    }
    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch attendances");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    let records: Vec<AttendanceRecord> = rows.into_iter().map(AttendanceRecord::from).collect();

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: records,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Delete an attendance record (admin)
#[utoipa::path(
    delete,
    path = "/api/v1/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance record id")),
    responses(
        (status = 200, description = "Attendance deleted", body = Object, example = json!({
            "message": "Attendance record deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    let result = sqlx::query("DELETE FROM attendances WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, id, "Failed to delete attendance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Attendance record not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance record deleted"
    })))
}

const SELECT_RECORDS: &str = r#"
    SELECT id, user_id, location_id, date, clock_in, clock_out,
           clock_in_latitude, clock_in_longitude,
           clock_out_latitude, clock_out_longitude,
           is_within_radius, notes, status
    FROM attendances
"#;

#[derive(sqlx::FromRow)]
pub struct AttendanceRowDto {
    pub id: u64,
    pub user_id: u64,
    pub location_id: Option<u64>,
    pub date: NaiveDate,
    pub clock_in: Option<chrono::NaiveDateTime>,
    pub clock_out: Option<chrono::NaiveDateTime>,
    pub clock_in_latitude: Option<f64>,
    pub clock_in_longitude: Option<f64>,
    pub clock_out_latitude: Option<f64>,
    pub clock_out_longitude: Option<f64>,
    pub is_within_radius: bool,
    pub notes: Option<String>,
    pub status: String,
}

impl From<AttendanceRowDto> for AttendanceRecord {
    fn from(row: AttendanceRowDto) -> Self {
        AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            location_id: row.location_id,
            date: row.date,
            clock_in: row.clock_in,
            clock_out: row.clock_out,
            clock_in_latitude: row.clock_in_latitude,
            clock_in_longitude: row.clock_in_longitude,
            clock_out_latitude: row.clock_out_latitude,
            clock_out_longitude: row.clock_out_longitude,
            is_within_radius: row.is_within_radius,
            notes: row.notes,
            status: row
                .status
                .parse()
                .unwrap_or(crate::model::attendance::AttendanceStatus::Present),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(lat: f64, lon: f64, notes: Option<&str>) -> ClockReq {
        ClockReq {
            latitude: lat,
            longitude: lon,
            notes: notes.map(str::to_owned),
        }
    }

    #[test]
    fn coordinates_must_be_in_range() {
        assert!(validate_clock_req(&req(0.0, 0.0, None)).is_ok());
        assert!(validate_clock_req(&req(90.0, 180.0, None)).is_ok());
        assert!(validate_clock_req(&req(-90.0, -180.0, None)).is_ok());
        assert!(validate_clock_req(&req(90.1, 0.0, None)).is_err());
        assert!(validate_clock_req(&req(0.0, -180.5, None)).is_err());
        assert!(validate_clock_req(&req(f64::NAN, 0.0, None)).is_err());
    }

    #[test]
    fn notes_are_length_bounded() {
        assert!(validate_clock_req(&req(0.0, 0.0, Some("short"))).is_ok());
        let long = "x".repeat(MAX_NOTES_LEN + 1);
        assert!(validate_clock_req(&req(0.0, 0.0, Some(&long))).is_err());
    }
}
