use crate::auth::auth::AuthUser;
use crate::model::work_schedule::{WorkSchedule, WorkScheduleRow};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateWorkSchedule {
    #[schema(example = "Regular Shift")]
    pub name: String,
    #[schema(example = "09:00:00", value_type = String, format = "time")]
    pub start_time: NaiveTime,
    #[schema(example = "17:00:00", value_type = String, format = "time")]
    pub end_time: NaiveTime,
    /// Break duration in minutes (0-480)
    #[schema(example = 60)]
    pub break_duration: u32,
    /// Working days, 0=Sunday .. 6=Saturday
    #[schema(example = json!([1, 2, 3, 4, 5]))]
    pub work_days: Vec<u8>,
    #[schema(example = true)]
    pub is_active: Option<bool>,
}

fn validate_schedule(payload: &CreateWorkSchedule) -> Result<(), &'static str> {
    if payload.name.trim().is_empty() {
        return Err("name must not be empty");
    }
    if payload.end_time <= payload.start_time {
        return Err("end_time must be after start_time");
    }
    if payload.break_duration > 480 {
        return Err("break_duration must be between 0 and 480 minutes");
    }
    if payload.work_days.is_empty() {
        return Err("work_days must not be empty");
    }
    if payload.work_days.iter().any(|day| *day > 6) {
        return Err("work_days entries must be between 0 (Sunday) and 6 (Saturday)");
    }
    Ok(())
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct WorkScheduleQuery {
    /// Pagination page number (1-based)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Schedules per page
    #[schema(example = 15)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct WorkScheduleListResponse {
    pub data: Vec<WorkSchedule>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 15)]
    pub per_page: u32,
    #[schema(example = 2)]
    pub total: i64,
}

/// List work schedules (admin)
#[utoipa::path(
    get,
    path = "/api/v1/work-schedules",
    params(WorkScheduleQuery),
    responses(
        (status = 200, description = "Paginated schedule list", body = WorkScheduleListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "WorkSchedule"
)]
pub async fn list_work_schedules(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<WorkScheduleQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let per_page = query.per_page.unwrap_or(15).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM work_schedules")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to count work schedules");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let rows = sqlx::query_as::<_, WorkScheduleRow>(
        r#"
        SELECT id, name, start_time, end_time, break_duration, work_days, is_active
        FROM work_schedules
        ORDER BY id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch work schedules");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(WorkScheduleListResponse {
        data: rows.into_iter().map(WorkSchedule::from).collect(),
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Work schedule detail (admin)
#[utoipa::path(
    get,
    path = "/api/v1/work-schedules/{id}",
    params(("id" = u64, Path, description = "Work schedule id")),
    responses(
        (status = 200, description = "Work schedule", body = WorkSchedule),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Work schedule not found")
    ),
    security(("bearer_auth" = [])),
    tag = "WorkSchedule"
)]
pub async fn get_work_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    let row = sqlx::query_as::<_, WorkScheduleRow>(
        r#"
        SELECT id, name, start_time, end_time, break_duration, work_days, is_active
        FROM work_schedules
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch work schedule");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match row {
        Some(row) => Ok(HttpResponse::Ok().json(WorkSchedule::from(row))),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Work schedule not found"
        }))),
    }
}

/// Create work schedule (admin)
#[utoipa::path(
    post,
    path = "/api/v1/work-schedules",
    request_body = CreateWorkSchedule,
    responses(
        (status = 201, description = "Work schedule created"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "WorkSchedule"
)]
pub async fn create_work_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateWorkSchedule>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if let Err(msg) = validate_schedule(&payload) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": msg })));
    }

    let work_days = serde_json::to_string(&payload.work_days).map_err(|e| {
        error!(error = %e, "Failed to encode work_days");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO work_schedules (name, start_time, end_time, break_duration, work_days, is_active)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.start_time)
    .bind(payload.end_time)
    .bind(payload.break_duration)
    .bind(work_days)
    .bind(payload.is_active.unwrap_or(true))
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create work schedule");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Work schedule created",
        "id": result.last_insert_id()
    })))
}

/// Update work schedule (admin)
#[utoipa::path(
    put,
    path = "/api/v1/work-schedules/{id}",
    params(("id" = u64, Path, description = "Work schedule id")),
    request_body = CreateWorkSchedule,
    responses(
        (status = 200, description = "Work schedule updated"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Work schedule not found")
    ),
    security(("bearer_auth" = [])),
    tag = "WorkSchedule"
)]
pub async fn update_work_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CreateWorkSchedule>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if let Err(msg) = validate_schedule(&payload) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": msg })));
    }

    let id = path.into_inner();
    let work_days = serde_json::to_string(&payload.work_days).map_err(|e| {
        error!(error = %e, "Failed to encode work_days");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        UPDATE work_schedules
        SET name = ?, start_time = ?, end_time = ?, break_duration = ?, work_days = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.start_time)
    .bind(payload.end_time)
    .bind(payload.break_duration)
    .bind(work_days)
    .bind(payload.is_active.unwrap_or(true))
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to update work schedule");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Work schedule not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Work schedule updated"
    })))
}

/// Delete work schedule (admin); refused while users are assigned
#[utoipa::path(
    delete,
    path = "/api/v1/work-schedules/{id}",
    params(("id" = u64, Path, description = "Work schedule id")),
    responses(
        (status = 200, description = "Work schedule deleted"),
        (status = 400, description = "Schedule has assigned users"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Work schedule not found")
    ),
    security(("bearer_auth" = [])),
    tag = "WorkSchedule"
)]
pub async fn delete_work_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    let assigned = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE work_schedule_id = ?",
    )
    .bind(id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to check schedule usage");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if assigned > 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Cannot delete work schedule with assigned users"
        })));
    }

    let result = sqlx::query("DELETE FROM work_schedules WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete work schedule");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Work schedule not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Work schedule deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CreateWorkSchedule {
        CreateWorkSchedule {
            name: "Regular Shift".into(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            break_duration: 60,
            work_days: vec![1, 2, 3, 4, 5],
            is_active: Some(true),
        }
    }

    #[test]
    fn accepts_a_regular_shift() {
        assert!(validate_schedule(&payload()).is_ok());
    }

    #[test]
    fn end_must_follow_start() {
        let mut p = payload();
        p.end_time = p.start_time;
        assert!(validate_schedule(&p).is_err());
    }

    #[test]
    fn work_days_are_bounded() {
        let mut p = payload();
        p.work_days = vec![];
        assert!(validate_schedule(&p).is_err());
        p.work_days = vec![0, 6];
        assert!(validate_schedule(&p).is_ok());
        p.work_days = vec![7];
        assert!(validate_schedule(&p).is_err());
    }

    #[test]
    fn break_duration_is_bounded() {
        let mut p = payload();
        p.break_duration = 480;
        assert!(validate_schedule(&p).is_ok());
        p.break_duration = 481;
        assert!(validate_schedule(&p).is_err());
    }
}
