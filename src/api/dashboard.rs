use crate::api::attendance::AttendanceRowDto;
use crate::auth::auth::AuthUser;
use crate::model::attendance::AttendanceRecord;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct DashboardStats {
    #[schema(example = 42)]
    pub total_employees: i64,
    #[schema(example = 3)]
    pub total_locations: i64,
    #[schema(example = 6)]
    pub total_positions: i64,
    #[schema(example = 31)]
    pub present_today: i64,
    #[schema(example = 4)]
    pub late_today: i64,
    #[schema(example = 7)]
    pub absent_today: i64,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct MonthlyStats {
    #[schema(example = 640)]
    pub total_records: i64,
    #[schema(example = 575)]
    pub present_count: i64,
    #[schema(example = 41)]
    pub late_count: i64,
    #[schema(example = 24)]
    pub absent_count: i64,
    #[schema(example = 12)]
    pub outside_radius_count: i64,
}

async fn count_scalar(pool: &MySqlPool, sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await
}

/// Admin dashboard: today's headcount, monthly aggregates, recent records
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Dashboard statistics"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let internal_error = |e: sqlx::Error| {
        error!(error = %e, "Failed to build dashboard stats");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    };

    let pool = pool.get_ref();
    let today = Local::now().naive_local().date();

    let total_employees = count_scalar(
        pool,
        "SELECT COUNT(*) FROM users WHERE role_id = 2 AND is_active = TRUE",
    )
    .await
    .map_err(internal_error)?;
    let total_locations = count_scalar(
        pool,
        "SELECT COUNT(*) FROM locations WHERE is_active = TRUE",
    )
    .await
    .map_err(internal_error)?;
    let total_positions = count_scalar(
        pool,
        "SELECT COUNT(*) FROM positions WHERE is_active = TRUE",
    )
    .await
    .map_err(internal_error)?;

    #[derive(sqlx::FromRow)]
    struct TodayCounts {
        total: i64,
        present: i64,
        late: i64,
    }

    let today_counts = sqlx::query_as::<_, TodayCounts>(
        r#"
        SELECT
            COUNT(*) AS total,
            CAST(COALESCE(SUM(CASE WHEN status = 'present' THEN 1 ELSE 0 END), 0) AS SIGNED) AS present,
            CAST(COALESCE(SUM(CASE WHEN status = 'late' THEN 1 ELSE 0 END), 0) AS SIGNED) AS late
        FROM attendances
        WHERE date = ?
        "#,
    )
    .bind(today)
    .fetch_one(pool)
    .await
    .map_err(internal_error)?;

    let monthly = sqlx::query_as::<_, MonthlyStats>(
        r#"
        SELECT
            COUNT(*) AS total_records,
            CAST(COALESCE(SUM(CASE WHEN status = 'present' THEN 1 ELSE 0 END), 0) AS SIGNED) AS present_count,
            CAST(COALESCE(SUM(CASE WHEN status = 'late' THEN 1 ELSE 0 END), 0) AS SIGNED) AS late_count,
            CAST(COALESCE(SUM(CASE WHEN status = 'absent' THEN 1 ELSE 0 END), 0) AS SIGNED) AS absent_count,
            CAST(COALESCE(SUM(CASE WHEN is_within_radius = 0 THEN 1 ELSE 0 END), 0) AS SIGNED) AS outside_radius_count
        FROM attendances
        WHERE MONTH(date) = ? AND YEAR(date) = ?
        "#,
    )
    .bind(today.month())
    .bind(today.year())
    .fetch_one(pool)
    .await
    .map_err(internal_error)?;

    let recent_rows = sqlx::query_as::<_, AttendanceRowDto>(
        r#"
        SELECT id, user_id, location_id, date, clock_in, clock_out,
               clock_in_latitude, clock_in_longitude,
               clock_out_latitude, clock_out_longitude,
               is_within_radius, notes, status
        FROM attendances
        ORDER BY id DESC
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(internal_error)?;
    let recent: Vec<AttendanceRecord> =
        recent_rows.into_iter().map(AttendanceRecord::from).collect();

    let stats = DashboardStats {
        total_employees,
        total_locations,
        total_positions,
        present_today: today_counts.present,
        late_today: today_counts.late,
        absent_today: (total_employees - today_counts.total).max(0),
    };

    Ok(HttpResponse::Ok().json(json!({
        "stats": stats,
        "monthly_stats": monthly,
        "recent_attendances": recent
    })))
}
