use crate::auth::auth::AuthUser;
use crate::model::location::Location;
use crate::utils::location_cache;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLocation {
    #[schema(example = "Head Office")]
    pub name: String,
    #[schema(example = "Jl. Jend. Sudirman No. 1, Jakarta")]
    pub address: String,
    #[schema(example = -6.2087634)]
    pub latitude: f64,
    #[schema(example = 106.8455990)]
    pub longitude: f64,
    #[schema(example = 100.0)]
    pub radius: f64,
    #[schema(example = true)]
    pub is_active: Option<bool>,
}

/// Location invariants: in-range coordinates, strictly positive radius.
fn validate_location(name: &str, latitude: f64, longitude: f64, radius: f64) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("name must not be empty");
    }
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err("latitude must be between -90 and 90");
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err("longitude must be between -180 and 180");
    }
    if !radius.is_finite() || radius <= 0.0 {
        return Err("radius must be greater than zero");
    }
    Ok(())
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LocationQuery {
    /// Pagination page number (1-based)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Locations per page
    #[schema(example = 15)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LocationListResponse {
    pub data: Vec<Location>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 15)]
    pub per_page: u32,
    #[schema(example = 3)]
    pub total: i64,
}

/// List locations (admin)
#[utoipa::path(
    get,
    path = "/api/v1/locations",
    params(LocationQuery),
    responses(
        (status = 200, description = "Paginated location list", body = LocationListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn list_locations(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LocationQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let per_page = query.per_page.unwrap_or(15).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM locations")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to count locations");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let locations = sqlx::query_as::<_, Location>(
        r#"
        SELECT id, name, address, latitude, longitude, radius, is_active
        FROM locations
        ORDER BY id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch locations");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(LocationListResponse {
        data: locations,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct LocationStats {
    #[schema(example = 120)]
    pub total_attendances: i64,
    #[schema(example = 14)]
    pub unique_users: i64,
    #[schema(example = 110)]
    pub within_radius_count: i64,
    #[schema(example = 10)]
    pub outside_radius_count: i64,
}

/// Location detail with attendance stats (admin)
#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}",
    params(("id" = u64, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location with attendance stats"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Location not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn get_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    let location = sqlx::query_as::<_, Location>(
        r#"
        SELECT id, name, address, latitude, longitude, radius, is_active
        FROM locations
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch location");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(location) = location else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Location not found"
        })));
    };

    let stats = sqlx::query_as::<_, LocationStats>(
        r#"
        SELECT
            COUNT(*) AS total_attendances,
            COUNT(DISTINCT user_id) AS unique_users,
            CAST(COALESCE(SUM(CASE WHEN is_within_radius = 1 THEN 1 ELSE 0 END), 0) AS SIGNED) AS within_radius_count,
            CAST(COALESCE(SUM(CASE WHEN is_within_radius = 0 THEN 1 ELSE 0 END), 0) AS SIGNED) AS outside_radius_count
        FROM attendances
        WHERE location_id = ?
        "#,
    )
    .bind(id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch location stats");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "location": location,
        "stats": stats
    })))
}

/// Create location (admin)
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = CreateLocation,
    responses(
        (status = 201, description = "Location created", body = Object, example = json!({
            "message": "Location created",
            "id": 4
        })),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn create_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLocation>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if let Err(msg) = validate_location(
        &payload.name,
        payload.latitude,
        payload.longitude,
        payload.radius,
    ) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": msg })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO locations (name, address, latitude, longitude, radius, is_active)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.name.trim())
    .bind(&payload.address)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(payload.radius)
    .bind(payload.is_active.unwrap_or(true))
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create location");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    location_cache::invalidate().await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Location created",
        "id": result.last_insert_id()
    })))
}

/// Update location (admin)
#[utoipa::path(
    put,
    path = "/api/v1/locations/{id}",
    params(("id" = u64, Path, description = "Location id")),
    request_body = CreateLocation,
    responses(
        (status = 200, description = "Location updated"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Location not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn update_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CreateLocation>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if let Err(msg) = validate_location(
        &payload.name,
        payload.latitude,
        payload.longitude,
        payload.radius,
    ) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": msg })));
    }

    let id = path.into_inner();
    let result = sqlx::query(
        r#"
        UPDATE locations
        SET name = ?, address = ?, latitude = ?, longitude = ?, radius = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.name.trim())
    .bind(&payload.address)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(payload.radius)
    .bind(payload.is_active.unwrap_or(true))
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to update location");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Location not found"
        })));
    }

    location_cache::invalidate().await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Location updated"
    })))
}

/// Delete location (admin); refused while attendance rows reference it
#[utoipa::path(
    delete,
    path = "/api/v1/locations/{id}",
    params(("id" = u64, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location deleted"),
        (status = 400, description = "Location has attendance records"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Location not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn delete_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    let in_use = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendances WHERE location_id = ?",
    )
    .bind(id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to check location usage");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if in_use > 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Cannot delete location with attendance records"
        })));
    }

    let result = sqlx::query("DELETE FROM locations WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete location");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Location not found"
        })));
    }

    location_cache::invalidate().await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Location deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_payloads() {
        assert!(validate_location("Office", 0.0, 0.0, 50.0).is_ok());
        assert!(validate_location("", 0.0, 0.0, 50.0).is_err());
        assert!(validate_location("Office", 91.0, 0.0, 50.0).is_err());
        assert!(validate_location("Office", 0.0, 181.0, 50.0).is_err());
        assert!(validate_location("Office", 0.0, 0.0, 0.0).is_err());
        assert!(validate_location("Office", 0.0, 0.0, -5.0).is_err());
    }
}
