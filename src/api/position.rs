use crate::auth::auth::AuthUser;
use crate::model::position::Position;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreatePosition {
    #[schema(example = "Software Engineer")]
    pub name: String,
    #[schema(example = "Builds and maintains internal systems", nullable = true)]
    pub description: Option<String>,
    #[schema(example = 1250.0, nullable = true)]
    pub salary: Option<f64>,
    #[schema(example = true)]
    pub is_active: Option<bool>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PositionQuery {
    /// Pagination page number (1-based)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Positions per page
    #[schema(example = 15)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct PositionListResponse {
    pub data: Vec<Position>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 15)]
    pub per_page: u32,
    #[schema(example = 6)]
    pub total: i64,
}

/// List positions (admin)
#[utoipa::path(
    get,
    path = "/api/v1/positions",
    params(PositionQuery),
    responses(
        (status = 200, description = "Paginated position list", body = PositionListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Position"
)]
pub async fn list_positions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PositionQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let per_page = query.per_page.unwrap_or(15).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM positions")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to count positions");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let positions = sqlx::query_as::<_, Position>(
        r#"
        SELECT id, name, description, salary, is_active
        FROM positions
        ORDER BY id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch positions");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(PositionListResponse {
        data: positions,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Position detail (admin)
#[utoipa::path(
    get,
    path = "/api/v1/positions/{id}",
    params(("id" = u64, Path, description = "Position id")),
    responses(
        (status = 200, description = "Position", body = Position),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Position not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Position"
)]
pub async fn get_position(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    let position = sqlx::query_as::<_, Position>(
        "SELECT id, name, description, salary, is_active FROM positions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch position");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match position {
        Some(position) => Ok(HttpResponse::Ok().json(position)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Position not found"
        }))),
    }
}

/// Create position (admin)
#[utoipa::path(
    post,
    path = "/api/v1/positions",
    request_body = CreatePosition,
    responses(
        (status = 201, description = "Position created"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Position"
)]
pub async fn create_position(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePosition>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "name must not be empty"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO positions (name, description, salary, is_active)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.description.as_deref())
    .bind(payload.salary)
    .bind(payload.is_active.unwrap_or(true))
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create position");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Position created",
        "id": result.last_insert_id()
    })))
}

/// Update position (admin)
#[utoipa::path(
    put,
    path = "/api/v1/positions/{id}",
    params(("id" = u64, Path, description = "Position id")),
    request_body = CreatePosition,
    responses(
        (status = 200, description = "Position updated"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Position not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Position"
)]
pub async fn update_position(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CreatePosition>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "name must not be empty"
        })));
    }

    let id = path.into_inner();
    let result = sqlx::query(
        r#"
        UPDATE positions
        SET name = ?, description = ?, salary = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.description.as_deref())
    .bind(payload.salary)
    .bind(payload.is_active.unwrap_or(true))
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to update position");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Position not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Position updated"
    })))
}

/// Delete position (admin); refused while users are assigned
#[utoipa::path(
    delete,
    path = "/api/v1/positions/{id}",
    params(("id" = u64, Path, description = "Position id")),
    responses(
        (status = 200, description = "Position deleted"),
        (status = 400, description = "Position has assigned users"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Position not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Position"
)]
pub async fn delete_position(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    let assigned =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE position_id = ?")
            .bind(id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, id, "Failed to check position usage");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    if assigned > 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Cannot delete position with assigned users"
        })));
    }

    let result = sqlx::query("DELETE FROM positions WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete position");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Position not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Position deleted"
    })))
}
