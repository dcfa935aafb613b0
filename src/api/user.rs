use crate::auth::auth::AuthUser;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

/// User as exposed to admins; never carries the password hash.
#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct UserResponse {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@company.com")]
    pub email: String,
    #[schema(example = 2)]
    pub role_id: u8,
    #[schema(example = 3, nullable = true)]
    pub position_id: Option<u64>,
    #[schema(example = 1, nullable = true)]
    pub work_schedule_id: Option<u64>,
    #[schema(example = "EMP-0007", nullable = true)]
    pub employee_code: Option<String>,
    #[schema(example = "+62811234567", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "Jakarta", nullable = true)]
    pub address: Option<String>,
    #[schema(example = "2024-03-01", value_type = String, format = "date", nullable = true)]
    pub hire_date: Option<NaiveDate>,
    #[schema(example = true)]
    pub is_active: bool,
}

const SELECT_USER: &str = r#"
    SELECT id, name, email, role_id, position_id, work_schedule_id,
           employee_code, phone, address, hire_date, is_active
    FROM users
"#;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Filter by role id (1=admin, 2=user)
    #[schema(example = 2)]
    pub role_id: Option<u8>,
    /// Substring match on name or email
    #[schema(example = "jane")]
    pub search: Option<String>,
    /// Pagination page number (1-based)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Users per page
    #[schema(example = 15)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 15)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U8(u8),
    Text(String),
}

/// List users (admin)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated user list", body = UserListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let per_page = query.per_page.unwrap_or(15).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(role_id) = query.role_id {
        where_sql.push_str(" AND role_id = ?");
        args.push(FilterValue::U8(role_id));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        where_sql.push_str(" AND (name LIKE ? OR email LIKE ?)");
        let pattern = format!("%{}%", search.trim());
        args.push(FilterValue::Text(pattern.clone()));
        args.push(FilterValue::Text(pattern));
    }

    let count_sql = format!("SELECT COUNT(*) FROM users{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U8(v) => count_q.bind(*v),
            FilterValue::Text(s) => count_q.bind(s.clone()),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count users");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "{}{} ORDER BY id DESC LIMIT ? OFFSET ?",
        SELECT_USER, where_sql
    );
    let mut data_q = sqlx::query_as::<_, UserResponse>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U8(v) => data_q.bind(v),
            FilterValue::Text(s) => data_q.bind(s),
        };
    }
    let users = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch users");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data: users,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// User detail (admin)
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    let sql = format!("{SELECT_USER} WHERE id = ?");
    let user = sqlx::query_as::<_, UserResponse>(&sql)
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to fetch user");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        }))),
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUser {
    pub name: Option<String>,
    #[schema(format = "email")]
    pub email: Option<String>,
    /// 1=admin, 2=user
    pub role_id: Option<u8>,
    pub position_id: Option<u64>,
    pub work_schedule_id: Option<u64>,
    pub employee_code: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub hire_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

/// Update user profile and assignments (admin)
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    if let Some(role_id) = payload.role_id {
        if crate::model::role::Role::from_id(role_id).is_none() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Invalid role id"
            })));
        }
    }

    let result = sqlx::query(
        r#"
        UPDATE users
        SET name = COALESCE(?, name),
            email = COALESCE(?, email),
            role_id = COALESCE(?, role_id),
            position_id = COALESCE(?, position_id),
            work_schedule_id = COALESCE(?, work_schedule_id),
            employee_code = COALESCE(?, employee_code),
            phone = COALESCE(?, phone),
            address = COALESCE(?, address),
            hire_date = COALESCE(?, hire_date),
            is_active = COALESCE(?, is_active)
        WHERE id = ?
        "#,
    )
    .bind(payload.name.as_deref())
    .bind(payload.email.as_deref().map(|e| e.trim().to_lowercase()))
    .bind(payload.role_id)
    .bind(payload.position_id)
    .bind(payload.work_schedule_id)
    .bind(payload.employee_code.as_deref())
    .bind(payload.phone.as_deref())
    .bind(payload.address.as_deref())
    .bind(payload.hire_date)
    .bind(payload.is_active)
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to update user");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "User updated"
    })))
}

/// Delete user (admin); self-deletion refused
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Cannot delete own account"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    if id == auth.user_id {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Cannot delete your own account"
        })));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete user");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "User deleted"
    })))
}
