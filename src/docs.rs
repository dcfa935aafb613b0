use crate::api::attendance::{
    AttendanceFilter, AttendanceListResponse, ClockReq, HistoryQuery, TodayResponse,
};
use crate::api::dashboard::{DashboardStats, MonthlyStats};
use crate::api::location::{CreateLocation, LocationListResponse, LocationQuery, LocationStats};
use crate::api::position::{CreatePosition, PositionListResponse, PositionQuery};
use crate::api::user::{UpdateUser, UserListResponse, UserQuery, UserResponse};
use crate::api::work_schedule::{
    CreateWorkSchedule, WorkScheduleListResponse, WorkScheduleQuery,
};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::location::Location;
use crate::model::position::Position;
use crate::model::work_schedule::WorkSchedule;
use crate::models::{LoginReqDto, RegisterReq};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Geofenced Employee Attendance Tracker

This API powers an employee attendance system with **GPS geofencing**: users
clock in and out from their phones and the server resolves the nearest office
location, checks radius compliance, and derives present/late status from the
user's work schedule.

### 🔹 Key Features
- **Clock In / Clock Out**
  - One attendance record per user per day, geofence compliance tracking
- **Location Management**
  - Office locations with coordinates and attendance radius
- **Work Schedules**
  - Start/end times, working days, lateness grace period
- **Admin Dashboard**
  - Daily headcounts, monthly aggregates, compliance stats

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Administrative operations require the **Admin** role.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::list_attendances,
        crate::api::attendance::delete_attendance,

        crate::api::location::list_locations,
        crate::api::location::get_location,
        crate::api::location::create_location,
        crate::api::location::update_location,
        crate::api::location::delete_location,

        crate::api::work_schedule::list_work_schedules,
        crate::api::work_schedule::get_work_schedule,
        crate::api::work_schedule::create_work_schedule,
        crate::api::work_schedule::update_work_schedule,
        crate::api::work_schedule::delete_work_schedule,

        crate::api::position::list_positions,
        crate::api::position::get_position,
        crate::api::position::create_position,
        crate::api::position::update_position,
        crate::api::position::delete_position,

        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::update_user,
        crate::api::user::delete_user,

        crate::api::dashboard::dashboard
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            ClockReq,
            TodayResponse,
            HistoryQuery,
            AttendanceFilter,
            AttendanceListResponse,
            AttendanceRecord,
            AttendanceStatus,
            Location,
            LocationQuery,
            LocationListResponse,
            LocationStats,
            CreateLocation,
            WorkSchedule,
            WorkScheduleQuery,
            WorkScheduleListResponse,
            CreateWorkSchedule,
            Position,
            PositionQuery,
            PositionListResponse,
            CreatePosition,
            UserResponse,
            UserQuery,
            UserListResponse,
            UpdateUser,
            DashboardStats,
            MonthlyStats
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Authentication APIs"),
        (name = "Attendance", description = "Clock-in/out and attendance records"),
        (name = "Location", description = "Office location management APIs"),
        (name = "WorkSchedule", description = "Work schedule management APIs"),
        (name = "Position", description = "Position management APIs"),
        (name = "User", description = "User management APIs"),
        (name = "Dashboard", description = "Admin dashboard APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
