pub mod attendance;
pub mod dashboard;
pub mod location;
pub mod position;
pub mod user;
pub mod work_schedule;
