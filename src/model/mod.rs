pub mod attendance;
pub mod location;
pub mod position;
pub mod role;
pub mod work_schedule;
