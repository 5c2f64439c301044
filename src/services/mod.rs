pub mod attendance;
pub mod auth;
pub mod leave;

pub use attendance::AttendanceService;
pub use auth::{AuthService, Claims};
pub use leave::LeaveService;
