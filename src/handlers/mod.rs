pub mod attendance;
pub mod auth;
pub mod leave;
pub mod shared;
