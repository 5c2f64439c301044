pub mod attendance;
pub mod leave;
pub(crate) mod macros;
pub mod user;

// Re-export all models for easy importing
pub use attendance::*;
pub use leave::*;
pub use user::*;
