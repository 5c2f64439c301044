pub mod attendance;
pub mod leave_ledger;
pub mod leave_request;
pub mod user;

// Re-export all repositories for easy importing
pub use attendance::AttendanceRepository;
pub use leave_ledger::LeaveLedgerRepository;
pub use leave_request::LeaveRequestRepository;
pub use user::UserRepository;
