pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use services::{AttendanceService, AuthService, LeaveService};

use actix_web::web;

use handlers::{attendance, auth, leave};

/// The `/api/v1` route tree. Shared between the server binary and the
/// HTTP-level tests so both always see the same routing.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/attendance")
                    .route("/check-in", web::post().to(attendance::check_in))
                    .route("/check-out", web::post().to(attendance::check_out))
                    .route("/status", web::get().to(attendance::current_status))
                    .route("", web::get().to(attendance::get_attendance))
                    .route("/my", web::get().to(attendance::get_my_attendance))
                    .route("/day/{date}", web::get().to(attendance::get_company_day))
                    .route(
                        "/summary/{user_id}",
                        web::get().to(attendance::get_summary),
                    ),
            )
            .service(
                web::scope("/leave")
                    .route("", web::post().to(leave::apply_leave))
                    .route("", web::get().to(leave::get_leave_requests))
                    .route("/{id}/approve", web::post().to(leave::approve_leave))
                    .route("/{id}/reject", web::post().to(leave::reject_leave))
                    .route("/balance", web::get().to(leave::get_leave_balance))
                    .route("/ledger", web::post().to(leave::allocate_leave))
                    .route("/ledger", web::get().to(leave::get_leave_ledger))
                    .route("/employees", web::get().to(leave::get_employees)),
            ),
    );
}
