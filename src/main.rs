use actix_cors::Cors;
use actix_web::{get, middleware::Logger, web, App, HttpResponse, HttpServer, Responder};
use anyhow::Result;

use hrdesk::database::{
    init_database,
    repositories::{
        AttendanceRepository, LeaveLedgerRepository, LeaveRequestRepository, UserRepository,
    },
};
use hrdesk::middleware::RequestIdMiddleware;
use hrdesk::{api_routes, AttendanceService, AuthService, Config, LeaveService};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("HRDesk API v1.0")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init();

    // Load configuration
    let config = Config::from_env()?;
    log::info!("Configuration loaded (environment: {})", config.environment);

    // Initialize database
    let pool = init_database(&config.database_url).await?;
    log::info!("Database initialized");

    // Initialize repositories and services
    let user_repository = UserRepository::new(pool.clone());
    let attendance_repository = AttendanceRepository::new(pool.clone());
    let leave_request_repository = LeaveRequestRepository::new(pool.clone());
    let leave_ledger_repository = LeaveLedgerRepository::new(pool.clone());

    let auth_service = AuthService::new(user_repository.clone(), config.clone());
    let attendance_service =
        AttendanceService::new(attendance_repository, config.half_day_threshold_hours);
    let leave_service = LeaveService::new(
        pool.clone(),
        leave_request_repository,
        leave_ledger_repository,
        user_repository,
    );

    let config_data = web::Data::new(config.clone());
    let auth_service_data = web::Data::new(auth_service);
    let attendance_service_data = web::Data::new(attendance_service);
    let leave_service_data = web::Data::new(leave_service);

    let server_address = config.server_address();
    log::info!("Server starting on http://{}", server_address);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(auth_service_data.clone())
            .app_data(attendance_service_data.clone())
            .app_data(leave_service_data.clone())
            .wrap(
                Cors::default()
                    .allowed_origin("http://localhost:3000")
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                        "X-Request-ID",
                    ])
                    .max_age(3600),
            )
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T request_id=%{x-request-id}o"#,
            ))
            .service(hello)
            .service(health)
            .configure(api_routes)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
