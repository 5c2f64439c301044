use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use hrdesk::config::{Config, DEFAULT_HALF_DAY_THRESHOLD_HOURS};
use hrdesk::database::init_database;
use hrdesk::database::models::{User, UserRole};
use hrdesk::database::repositories::{
    AttendanceRepository, LeaveLedgerRepository, LeaveRequestRepository, UserRepository,
};
use hrdesk::services::Claims;
use hrdesk::{AttendanceService, AuthService, LeaveService};

// Test database wrapper. The tempdir is dropped with the wrapper, taking
// the database file with it.
pub struct TestDb {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let database_url = format!("sqlite:{}/test.db", temp_dir.path().display());
        let pool = init_database(&database_url).await?;

        Ok(TestDb {
            pool,
            _temp_dir: temp_dir,
        })
    }
}

pub struct TestContext {
    pub db: TestDb,
    pub config: Config,
    pub users: UserRepository,
    pub attendance_repo: AttendanceRepository,
    pub leave_requests: LeaveRequestRepository,
    pub ledger: LeaveLedgerRepository,
    pub auth: AuthService,
    pub attendance: AttendanceService,
    pub leave: LeaveService,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        let db = TestDb::new().await?;

        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-jwt-secret-key-that-is-long-enough".to_string(),
            jwt_expiration_days: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            half_day_threshold_hours: DEFAULT_HALF_DAY_THRESHOLD_HOURS,
        };

        let users = UserRepository::new(db.pool.clone());
        let attendance_repo = AttendanceRepository::new(db.pool.clone());
        let leave_requests = LeaveRequestRepository::new(db.pool.clone());
        let ledger = LeaveLedgerRepository::new(db.pool.clone());

        let auth = AuthService::new(users.clone(), config.clone());
        let attendance =
            AttendanceService::new(attendance_repo.clone(), config.half_day_threshold_hours);
        let leave = LeaveService::new(
            db.pool.clone(),
            leave_requests.clone(),
            ledger.clone(),
            users.clone(),
        );

        Ok(TestContext {
            db,
            config,
            users,
            attendance_repo,
            leave_requests,
            ledger,
            auth,
            attendance,
            leave,
        })
    }

    pub async fn seed_company(&self, name: &str) -> Result<Uuid> {
        let company = self.users.create_company(name).await?;
        Ok(company.id)
    }

    pub async fn seed_user(
        &self,
        company_id: Uuid,
        name: &str,
        email: &str,
        role: UserRole,
    ) -> Result<User> {
        let now = Utc::now();
        let login_id = email.split('@').next().unwrap_or(email).to_string();
        let user = User {
            id: Uuid::new_v4(),
            company_id,
            login_id,
            email: email.to_string(),
            name: name.to_string(),
            // Low cost keeps seeding fast
            password_hash: bcrypt::hash("password123", 4)?,
            role,
            created_at: now,
            updated_at: now,
        };
        let user = self.users.create_user(&user).await?;
        Ok(user)
    }
}

pub fn claims_for(user: &User) -> Claims {
    Claims {
        sub: user.id,
        email: user.email.clone(),
        company_id: user.company_id,
        role: user.role,
        exp: (Utc::now() + Duration::days(1)).timestamp() as usize,
    }
}

/// App with the real `/api/v1` routing, ready for `test::init_service`.
pub fn build_app(
    ctx: &TestContext,
) -> actix_web::App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    actix_web::App::new()
        .app_data(actix_web::web::Data::new(ctx.config.clone()))
        .app_data(actix_web::web::Data::new(ctx.auth.clone()))
        .app_data(actix_web::web::Data::new(ctx.attendance.clone()))
        .app_data(actix_web::web::Data::new(ctx.leave.clone()))
        .configure(hrdesk::api_routes)
}
