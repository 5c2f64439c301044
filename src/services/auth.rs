use actix_web::{
    dev::Payload, error::ErrorUnauthorized, web::Data, Error as ActixError, FromRequest,
    HttpRequest,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{AuthResponse, CreateUserInput, LoginInput, User, UserRole};
use crate::database::repositories::UserRepository;
use crate::error::AppError;

/// Resolved identity: user, tenant and role, extracted from the bearer
/// token. Every handler that needs an identity takes this as an argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub email: String,
    pub company_id: Uuid, // tenant
    pub role: UserRole,
    pub exp: usize, // expiration time
}

impl Claims {
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    pub fn is_hr(&self) -> bool {
        self.role == UserRole::Hr
    }

    pub fn is_employee(&self) -> bool {
        self.role == UserRole::Employee
    }
}

impl FromRequest for Claims {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let auth_header = req.headers().get("Authorization");

        if let Some(auth_header) = auth_header {
            if let Ok(auth_str) = auth_header.to_str() {
                if let Some(token) = auth_str.strip_prefix("Bearer ") {
                    if let Some(config) = req.app_data::<Data<Config>>() {
                        match decode::<Claims>(
                            token,
                            &DecodingKey::from_secret(config.jwt_secret.as_ref()),
                            &Validation::new(Algorithm::HS256),
                        ) {
                            Ok(token_data) => {
                                return ready(Ok(token_data.claims));
                            }
                            Err(_) => {
                                return ready(Err(ErrorUnauthorized("Invalid token")));
                            }
                        }
                    }
                }
            }
        }

        ready(Err(ErrorUnauthorized(
            "Missing or invalid authorization header",
        )))
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repository: UserRepository,
    config: Config,
}

impl AuthService {
    pub fn new(user_repository: UserRepository, config: Config) -> Self {
        Self {
            user_repository,
            config,
        }
    }

    pub async fn register(&self, input: CreateUserInput) -> Result<AuthResponse, AppError> {
        if self.user_repository.email_exists(&input.email).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::internal_server_error_message(e.to_string()))?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            company_id: input.company_id,
            login_id: input.login_id,
            email: input.email,
            name: input.name,
            password_hash,
            role: input.role,
            created_at: now,
            updated_at: now,
        };

        let user = self
            .user_repository
            .create_user(&user)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "Email or login ID already exists"))?;

        let token = self.generate_token(&user)?;

        Ok(AuthResponse { token, user })
    }

    pub async fn login(&self, input: LoginInput) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repository
            .find_by_email(&input.email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::internal_server_error_message(e.to_string()))?;
        if !valid {
            return Err(AppError::Unauthorized);
        }

        let token = self.generate_token(&user)?;

        Ok(AuthResponse { token, user })
    }

    pub async fn find_user(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub fn generate_token(&self, user: &User) -> Result<String, AppError> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::days(self.config.jwt_expiration_days))
            .ok_or_else(|| AppError::internal_server_error_message("invalid expiry timestamp"))?
            .timestamp() as usize;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            company_id: user.company_id,
            role: user.role,
            exp: expiration,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )
        .map_err(|e| AppError::internal_server_error_message(e.to_string()))?;

        Ok(token)
    }
}
