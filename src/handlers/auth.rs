use actix_web::{web, HttpResponse};

use crate::database::models::{CreateUserInput, LoginInput};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{AuthService, Claims};

pub async fn register(
    auth_service: web::Data<AuthService>,
    request: web::Json<CreateUserInput>,
) -> Result<HttpResponse, AppError> {
    let response = auth_service.register(request.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(response)))
}

pub async fn login(
    auth_service: web::Data<AuthService>,
    request: web::Json<LoginInput>,
) -> Result<HttpResponse, AppError> {
    let response = auth_service.login(request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

pub async fn me(
    auth_service: web::Data<AuthService>,
    claims: Claims,
) -> Result<HttpResponse, AppError> {
    let user = auth_service.find_user(claims.user_id()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}
