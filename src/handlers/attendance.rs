use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{CheckInInput, CheckOutInput};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{AttendanceService, Claims};

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

impl MonthQuery {
    /// The requested month, defaulting to the current one.
    fn month_or_current(&self) -> String {
        self.month
            .clone()
            .unwrap_or_else(|| Utc::now().format("%Y-%m").to_string())
    }
}

pub async fn check_in(
    attendance_service: web::Data<AttendanceService>,
    claims: Claims,
    request: web::Json<CheckInInput>,
) -> Result<HttpResponse, AppError> {
    let input = request.into_inner();
    let entry = attendance_service
        .check_in(&claims, input.location, input.notes)
        .await?;

    Ok(HttpResponse::Created()
        .json(ApiResponse::success_with_message(Some(entry), "Checked in")))
}

pub async fn check_out(
    attendance_service: web::Data<AttendanceService>,
    claims: Claims,
    request: web::Json<CheckOutInput>,
) -> Result<HttpResponse, AppError> {
    let input = request.into_inner();
    let entry = attendance_service.check_out(&claims, input.notes).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(Some(entry), "Checked out")))
}

pub async fn current_status(
    attendance_service: web::Data<AttendanceService>,
    claims: Claims,
) -> Result<HttpResponse, AppError> {
    let status = attendance_service.current_status(&claims).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(status)))
}

/// Scope-dependent listing: employees get their own records, HR the whole
/// company's.
pub async fn get_attendance(
    attendance_service: web::Data<AttendanceService>,
    claims: Claims,
    query: web::Query<RangeQuery>,
) -> Result<HttpResponse, AppError> {
    let records = attendance_service
        .attendance_records(&claims, query.from, query.to)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

pub async fn get_my_attendance(
    attendance_service: web::Data<AttendanceService>,
    claims: Claims,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, AppError> {
    let records = attendance_service
        .my_attendance(&claims, &query.month_or_current())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

pub async fn get_company_day(
    attendance_service: web::Data<AttendanceService>,
    claims: Claims,
    path: web::Path<NaiveDate>,
) -> Result<HttpResponse, AppError> {
    let records = attendance_service
        .company_day(&claims, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

pub async fn get_summary(
    attendance_service: web::Data<AttendanceService>,
    claims: Claims,
    path: web::Path<Uuid>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, AppError> {
    let summary = attendance_service
        .summary(&claims, path.into_inner(), &query.month_or_current())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}
