use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{ApplyLeaveInput, DecisionInput, LeaveType, LedgerAllocationInput};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{Claims, LeaveService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceQuery {
    pub user_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub leave_type: Option<LeaveType>,
}

pub async fn apply_leave(
    leave_service: web::Data<LeaveService>,
    claims: Claims,
    request: web::Json<ApplyLeaveInput>,
) -> Result<HttpResponse, AppError> {
    let leave_request = leave_service.apply(&claims, request.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        Some(leave_request),
        "Leave request submitted",
    )))
}

pub async fn get_leave_requests(
    leave_service: web::Data<LeaveService>,
    claims: Claims,
) -> Result<HttpResponse, AppError> {
    let requests = leave_service.list(&claims).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(requests)))
}

pub async fn approve_leave(
    leave_service: web::Data<LeaveService>,
    claims: Claims,
    path: web::Path<Uuid>,
    request: web::Json<DecisionInput>,
) -> Result<HttpResponse, AppError> {
    let updated = leave_service
        .approve(&claims, path.into_inner(), request.into_inner().admin_comment)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        Some(updated),
        "Leave request approved",
    )))
}

pub async fn reject_leave(
    leave_service: web::Data<LeaveService>,
    claims: Claims,
    path: web::Path<Uuid>,
    request: web::Json<DecisionInput>,
) -> Result<HttpResponse, AppError> {
    let updated = leave_service
        .reject(&claims, path.into_inner(), request.into_inner().admin_comment)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        Some(updated),
        "Leave request rejected",
    )))
}

pub async fn get_leave_balance(
    leave_service: web::Data<LeaveService>,
    claims: Claims,
    query: web::Query<BalanceQuery>,
) -> Result<HttpResponse, AppError> {
    let balances = leave_service
        .employee_balances(&claims, query.user_id, query.leave_type)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(balances)))
}

pub async fn allocate_leave(
    leave_service: web::Data<LeaveService>,
    claims: Claims,
    request: web::Json<LedgerAllocationInput>,
) -> Result<HttpResponse, AppError> {
    let entries = leave_service.allocate(&claims, request.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        Some(entries),
        "Ledger entries added",
    )))
}

pub async fn get_leave_ledger(
    leave_service: web::Data<LeaveService>,
    claims: Claims,
    query: web::Query<BalanceQuery>,
) -> Result<HttpResponse, AppError> {
    let entries = leave_service
        .ledger_entries(&claims, query.user_id, query.leave_type)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(entries)))
}

pub async fn get_employees(
    leave_service: web::Data<LeaveService>,
    claims: Claims,
) -> Result<HttpResponse, AppError> {
    let employees = leave_service.employees(&claims).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(employees)))
}
