use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{
    inclusive_day_count, ApplyLeaveInput, InsufficientBalancePayload, LeaveBalance,
    LeaveLedgerEntry, LeaveLedgerRow, LeaveRequest, LeaveRequestRow, LeaveStatus, LeaveType,
    LedgerAllocationInput, LedgerReason, UserSummary,
};
use crate::database::repositories::{
    LeaveLedgerRepository, LeaveRequestRepository, UserRepository,
};
use crate::error::AppError;
use crate::services::auth::Claims;

/// Leave request workflow and balance ledger. The request state machine is
/// PENDING -> APPROVED | REJECTED, both terminal; approval and its ledger
/// deduction commit in a single transaction.
#[derive(Clone)]
pub struct LeaveService {
    pool: SqlitePool,
    leave_requests: LeaveRequestRepository,
    ledger: LeaveLedgerRepository,
    users: UserRepository,
}

impl LeaveService {
    pub fn new(
        pool: SqlitePool,
        leave_requests: LeaveRequestRepository,
        ledger: LeaveLedgerRepository,
        users: UserRepository,
    ) -> Self {
        Self {
            pool,
            leave_requests,
            ledger,
            users,
        }
    }

    pub async fn apply(
        &self,
        claims: &Claims,
        input: ApplyLeaveInput,
    ) -> Result<LeaveRequest, AppError> {
        self.apply_on(claims, Utc::now().date_naive(), input).await
    }

    /// Apply with an explicit "today" so backdating rules are
    /// deterministic under test.
    pub async fn apply_on(
        &self,
        claims: &Claims,
        today: NaiveDate,
        input: ApplyLeaveInput,
    ) -> Result<LeaveRequest, AppError> {
        if !claims.is_employee() {
            return Err(AppError::Forbidden(
                "Only employees can apply for leave".to_string(),
            ));
        }

        if input.start_date > input.end_date {
            return Err(AppError::BadRequest(
                "Start date must be before or equal to end date".to_string(),
            ));
        }

        if input.start_date < today {
            return Err(AppError::BadRequest(
                "Start date must be today or in the future".to_string(),
            ));
        }

        if self
            .leave_requests
            .find_overlapping(claims.sub, input.start_date, input.end_date)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "You already have an approved or pending leave request for this date range"
                    .to_string(),
            ));
        }

        let days_requested = inclusive_day_count(input.start_date, input.end_date);

        if input.leave_type.is_balance_gated() {
            self.check_availability(claims.sub, input.leave_type, days_requested)
                .await?;
        }

        let request = self
            .leave_requests
            .create(
                claims.sub,
                claims.company_id,
                input.leave_type,
                input.start_date,
                input.end_date,
                input.remarks,
                Utc::now(),
            )
            .await?;

        log::info!(
            "User {} applied for {} {} leave day(s) ({} to {})",
            claims.sub,
            days_requested,
            request.leave_type,
            request.start_date,
            request.end_date
        );

        Ok(request)
    }

    /// Reservation-aware availability: balance minus the day spans of the
    /// user's own pending requests of the same type. A read-time check
    /// only; nothing is locked between here and request creation.
    async fn check_availability(
        &self,
        user_id: Uuid,
        leave_type: LeaveType,
        days_requested: i64,
    ) -> Result<(), AppError> {
        let current_balance = self.ledger.balance(user_id, leave_type).await?;

        let reserved_days: i64 = self
            .leave_requests
            .pending_for_user(user_id, Some(leave_type))
            .await?
            .iter()
            .map(|r| r.days_requested())
            .sum();

        let available_balance = current_balance - reserved_days;

        if available_balance < days_requested {
            let message = format!(
                "Insufficient {} balance. You have {} day(s) available ({} total, {} pending), \
                 but you requested {} day(s). Please consider applying for Unpaid Leave instead.",
                leave_type.display_name(),
                available_balance,
                current_balance,
                reserved_days,
                days_requested
            );
            return Err(AppError::InsufficientBalance {
                message,
                payload: InsufficientBalancePayload {
                    available_balance,
                    requested_days: days_requested,
                    current_balance,
                    reserved_days,
                    suggested_leave_type: LeaveType::Unpaid,
                },
            });
        }

        Ok(())
    }

    /// Approve a pending request and append its ledger deduction,
    /// all-or-nothing.
    pub async fn approve(
        &self,
        claims: &Claims,
        request_id: Uuid,
        admin_comment: Option<String>,
    ) -> Result<LeaveRequest, AppError> {
        if !claims.is_hr() {
            return Err(AppError::Forbidden(
                "Only HR can approve leave requests".to_string(),
            ));
        }

        let request = self
            .leave_requests
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;

        if request.status != LeaveStatus::Pending {
            return Err(already_decided(request.status));
        }

        let days = request.days_requested();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // Conditional transition: a concurrent decision makes this a no-op
        // and the whole transaction is abandoned.
        let updated = self
            .leave_requests
            .decide_in_tx(&mut tx, request_id, LeaveStatus::Approved, admin_comment, now)
            .await?
            .ok_or_else(lost_decision_race)?;

        if request.leave_type.is_ledgered() {
            self.ledger
                .append_in_tx(
                    &mut tx,
                    request.user_id,
                    request.company_id,
                    request.leave_type,
                    -days,
                    LedgerReason::LeaveApproved,
                    Some(request_id),
                    now,
                )
                .await?;
        }

        tx.commit().await?;

        log::info!(
            "Leave request {} approved by {}: {} day(s) of {} deducted for user {}",
            request_id,
            claims.sub,
            days,
            request.leave_type,
            request.user_id
        );

        Ok(updated)
    }

    /// Reject a pending request. The admin comment is mandatory; there is
    /// no ledger effect.
    pub async fn reject(
        &self,
        claims: &Claims,
        request_id: Uuid,
        admin_comment: Option<String>,
    ) -> Result<LeaveRequest, AppError> {
        if !claims.is_hr() {
            return Err(AppError::Forbidden(
                "Only HR can reject leave requests".to_string(),
            ));
        }

        let admin_comment = admin_comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest("Admin comment is required for rejection".to_string())
            })?;

        let request = self
            .leave_requests
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;

        if request.status != LeaveStatus::Pending {
            return Err(already_decided(request.status));
        }

        let mut tx = self.pool.begin().await?;

        let updated = self
            .leave_requests
            .decide_in_tx(
                &mut tx,
                request_id,
                LeaveStatus::Rejected,
                Some(admin_comment),
                Utc::now(),
            )
            .await?
            .ok_or_else(lost_decision_race)?;

        tx.commit().await?;

        log::info!("Leave request {} rejected by {}", request_id, claims.sub);

        Ok(updated)
    }

    /// Requests in the caller's scope: an employee sees their own, HR the
    /// whole company with employee names. Newest first.
    pub async fn list(&self, claims: &Claims) -> Result<Vec<LeaveRequestRow>, AppError> {
        let rows = if claims.is_hr() {
            self.leave_requests.list_for_company(claims.company_id).await?
        } else {
            self.leave_requests
                .list_for_user(claims.sub)
                .await?
                .into_iter()
                .map(LeaveRequestRow::from)
                .collect()
        };

        Ok(rows)
    }

    /// Balance view for one type or a breakdown over the ledgered types.
    /// Employees may only query themselves.
    pub async fn employee_balances(
        &self,
        claims: &Claims,
        user_id: Option<Uuid>,
        leave_type: Option<LeaveType>,
    ) -> Result<Vec<LeaveBalance>, AppError> {
        let target = user_id.unwrap_or(claims.sub);

        if claims.is_employee() && target != claims.sub {
            return Err(AppError::Forbidden(
                "Cannot view other users' leave balance".to_string(),
            ));
        }

        match leave_type {
            Some(leave_type) => {
                let reserved: i64 = self
                    .leave_requests
                    .pending_for_user(target, Some(leave_type))
                    .await?
                    .iter()
                    .map(|r| r.days_requested())
                    .sum();

                // UNPAID is untracked: balance and availability are defined
                // as 0, only the reservation count is reported.
                let (balance, available_balance) = if leave_type.is_ledgered() {
                    let balance = self.ledger.balance(target, leave_type).await?;
                    (balance, balance - reserved)
                } else {
                    (0, 0)
                };

                Ok(vec![LeaveBalance {
                    leave_type,
                    balance,
                    available_balance,
                    reserved,
                }])
            }
            None => {
                let sums = self.ledger.balances(target).await?;
                let pending = self.leave_requests.pending_for_user(target, None).await?;

                let balances = LeaveType::LEDGERED
                    .iter()
                    .map(|&leave_type| {
                        let balance = sums
                            .iter()
                            .find(|(t, _)| *t == leave_type)
                            .map(|(_, sum)| *sum)
                            .unwrap_or(0);
                        let reserved: i64 = pending
                            .iter()
                            .filter(|r| r.leave_type == leave_type)
                            .map(|r| r.days_requested())
                            .sum();
                        LeaveBalance {
                            leave_type,
                            balance,
                            available_balance: balance - reserved,
                            reserved,
                        }
                    })
                    .collect();

                Ok(balances)
            }
        }
    }

    /// Manual ledger allocation: one entry per selected employee, HR only.
    pub async fn allocate(
        &self,
        claims: &Claims,
        input: LedgerAllocationInput,
    ) -> Result<Vec<LeaveLedgerEntry>, AppError> {
        if !claims.is_hr() {
            return Err(AppError::Forbidden(
                "Only HR can add leave ledger entries".to_string(),
            ));
        }

        if input.user_ids.is_empty() {
            return Err(AppError::BadRequest(
                "At least one employee must be selected".to_string(),
            ));
        }

        if input.change == 0 {
            return Err(AppError::BadRequest(
                "Change must be a non-zero number of days".to_string(),
            ));
        }

        if !input.leave_type.is_ledgered() {
            return Err(AppError::BadRequest(
                "Unpaid leave is not tracked and cannot be allocated".to_string(),
            ));
        }

        if input.reason == LedgerReason::LeaveApproved {
            return Err(AppError::BadRequest(
                "LEAVE_APPROVED entries are created by leave approval only".to_string(),
            ));
        }

        let valid_count = self
            .users
            .count_company_employees(claims.company_id, &input.user_ids)
            .await?;
        if valid_count != input.user_ids.len() as i64 {
            return Err(AppError::BadRequest(
                "Some selected employees are invalid or don't belong to your company".to_string(),
            ));
        }

        let now = Utc::now();
        let mut entries = Vec::with_capacity(input.user_ids.len());
        for user_id in &input.user_ids {
            let entry = self
                .ledger
                .append(
                    *user_id,
                    claims.company_id,
                    input.leave_type,
                    input.change,
                    input.reason,
                    None,
                    now,
                )
                .await?;
            entries.push(entry);
        }

        log::info!(
            "{} {} day(s) of {} for {} employee(s) by {}",
            if input.change > 0 { "Allocated" } else { "Deducted" },
            input.change.abs(),
            input.leave_type,
            entries.len(),
            claims.sub
        );

        Ok(entries)
    }

    /// Company-scoped ledger feed. HR only.
    pub async fn ledger_entries(
        &self,
        claims: &Claims,
        user_id: Option<Uuid>,
        leave_type: Option<LeaveType>,
    ) -> Result<Vec<LeaveLedgerRow>, AppError> {
        if !claims.is_hr() {
            return Err(AppError::Forbidden(
                "Only HR can view the leave ledger".to_string(),
            ));
        }

        let entries = self
            .ledger
            .list_for_company(claims.company_id, user_id, leave_type)
            .await?;

        Ok(entries)
    }

    /// EMPLOYEE users of the caller's company. HR only.
    pub async fn employees(&self, claims: &Claims) -> Result<Vec<UserSummary>, AppError> {
        if !claims.is_hr() {
            return Err(AppError::Forbidden(
                "Only HR can view employees".to_string(),
            ));
        }

        let employees = self.users.company_employees(claims.company_id).await?;

        Ok(employees)
    }
}

fn already_decided(status: LeaveStatus) -> AppError {
    AppError::Conflict(format!(
        "Leave request is already {}",
        status.to_string().to_lowercase()
    ))
}

/// The pre-read saw PENDING but the conditional update matched nothing,
/// so another decision landed in between.
fn lost_decision_race() -> AppError {
    AppError::Conflict("Leave request was already decided".to_string())
}
