use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    pub enum LeaveType {
        Paid => "PAID",
        Sick => "SICK",
        Unpaid => "UNPAID",
        Extra => "EXTRA",
    }
}

impl LeaveType {
    /// Types tracked by the ledger. UNPAID never appears in the ledger and
    /// its balance is defined as 0.
    pub const LEDGERED: [LeaveType; 3] = [LeaveType::Paid, LeaveType::Sick, LeaveType::Extra];

    pub fn is_ledgered(&self) -> bool {
        !matches!(self, LeaveType::Unpaid)
    }

    /// Types whose application is gated on available balance.
    pub fn is_balance_gated(&self) -> bool {
        matches!(self, LeaveType::Paid | LeaveType::Sick)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LeaveType::Paid => "Paid Time Off",
            LeaveType::Sick => "Sick Leave",
            LeaveType::Unpaid => "Unpaid Leave",
            LeaveType::Extra => "Extra Leave",
        }
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum LeaveStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum LedgerReason {
        Accrual => "ACCRUAL",
        LeaveApproved => "LEAVE_APPROVED",
        ManualAdjustment => "MANUAL_ADJUSTMENT",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub remarks: Option<String>,
    pub status: LeaveStatus,
    pub admin_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn days_requested(&self) -> i64 {
        inclusive_day_count(self.start_date, self.end_date)
    }
}

/// Leave request with the employee name attached, for HR views.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub remarks: Option<String>,
    pub status: LeaveStatus,
    pub admin_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LeaveRequest> for LeaveRequestRow {
    fn from(request: LeaveRequest) -> Self {
        LeaveRequestRow {
            id: request.id,
            user_id: request.user_id,
            company_id: request.company_id,
            employee_name: None,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            remarks: request.remarks,
            status: request.status,
            admin_comment: request.admin_comment,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLeaveInput {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionInput {
    pub admin_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaveLedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub leave_type: LeaveType,
    pub change: i64,
    pub reason: LedgerReason,
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Ledger entry with the employee name attached, for the HR feed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaveLedgerRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub employee_name: String,
    pub leave_type: LeaveType,
    pub change: i64,
    pub reason: LedgerReason,
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAllocationInput {
    pub user_ids: Vec<Uuid>,
    pub leave_type: LeaveType,
    pub change: i64,
    pub reason: LedgerReason,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
    pub leave_type: LeaveType,
    pub balance: i64,
    pub available_balance: i64,
    pub reserved: i64,
}

/// Payload returned alongside a balance-gated rejection so the caller can
/// offer a fallback instead of a blanket denial.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientBalancePayload {
    pub available_balance: i64,
    pub requested_days: i64,
    pub current_balance: i64,
    pub reserved_days: i64,
    pub suggested_leave_type: LeaveType,
}

/// End date minus start date in days, plus one: both endpoints count as
/// leave days.
pub fn inclusive_day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}
