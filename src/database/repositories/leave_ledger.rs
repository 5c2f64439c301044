use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::database::models::{LeaveLedgerEntry, LeaveLedgerRow, LeaveType, LedgerReason};

/// Append-only journal of signed day counts. There is deliberately no
/// update or delete here: balances are always `SUM(change)`.
#[derive(Clone)]
pub struct LeaveLedgerRepository {
    pool: SqlitePool,
}

const LEDGER_COLUMNS: &str = r#"
    id,
    user_id,
    company_id,
    leave_type,
    change,
    reason,
    reference_id,
    created_at
"#;

const INSERT_LEDGER: &str = r#"
    INSERT INTO
        leave_ledger (id, user_id, company_id, leave_type, change, reason, reference_id, created_at)
    VALUES
        (?, ?, ?, ?, ?, ?, ?, ?)
    RETURNING
        id,
        user_id,
        company_id,
        leave_type,
        change,
        reason,
        reference_id,
        created_at
"#;

impl LeaveLedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn append(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        leave_type: LeaveType,
        change: i64,
        reason: LedgerReason,
        reference_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<LeaveLedgerEntry> {
        let entry = sqlx::query_as::<_, LeaveLedgerEntry>(INSERT_LEDGER)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(company_id)
            .bind(leave_type)
            .bind(change)
            .bind(reason)
            .bind(reference_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Append within the caller's transaction. The approval path uses this
    /// so the deduction commits or rolls back with the status transition.
    #[allow(clippy::too_many_arguments)]
    pub async fn append_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: Uuid,
        company_id: Uuid,
        leave_type: LeaveType,
        change: i64,
        reason: LedgerReason,
        reference_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<LeaveLedgerEntry, sqlx::Error> {
        let entry = sqlx::query_as::<_, LeaveLedgerEntry>(INSERT_LEDGER)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(company_id)
            .bind(leave_type)
            .bind(change)
            .bind(reason)
            .bind(reference_id)
            .bind(now)
            .fetch_one(&mut **tx)
            .await?;

        Ok(entry)
    }

    pub async fn balance(&self, user_id: Uuid, leave_type: LeaveType) -> Result<i64> {
        let balance: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(change), 0) FROM leave_ledger WHERE user_id = ? AND leave_type = ?",
        )
        .bind(user_id)
        .bind(leave_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(balance)
    }

    /// Per-type balances for one user, ledgered types only.
    pub async fn balances(&self, user_id: Uuid) -> Result<Vec<(LeaveType, i64)>> {
        let balances = sqlx::query_as::<_, (LeaveType, i64)>(
            r#"
            SELECT leave_type, COALESCE(SUM(change), 0)
            FROM leave_ledger
            WHERE user_id = ?
            GROUP BY leave_type
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(balances)
    }

    /// Company-scoped audit feed with employee names, newest first.
    pub async fn list_for_company(
        &self,
        company_id: Uuid,
        user_id: Option<Uuid>,
        leave_type: Option<LeaveType>,
    ) -> Result<Vec<LeaveLedgerRow>> {
        let mut query = r#"
            SELECT
                l.id,
                l.user_id,
                u.name AS employee_name,
                l.leave_type,
                l.change,
                l.reason,
                l.reference_id,
                l.created_at
            FROM leave_ledger l
            JOIN users u ON u.id = l.user_id
            WHERE l.company_id = ?
            "#
        .to_string();

        if user_id.is_some() {
            query.push_str(" AND l.user_id = ?");
        }
        if leave_type.is_some() {
            query.push_str(" AND l.leave_type = ?");
        }
        query.push_str(" ORDER BY l.created_at DESC");

        let mut prepared = sqlx::query_as::<_, LeaveLedgerRow>(&query).bind(company_id);
        if let Some(user_id) = user_id {
            prepared = prepared.bind(user_id);
        }
        if let Some(leave_type) = leave_type {
            prepared = prepared.bind(leave_type);
        }

        let entries = prepared.fetch_all(&self.pool).await?;

        Ok(entries)
    }

    pub async fn entries_for_reference(&self, reference_id: Uuid) -> Result<Vec<LeaveLedgerEntry>> {
        let entries = sqlx::query_as::<_, LeaveLedgerEntry>(&format!(
            "SELECT {LEDGER_COLUMNS} FROM leave_ledger WHERE reference_id = ? ORDER BY created_at ASC"
        ))
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
