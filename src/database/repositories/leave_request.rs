use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::database::models::{LeaveRequest, LeaveRequestRow, LeaveStatus, LeaveType};

#[derive(Clone)]
pub struct LeaveRequestRepository {
    pool: SqlitePool,
}

const REQUEST_COLUMNS: &str = r#"
    id,
    user_id,
    company_id,
    leave_type,
    start_date,
    end_date,
    remarks,
    status,
    admin_comment,
    created_at,
    updated_at
"#;

impl LeaveRequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        remarks: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<LeaveRequest> {
        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            INSERT INTO
                leave_requests (
                    id,
                    user_id,
                    company_id,
                    leave_type,
                    start_date,
                    end_date,
                    remarks,
                    status,
                    admin_comment,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(company_id)
        .bind(leave_type)
        .bind(start_date)
        .bind(end_date)
        .bind(remarks)
        .bind(LeaveStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<LeaveRequest>> {
        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Any PENDING or APPROVED request of the user whose inclusive range
    /// intersects [start, end], regardless of leave type.
    pub async fn find_overlapping(
        &self,
        user_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<LeaveRequest>> {
        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM leave_requests
            WHERE
                user_id = ?
                AND status IN ('PENDING', 'APPROVED')
                AND start_date <= ?
                AND end_date >= ?
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(end_date)
        .bind(start_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// The user's own PENDING requests, optionally narrowed to one leave
    /// type. Feeds the reservation side of the availability computation.
    pub async fn pending_for_user(
        &self,
        user_id: Uuid,
        leave_type: Option<LeaveType>,
    ) -> Result<Vec<LeaveRequest>> {
        let mut query = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE user_id = ? AND status = 'PENDING'"
        );
        if leave_type.is_some() {
            query.push_str(" AND leave_type = ?");
        }

        let mut prepared = sqlx::query_as::<_, LeaveRequest>(&query).bind(user_id);
        if let Some(leave_type) = leave_type {
            prepared = prepared.bind(leave_type);
        }

        let requests = prepared.fetch_all(&self.pool).await?;

        Ok(requests)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<LeaveRequest>> {
        let requests = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM leave_requests
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Company-wide requests with the employee name attached, newest first.
    pub async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<LeaveRequestRow>> {
        let requests = sqlx::query_as::<_, LeaveRequestRow>(
            r#"
            SELECT
                r.id,
                r.user_id,
                r.company_id,
                u.name AS employee_name,
                r.leave_type,
                r.start_date,
                r.end_date,
                r.remarks,
                r.status,
                r.admin_comment,
                r.created_at,
                r.updated_at
            FROM leave_requests r
            JOIN users u ON u.id = r.user_id
            WHERE r.company_id = ?
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Conditional state transition out of PENDING, inside the caller's
    /// transaction. Returns `None` when the row was already decided (the
    /// double-decision race): the `status = 'PENDING'` predicate is the
    /// guard, not a prior read.
    pub async fn decide_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        status: LeaveStatus,
        admin_comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<LeaveRequest>, sqlx::Error> {
        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            UPDATE leave_requests
            SET
                status = ?,
                admin_comment = ?,
                updated_at = ?
            WHERE
                id = ?
                AND status = 'PENDING'
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(status)
        .bind(admin_comment)
        .bind(now)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(request)
    }
}
