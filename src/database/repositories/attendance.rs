use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{Attendance, AttendanceEntry, AttendanceStatus};

/// One attendance entry joined with its day aggregate and the employee
/// name, as consumed by the reporting layer. `employee_name` is NULL for
/// self-scoped queries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntryReportRow {
    pub id: Uuid,
    pub attendance_id: Uuid,
    pub employee_name: Option<String>,
    pub date: NaiveDate,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub total_hours: Option<f64>,
}

impl EntryReportRow {
    /// Same fallback rule as `AttendanceEntry::work_hours`.
    pub fn work_hours(&self) -> f64 {
        match self.duration {
            Some(d) => d,
            None => match self.check_out {
                Some(out) => (out - self.check_in).num_milliseconds() as f64 / 3_600_000.0,
                None => 0.0,
            },
        }
    }
}

#[derive(Clone)]
pub struct AttendanceRepository {
    pool: SqlitePool,
}

const ENTRY_COLUMNS: &str = r#"
    id,
    attendance_id,
    user_id,
    company_id,
    check_in,
    check_out,
    duration,
    location,
    notes,
    created_at
"#;

const ATTENDANCE_COLUMNS: &str = r#"
    id,
    user_id,
    company_id,
    date,
    status,
    total_hours,
    created_at,
    updated_at
"#;

impl AttendanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_day(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<Attendance>> {
        let attendance = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? AND date = ?"
        ))
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attendance)
    }

    /// Create the lazy per-day row. A `(user_id, date)` unique violation is
    /// surfaced as-is so the caller can translate the race into a conflict.
    pub async fn create_day(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Attendance, sqlx::Error> {
        let attendance = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            INSERT INTO
                attendance (id, user_id, company_id, date, status, total_hours, created_at, updated_at)
            VALUES
                (?, ?, ?, ?, ?, NULL, ?, ?)
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(company_id)
        .bind(date)
        .bind(AttendanceStatus::Present)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(attendance)
    }

    /// The single open entry of the day, if any (most recent check-in
    /// first, matching the at-most-one-open invariant).
    pub async fn find_open_entry(&self, attendance_id: Uuid) -> Result<Option<AttendanceEntry>> {
        let entry = sqlx::query_as::<_, AttendanceEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM attendance_entries
            WHERE attendance_id = ? AND check_out IS NULL
            ORDER BY check_in DESC
            LIMIT 1
            "#
        ))
        .bind(attendance_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn create_entry(
        &self,
        attendance: &Attendance,
        check_in: DateTime<Utc>,
        location: Option<String>,
        notes: Option<String>,
    ) -> Result<AttendanceEntry> {
        let entry = sqlx::query_as::<_, AttendanceEntry>(&format!(
            r#"
            INSERT INTO
                attendance_entries (
                    id,
                    attendance_id,
                    user_id,
                    company_id,
                    check_in,
                    check_out,
                    duration,
                    location,
                    notes,
                    created_at
                )
            VALUES
                (?, ?, ?, ?, ?, NULL, NULL, ?, ?, ?)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(attendance.id)
        .bind(attendance.user_id)
        .bind(attendance.company_id)
        .bind(check_in)
        .bind(location)
        .bind(notes)
        .bind(check_in)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Close an open entry and recompute the day aggregate in one
    /// transaction: the day's `total_hours`/`status` are never left stale
    /// relative to the entry update.
    pub async fn close_entry(
        &self,
        attendance_id: Uuid,
        entry_id: Uuid,
        check_out: DateTime<Utc>,
        duration: f64,
        notes: Option<String>,
        half_day_threshold: f64,
    ) -> Result<(AttendanceEntry, Attendance)> {
        let mut tx = self.pool.begin().await?;

        let entry = sqlx::query_as::<_, AttendanceEntry>(&format!(
            r#"
            UPDATE attendance_entries
            SET
                check_out = ?,
                duration = ?,
                notes = COALESCE(?, notes)
            WHERE
                id = ?
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(check_out)
        .bind(duration)
        .bind(notes)
        .bind(entry_id)
        .fetch_one(&mut *tx)
        .await?;

        let total_hours: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(duration), 0) FROM attendance_entries WHERE attendance_id = ?",
        )
        .bind(attendance_id)
        .fetch_one(&mut *tx)
        .await?;

        let status = if total_hours < half_day_threshold {
            AttendanceStatus::HalfDay
        } else {
            AttendanceStatus::Present
        };

        let attendance = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            UPDATE attendance
            SET
                total_hours = ?,
                status = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(total_hours)
        .bind(status)
        .bind(check_out)
        .bind(attendance_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((entry, attendance))
    }

    /// Entries of one day, most recent check-in first.
    pub async fn entries_desc(&self, attendance_id: Uuid) -> Result<Vec<AttendanceEntry>> {
        let entries = sqlx::query_as::<_, AttendanceEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM attendance_entries
            WHERE attendance_id = ?
            ORDER BY check_in DESC
            "#
        ))
        .bind(attendance_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn days_in_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Attendance>> {
        let days = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendance
            WHERE user_id = ? AND date >= ? AND date <= ?
            ORDER BY date DESC
            "#
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(days)
    }

    /// Per-entry rows for one user, optionally bounded by dates. No name
    /// join: the caller is looking at their own records.
    pub async fn entry_rows_for_user(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<EntryReportRow>> {
        let mut query = r#"
            SELECT
                e.id,
                e.attendance_id,
                NULL AS employee_name,
                a.date,
                e.check_in,
                e.check_out,
                e.duration,
                a.total_hours
            FROM attendance_entries e
            JOIN attendance a ON a.id = e.attendance_id
            WHERE a.user_id = ?
            "#
        .to_string();

        if from.is_some() {
            query.push_str(" AND a.date >= ?");
        }
        if to.is_some() {
            query.push_str(" AND a.date <= ?");
        }
        query.push_str(" ORDER BY a.date DESC, e.check_in DESC");

        let mut prepared = sqlx::query_as::<_, EntryReportRow>(&query).bind(user_id);
        if let Some(from) = from {
            prepared = prepared.bind(from);
        }
        if let Some(to) = to {
            prepared = prepared.bind(to);
        }

        let rows = prepared.fetch_all(&self.pool).await?;

        Ok(rows)
    }

    /// Company-wide per-entry rows with employee names, date descending.
    pub async fn entry_rows_for_company(
        &self,
        company_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<EntryReportRow>> {
        let mut query = r#"
            SELECT
                e.id,
                e.attendance_id,
                u.name AS employee_name,
                a.date,
                e.check_in,
                e.check_out,
                e.duration,
                a.total_hours
            FROM attendance_entries e
            JOIN attendance a ON a.id = e.attendance_id
            JOIN users u ON u.id = a.user_id
            WHERE a.company_id = ?
            "#
        .to_string();

        if from.is_some() {
            query.push_str(" AND a.date >= ?");
        }
        if to.is_some() {
            query.push_str(" AND a.date <= ?");
        }
        query.push_str(" ORDER BY a.date DESC, e.check_in DESC");

        let mut prepared = sqlx::query_as::<_, EntryReportRow>(&query).bind(company_id);
        if let Some(from) = from {
            prepared = prepared.bind(from);
        }
        if let Some(to) = to {
            prepared = prepared.bind(to);
        }

        let rows = prepared.fetch_all(&self.pool).await?;

        Ok(rows)
    }

    /// All employees of one company on one day, name ascending then
    /// check-in ascending (the HR day-view contract).
    pub async fn entry_rows_for_company_on(
        &self,
        company_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<EntryReportRow>> {
        let rows = sqlx::query_as::<_, EntryReportRow>(
            r#"
            SELECT
                e.id,
                e.attendance_id,
                u.name AS employee_name,
                a.date,
                e.check_in,
                e.check_out,
                e.duration,
                a.total_hours
            FROM attendance_entries e
            JOIN attendance a ON a.id = e.attendance_id
            JOIN users u ON u.id = a.user_id
            WHERE a.company_id = ? AND a.date = ?
            ORDER BY u.name ASC, e.check_in ASC
            "#,
        )
        .bind(company_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
