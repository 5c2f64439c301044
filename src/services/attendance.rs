use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

use crate::database::models::{
    hours_between, AttendanceEntry, AttendanceRecord, AttendanceStatus, AttendanceSummary,
    CheckInStatus,
};
use crate::database::repositories::attendance::EntryReportRow;
use crate::database::repositories::AttendanceRepository;
use crate::error::AppError;
use crate::services::auth::Claims;

/// The check-in/check-out engine plus its read side. Day state per
/// (user, date) moves through open/closed entry cycles; the store's
/// `(user_id, date)` unique constraint resolves concurrent first
/// check-ins, translated here into a conflict.
#[derive(Clone)]
pub struct AttendanceService {
    attendance_repository: AttendanceRepository,
    half_day_threshold_hours: f64,
}

impl AttendanceService {
    pub fn new(attendance_repository: AttendanceRepository, half_day_threshold_hours: f64) -> Self {
        Self {
            attendance_repository,
            half_day_threshold_hours,
        }
    }

    pub async fn check_in(
        &self,
        claims: &Claims,
        location: Option<String>,
        notes: Option<String>,
    ) -> Result<AttendanceEntry, AppError> {
        self.check_in_at(claims, Utc::now(), location, notes).await
    }

    /// Check in at an explicit instant. The calendar day is the UTC date
    /// of `now`.
    pub async fn check_in_at(
        &self,
        claims: &Claims,
        now: DateTime<Utc>,
        location: Option<String>,
        notes: Option<String>,
    ) -> Result<AttendanceEntry, AppError> {
        let today = now.date_naive();

        let attendance = match self
            .attendance_repository
            .find_day(claims.sub, today)
            .await?
        {
            Some(attendance) => {
                if self
                    .attendance_repository
                    .find_open_entry(attendance.id)
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict("Already checked in today".to_string()));
                }
                attendance
            }
            None => self
                .attendance_repository
                .create_day(claims.sub, claims.company_id, today, now)
                .await
                .map_err(|e| AppError::conflict_on_unique(e, "Already checked in today"))?,
        };

        let entry = self
            .attendance_repository
            .create_entry(&attendance, now, location, notes)
            .await?;

        log::info!("User {} checked in on {}", claims.sub, today);

        Ok(entry)
    }

    pub async fn check_out(
        &self,
        claims: &Claims,
        notes: Option<String>,
    ) -> Result<AttendanceEntry, AppError> {
        self.check_out_at(claims, Utc::now(), notes).await
    }

    pub async fn check_out_at(
        &self,
        claims: &Claims,
        now: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<AttendanceEntry, AppError> {
        let today = now.date_naive();

        let attendance = self
            .attendance_repository
            .find_day(claims.sub, today)
            .await?
            .ok_or_else(|| AppError::BadRequest("No check-in found for today".to_string()))?;

        let open_entry = self
            .attendance_repository
            .find_open_entry(attendance.id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(
                    "No open check-in found. You must check in before checking out.".to_string(),
                )
            })?;

        let duration = hours_between(open_entry.check_in, now);

        let (entry, attendance) = self
            .attendance_repository
            .close_entry(
                attendance.id,
                open_entry.id,
                now,
                duration,
                notes,
                self.half_day_threshold_hours,
            )
            .await?;

        log::info!(
            "User {} checked out on {}: {:.2}h this entry, {:.2}h total ({})",
            claims.sub,
            today,
            duration,
            attendance.total_hours.unwrap_or(0.0),
            attendance.status
        );

        Ok(entry)
    }

    pub async fn current_status(&self, claims: &Claims) -> Result<CheckInStatus, AppError> {
        self.current_status_at(claims, Utc::now()).await
    }

    pub async fn current_status_at(
        &self,
        claims: &Claims,
        now: DateTime<Utc>,
    ) -> Result<CheckInStatus, AppError> {
        let today = now.date_naive();

        let attendance = self
            .attendance_repository
            .find_day(claims.sub, today)
            .await?;

        let entries = match &attendance {
            Some(attendance) => self.attendance_repository.entries_desc(attendance.id).await?,
            None => Vec::new(),
        };

        Ok(CheckInStatus {
            has_checked_in: attendance.is_some(),
            is_currently_checked_in: entries.iter().any(|e| e.check_out.is_none()),
            last_entry: entries.first().cloned(),
            total_hours: attendance.and_then(|a| a.total_hours).unwrap_or(0.0),
        })
    }

    /// Attendance records in the caller's scope: an employee sees their
    /// own, HR sees the whole company. Date descending, then check-in
    /// descending.
    pub async fn attendance_records(
        &self,
        claims: &Claims,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let rows = if claims.is_hr() {
            self.attendance_repository
                .entry_rows_for_company(claims.company_id, from, to)
                .await?
        } else {
            self.attendance_repository
                .entry_rows_for_user(claims.sub, from, to)
                .await?
        };

        Ok(assemble_records(rows))
    }

    /// The caller's own records for one `YYYY-MM` month.
    pub async fn my_attendance(
        &self,
        claims: &Claims,
        month: &str,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let (from, to) = month_bounds(month)?;

        let rows = self
            .attendance_repository
            .entry_rows_for_user(claims.sub, Some(from), Some(to))
            .await?;

        Ok(assemble_records(rows))
    }

    /// All employees of the caller's company on one day. HR only;
    /// employee name ascending, then check-in ascending.
    pub async fn company_day(
        &self,
        claims: &Claims,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        if !claims.is_hr() {
            return Err(AppError::Forbidden(
                "Only HR can view all employees' attendance".to_string(),
            ));
        }

        let rows = self
            .attendance_repository
            .entry_rows_for_company_on(claims.company_id, date)
            .await?;

        Ok(assemble_records(rows))
    }

    /// Month aggregate for one user. Employees may only query themselves.
    pub async fn summary(
        &self,
        claims: &Claims,
        user_id: Uuid,
        month: &str,
    ) -> Result<AttendanceSummary, AppError> {
        if !claims.is_hr() && user_id != claims.sub {
            return Err(AppError::Forbidden(
                "Cannot view other users' summary".to_string(),
            ));
        }

        let (from, to) = month_bounds(month)?;

        let days = self
            .attendance_repository
            .days_in_range(user_id, from, to)
            .await?;

        let mut summary = AttendanceSummary {
            total_days: days.len() as i64,
            present: 0,
            absent: 0,
            half_day: 0,
            leave: 0,
            total_hours: 0.0,
        };

        for day in &days {
            match day.status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Absent => summary.absent += 1,
                AttendanceStatus::HalfDay => summary.half_day += 1,
                AttendanceStatus::Leave => summary.leave += 1,
            }
            summary.total_hours += day.total_hours.unwrap_or(0.0);
        }

        Ok(summary)
    }
}

/// Flatten report rows, filling the day aggregate from entry spans where
/// `total_hours` was never persisted (day still open). Input ordering is
/// preserved; the repository queries own the sort contracts.
fn assemble_records(rows: Vec<EntryReportRow>) -> Vec<AttendanceRecord> {
    let mut fallback_totals: HashMap<Uuid, f64> = HashMap::new();
    for row in &rows {
        *fallback_totals.entry(row.attendance_id).or_insert(0.0) += row.work_hours();
    }

    rows.into_iter()
        .map(|row| {
            let work_hours = row.work_hours();
            let total_hours = row
                .total_hours
                .unwrap_or_else(|| fallback_totals[&row.attendance_id]);
            AttendanceRecord {
                id: row.id,
                employee_name: row.employee_name,
                date: row.date,
                check_in: row.check_in,
                check_out: row.check_out,
                work_hours,
                total_hours,
            }
        })
        .collect()
}

/// First and last day of a `YYYY-MM` month.
fn month_bounds(month: &str) -> Result<(NaiveDate, NaiveDate), AppError> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid month, expected YYYY-MM".to_string()))?;

    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
    .ok_or_else(|| AppError::BadRequest("Invalid month, expected YYYY-MM".to_string()))?;

    let last = next_month.pred_opt().unwrap_or(first);

    Ok((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_covers_whole_month() {
        let (from, to) = month_bounds("2024-02").unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (from, to) = month_bounds("2024-12").unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn month_bounds_rejects_garbage() {
        assert!(month_bounds("March").is_err());
        assert!(month_bounds("2024-13").is_err());
    }
}
