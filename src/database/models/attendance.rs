use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum AttendanceStatus {
        Present => "PRESENT",
        Absent => "ABSENT",
        HalfDay => "HALF_DAY",
        Leave => "LEAVE",
    }
}

/// Daily record for one user summarizing all check-in/out cycles.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub total_hours: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One check-in/check-out cycle. `check_out = None` means the entry is
/// still open; a day never has more than one open entry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub id: Uuid,
    pub attendance_id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AttendanceEntry {
    /// Fractional work hours of this cycle. Falls back to the raw
    /// check-in/check-out span when `duration` was never populated; an
    /// open entry contributes 0.
    pub fn work_hours(&self) -> f64 {
        match self.duration {
            Some(d) => d,
            None => match self.check_out {
                Some(out) => hours_between(self.check_in, out),
                None => 0.0,
            },
        }
    }
}

pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}

#[derive(Debug, Deserialize)]
pub struct CheckInInput {
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckOutInput {
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInStatus {
    pub has_checked_in: bool,
    pub is_currently_checked_in: bool,
    pub last_entry: Option<AttendanceEntry>,
    pub total_hours: f64,
}

/// Flat reporting row: one per entry, carrying the day's shared aggregate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    pub date: NaiveDate,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    pub work_hours: f64,
    pub total_hours: f64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total_days: i64,
    pub present: i64,
    pub absent: i64,
    pub half_day: i64,
    pub leave: i64,
    pub total_hours: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(check_in: DateTime<Utc>, check_out: Option<DateTime<Utc>>, duration: Option<f64>) -> AttendanceEntry {
        AttendanceEntry {
            id: Uuid::new_v4(),
            attendance_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            check_in,
            check_out,
            duration,
            location: None,
            notes: None,
            created_at: check_in,
        }
    }

    #[test]
    fn work_hours_prefers_stored_duration() {
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 10, 17, 0, 0).unwrap();
        let e = entry(start, Some(end), Some(7.5));
        assert_eq!(e.work_hours(), 7.5);
    }

    #[test]
    fn work_hours_falls_back_to_span() {
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 10, 12, 30, 0).unwrap();
        let e = entry(start, Some(end), None);
        assert_eq!(e.work_hours(), 3.5);
    }

    #[test]
    fn open_entry_contributes_zero() {
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let e = entry(start, None, None);
        assert_eq!(e.work_hours(), 0.0);
    }
}
