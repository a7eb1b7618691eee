use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AttendanceMark {
    pub member_id: i64,
    pub member_name: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceLog {
    pub id: i64,
    pub class_id: String,
    pub date: String,
    pub submitted_by: String,
    pub records: Vec<AttendanceMark>,
}

impl AttendanceLog {
    /// Logs for a class, newest first.
    pub async fn list_for_class(pool: &DbPool, class_id: &str) -> Result<Vec<AttendanceLog>, sqlx::Error> {
        let logs: Vec<(i64, String, String, String)> = sqlx::query_as(
            "SELECT id, class_id, date, submitted_by FROM attendance_logs
             WHERE class_id = ? ORDER BY date DESC"
        )
        .bind(class_id)
        .fetch_all(pool)
        .await?;

        let mut out = Vec::with_capacity(logs.len());
        for (id, class_id, date, submitted_by) in logs {
            let records = sqlx::query_as::<_, AttendanceMark>(
                "SELECT member_id, member_name, status FROM attendance_marks
                 WHERE log_id = ? ORDER BY member_name ASC"
            )
            .bind(id)
            .fetch_all(pool)
            .await?;
            out.push(AttendanceLog { id, class_id, date, submitted_by, records });
        }
        Ok(out)
    }
}

/// Present marks over all marks, as a percentage rounded to one decimal.
/// `None` when nothing has been recorded.
pub fn attendance_rate(present: i64, total: i64) -> Option<f64> {
    if total <= 0 {
        return None;
    }
    let rate = present as f64 / total as f64 * 100.0;
    Some((rate * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendance_rate() {
        assert_eq!(attendance_rate(0, 0), None);
        assert_eq!(attendance_rate(5, 6), Some(83.3));
        assert_eq!(attendance_rate(6, 6), Some(100.0));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let v = serde_json::to_value(AttendanceStatus::Present).unwrap();
        assert_eq!(v, serde_json::json!("present"));
    }
}
