use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use crate::api::middleware::auth::AuthUser;
use crate::api::AppState;
use crate::calendar::format_ethiopian_str;
use crate::db::models::attendance::{AttendanceLog, AttendanceStatus};
use crate::db::models::member::Member;
use crate::error::{AppError, AppResult};
use crate::i18n::translate;
use super::classes::find_visible;
use super::{csv_attachment, normalize_date, today, LangQuery};

#[derive(Debug, Deserialize)]
pub struct SubmitAttendanceRequest {
    pub date: Option<String>,
    /// member id → status; ids arrive as JSON object keys.
    pub marks: HashMap<String, AttendanceStatus>,
}

fn log_json(log: &AttendanceLog, lang: crate::i18n::Language) -> Value {
    let present = log
        .records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present.as_str())
        .count();
    json!({
        "id": log.id,
        "class_id": log.class_id,
        "date": log.date,
        "ethiopian_date": format_ethiopian_str(&log.date, lang),
        "submitted_by": log.submitted_by,
        "present": present,
        "total": log.records.len(),
        "records": log.records,
    })
}

/// Records one class day. Members without a mark are stored absent, and a
/// second submission for the same day replaces the first.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<SubmitAttendanceRequest>,
) -> AppResult<Json<Value>> {
    let class = find_visible(&state.db, &principal, &id).await?;
    if body.marks.is_empty() {
        return Err(AppError::Validation("Mark at least one member".to_string()));
    }
    let date = match body.date.as_deref() {
        Some(d) => normalize_date("date", d)?,
        None => today(),
    };

    let mut marks: HashMap<i64, AttendanceStatus> = HashMap::with_capacity(body.marks.len());
    for (key, status) in &body.marks {
        let member_id: i64 = key
            .parse()
            .map_err(|_| AppError::Validation(format!("Invalid member id: {}", key)))?;
        marks.insert(member_id, *status);
    }

    let roster = Member::list_by_grade(&state.db, &class.id).await?;
    if let Some(stranger) = marks.keys().find(|mid| !roster.iter().any(|m| m.id == **mid)) {
        return Err(AppError::Validation(format!("Member {} is not in {}", stranger, class.id)));
    }

    sqlx::query("DELETE FROM attendance_logs WHERE class_id = ? AND date = ?")
        .bind(&class.id)
        .bind(&date)
        .execute(&state.db)
        .await?;

    let log_id = sqlx::query(
        "INSERT INTO attendance_logs (class_id, date, submitted_by) VALUES (?, ?, ?)"
    )
    .bind(&class.id)
    .bind(&date)
    .bind(&principal.user.name)
    .execute(&state.db)
    .await?
    .last_insert_rowid();

    for member in &roster {
        let status = marks.get(&member.id).copied().unwrap_or(AttendanceStatus::Absent);
        sqlx::query(
            "INSERT INTO attendance_marks (log_id, member_id, member_name, status) VALUES (?, ?, ?, ?)"
        )
        .bind(log_id)
        .bind(member.id)
        .bind(&member.name)
        .bind(status.as_str())
        .execute(&state.db)
        .await?;
    }

    tracing::info!(
        "Attendance for {} on {} recorded by user {} ({} members)",
        class.id,
        date,
        principal.user.id,
        roster.len()
    );

    let logs = AttendanceLog::list_for_class(&state.db, &class.id).await?;
    let log = logs
        .iter()
        .find(|l| l.id == log_id)
        .ok_or_else(|| AppError::Internal("Attendance log vanished".to_string()))?;
    Ok(Json(log_json(log, Default::default())))
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Query(q): Query<LangQuery>,
) -> AppResult<Json<Value>> {
    let class = find_visible(&state.db, &principal, &id).await?;
    let data: Vec<Value> = AttendanceLog::list_for_class(&state.db, &class.id)
        .await?
        .iter()
        .map(|l| log_json(l, q.lang))
        .collect();
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}

/// CSV of the most recent attendance log.
pub async fn export(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Query(q): Query<LangQuery>,
) -> AppResult<Response> {
    let class = find_visible(&state.db, &principal, &id).await?;
    let logs = AttendanceLog::list_for_class(&state.db, &class.id).await?;
    let latest = logs
        .first()
        .ok_or_else(|| AppError::NotFound(format!("No attendance recorded for {}", class.id)))?;

    let rows: Vec<Vec<String>> = latest
        .records
        .iter()
        .map(|r| {
            vec![
                r.member_id.to_string(),
                r.member_name.clone(),
                translate(q.lang, &r.status).to_string(),
            ]
        })
        .collect();
    csv_attachment(
        &format!("attendance-{}-{}.csv", class.id, latest.date),
        &["MemberID", "Name", "Status"],
        rows,
    )
}
