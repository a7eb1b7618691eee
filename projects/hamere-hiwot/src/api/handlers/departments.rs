use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use crate::api::middleware::auth::AuthUser;
use crate::api::AppState;
use crate::calendar::format_ethiopian_str;
use crate::db::models::department::{Department, DepartmentReport, DepartmentReportRow, SECRETARIAT};
use crate::error::{AppError, AppResult};
use super::{normalize_date, today, LangQuery};

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentReportRequest {
    pub date: Option<String>,
    pub content: Option<String>,
    pub attachment_name: Option<String>,
    #[serde(default)]
    pub recipient_department_ids: Vec<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> AppResult<Json<Value>> {
    let data = Department::list(&state.db).await?;
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}

async fn require_department(state: &AppState, id: &str) -> AppResult<Department> {
    Department::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Department {} not found", id)))
}

/// Reports authored by or addressed to the department.
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
    Query(q): Query<LangQuery>,
) -> AppResult<Json<Value>> {
    let department = require_department(&state, &id).await?;
    let rows = sqlx::query_as::<_, DepartmentReportRow>(
        "SELECT id, department_id, date, submitted_by, content, attachment_name, recipients
         FROM department_reports ORDER BY date DESC, id DESC"
    )
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Value> = rows
        .into_iter()
        .map(DepartmentReport::from)
        .filter(|r| r.visible_to(&department.id))
        .map(|r| {
            let direction = if r.department_id == department.id { "sent" } else { "received" };
            let ethiopian = format_ethiopian_str(&r.date, q.lang);
            let mut v = serde_json::to_value(&r).unwrap_or_default();
            if let Some(obj) = v.as_object_mut() {
                obj.insert("ethiopian_date".to_string(), json!(ethiopian));
                obj.insert("direction".to_string(), json!(direction));
            }
            v
        })
        .collect();
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}

pub async fn create_report(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<CreateDepartmentReportRequest>,
) -> AppResult<Json<Value>> {
    let department = require_department(&state, &id).await?;
    if department.id == SECRETARIAT {
        return Err(AppError::Validation("The secretariat receives reports and does not submit them".to_string()));
    }

    let content = body.content.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let attachment = body.attachment_name.as_deref().map(str::trim).filter(|a| !a.is_empty());
    if content.is_none() && attachment.is_none() {
        return Err(AppError::Validation("A report needs content or an attachment".to_string()));
    }

    let known: BTreeSet<String> = Department::list(&state.db)
        .await?
        .into_iter()
        .map(|d| d.id)
        .collect();
    let mut recipients: Vec<String> = Vec::new();
    for r in &body.recipient_department_ids {
        if r == &department.id || r == SECRETARIAT {
            return Err(AppError::Validation(format!("{} cannot be a recipient", r)));
        }
        if !known.contains(r) {
            return Err(AppError::Validation(format!("Unknown department: {}", r)));
        }
        if !recipients.contains(r) {
            recipients.push(r.clone());
        }
    }

    let date = match body.date.as_deref() {
        Some(d) => normalize_date("date", d)?,
        None => today(),
    };

    let report_id = sqlx::query(
        "INSERT INTO department_reports (department_id, date, submitted_by, content, attachment_name, recipients, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&department.id)
    .bind(&date)
    .bind(&principal.user.name)
    .bind(content)
    .bind(attachment)
    .bind(serde_json::to_string(&recipients)?)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?
    .last_insert_rowid();

    tracing::info!(
        "Department report {} from {} to {} recipients by user {}",
        report_id,
        department.id,
        recipients.len(),
        principal.user.id
    );

    let report = DepartmentReport {
        id: report_id,
        department_id: department.id,
        date,
        submitted_by: principal.user.name,
        content: content.map(str::to_string),
        attachment_name: attachment.map(str::to_string),
        recipient_department_ids: recipients,
    };
    Ok(Json(serde_json::to_value(report)?))
}
