use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use crate::api::middleware::auth::{AuthUser, Principal};
use crate::api::AppState;
use crate::calendar::format_ethiopian_str;
use crate::db::models::class::Class;
use crate::db::models::member::Member;
use crate::db::models::report::ClassReport;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::i18n::translate;
use super::{non_empty, normalize_date, today, LangQuery};

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub date: Option<String>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ClassTransferRequest {
    pub member_ids: Vec<i64>,
    pub to_class: String,
}

/// The class, if it exists and the caller's scope admits it.
pub async fn find_visible(db: &DbPool, principal: &Principal, id: &str) -> AppResult<Class> {
    Class::find(db, id)
        .await?
        .filter(|c| principal.scope.admits(&c.id))
        .ok_or_else(|| AppError::NotFound(format!("Class {} not found", id)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Query(q): Query<LangQuery>,
) -> AppResult<Json<Value>> {
    let counts: Vec<(String, i64)> = sqlx::query_as(
        "SELECT grade, COUNT(*) FROM members GROUP BY grade"
    )
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Value> = Class::list(&state.db)
        .await?
        .into_iter()
        .filter(|c| principal.scope.admits(&c.id))
        .map(|c| {
            let members = counts
                .iter()
                .find(|(grade, _)| grade == &c.id)
                .map(|(_, n)| *n)
                .unwrap_or(0);
            json!({
                "id": c.id,
                "name": translate(q.lang, &c.name),
                "teacher": c.teacher,
                "members": members,
            })
        })
        .collect();
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Query(q): Query<LangQuery>,
) -> AppResult<Json<Value>> {
    let class = find_visible(&state.db, &principal, &id).await?;
    let members: Vec<Value> = Member::list_by_grade(&state.db, &class.id)
        .await?
        .iter()
        .map(|m| m.to_json(q.lang))
        .collect();

    Ok(Json(json!({
        "id": class.id,
        "name": translate(q.lang, &class.name),
        "teacher": class.teacher,
        "members": members,
    })))
}

pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Query(q): Query<LangQuery>,
) -> AppResult<Json<Value>> {
    let class = find_visible(&state.db, &principal, &id).await?;
    let reports = sqlx::query_as::<_, ClassReport>(
        "SELECT id, class_id, date, submitted_by, content FROM class_reports
         WHERE class_id = ? ORDER BY date DESC, id DESC"
    )
    .bind(&class.id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Value> = reports
        .into_iter()
        .map(|r| {
            let ethiopian = format_ethiopian_str(&r.date, q.lang);
            json!({
                "id": r.id,
                "class_id": r.class_id,
                "date": r.date,
                "ethiopian_date": ethiopian,
                "submitted_by": r.submitted_by,
                "content": r.content,
            })
        })
        .collect();
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}

pub async fn create_report(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<CreateReportRequest>,
) -> AppResult<Json<Value>> {
    let class = find_visible(&state.db, &principal, &id).await?;
    let content = non_empty("content", &body.content)?;
    let date = match body.date.as_deref() {
        Some(d) => normalize_date("date", d)?,
        None => today(),
    };

    let report_id = sqlx::query(
        "INSERT INTO class_reports (class_id, date, submitted_by, content, created_at)
         VALUES (?, ?, ?, ?, ?)"
    )
    .bind(&class.id)
    .bind(&date)
    .bind(&principal.user.name)
    .bind(&content)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?
    .last_insert_rowid();

    tracing::info!("Class report {} submitted for {} by user {}", report_id, class.id, principal.user.id);

    Ok(Json(json!({
        "id": report_id,
        "class_id": class.id,
        "date": date,
        "submitted_by": principal.user.name,
        "content": content,
    })))
}

/// Transfer from the class page: every selected member must be in this class.
pub async fn transfer(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ClassTransferRequest>,
) -> AppResult<Json<Value>> {
    let class = find_visible(&state.db, &principal, &id).await?;
    for member_id in &body.member_ids {
        let in_class = Member::find(&state.db, *member_id)
            .await?
            .is_some_and(|m| m.grade == class.id);
        if !in_class {
            return Err(AppError::NotFound(format!("Member {} not found in {}", member_id, class.id)));
        }
    }

    let moved = super::members::transfer_members(
        &state.db,
        &principal,
        &body.member_ids,
        body.to_class.trim(),
    )
    .await?;
    let count = moved.len();
    Ok(Json(json!({ "data": moved, "total": count })))
}
