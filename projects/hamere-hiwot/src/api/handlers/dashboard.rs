use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use crate::api::middleware::auth::AuthUser;
use crate::api::AppState;
use crate::db::models::attendance::attendance_rate;
use crate::db::models::class::Class;
use crate::db::models::member::MemberStatus;
use crate::error::AppResult;
use crate::i18n::translate;
use super::LangQuery;

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Query(q): Query<LangQuery>,
) -> AppResult<Json<Value>> {
    let members: Vec<(String, String)> = sqlx::query_as("SELECT grade, status FROM members")
        .fetch_all(&state.db)
        .await?;
    let members: Vec<(String, String)> = members
        .into_iter()
        .filter(|(grade, _)| principal.scope.admits(grade))
        .collect();

    let active = members
        .iter()
        .filter(|(_, status)| status == MemberStatus::Active.as_str())
        .count();
    let transferred = members
        .iter()
        .filter(|(_, status)| status == MemberStatus::Transferred.as_str())
        .count();

    let classes: Vec<Class> = Class::list(&state.db)
        .await?
        .into_iter()
        .filter(|c| principal.scope.admits(&c.id))
        .collect();

    let distribution: Vec<Value> = classes
        .iter()
        .map(|c| {
            let count = members.iter().filter(|(grade, _)| grade == &c.id).count();
            json!({
                "class_id": c.id,
                "name": translate(q.lang, &c.name),
                "members": count,
            })
        })
        .collect();

    let marks: Vec<(String, String)> = sqlx::query_as(
        "SELECT l.class_id, m.status FROM attendance_marks m
         JOIN attendance_logs l ON l.id = m.log_id"
    )
    .fetch_all(&state.db)
    .await?;
    let (present, total) = marks
        .iter()
        .filter(|(class_id, _)| principal.scope.admits(class_id))
        .fold((0i64, 0i64), |(p, t), (_, status)| {
            (p + i64::from(status == "present"), t + 1)
        });

    Ok(Json(json!({
        "total_members": members.len(),
        "active_members": active,
        "transferred_members": transferred,
        "total_classes": classes.len(),
        "class_distribution": distribution,
        "attendance_rate": attendance_rate(present, total),
    })))
}
