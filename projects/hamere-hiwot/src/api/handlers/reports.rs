use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use crate::api::middleware::auth::AuthUser;
use crate::api::AppState;
use crate::calendar::format_ethiopian_str;
use crate::db::models::report::ClassReport;
use crate::error::AppResult;
use super::LangQuery;

/// Class reports across every class the caller can see, newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Query(q): Query<LangQuery>,
) -> AppResult<Json<Value>> {
    let reports = sqlx::query_as::<_, ClassReport>(
        "SELECT id, class_id, date, submitted_by, content FROM class_reports
         ORDER BY date DESC, id DESC"
    )
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Value> = reports
        .into_iter()
        .filter(|r| principal.scope.admits(&r.class_id))
        .map(|r| {
            json!({
                "id": r.id,
                "class_id": r.class_id,
                "date": r.date,
                "ethiopian_date": format_ethiopian_str(&r.date, q.lang),
                "submitted_by": r.submitted_by,
                "content": r.content,
            })
        })
        .collect();
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}
