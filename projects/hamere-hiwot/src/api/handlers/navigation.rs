use axum::{
    extract::{Path, Query},
    Json,
};
use serde_json::{json, Value};
use crate::api::middleware::auth::AuthUser;
use crate::auth::rbac::{is_allowed, navigation, Permission};
use crate::error::{AppError, AppResult};
use super::LangQuery;

/// Sidebar entries for the caller, in catalogue order.
pub async fn list(
    AuthUser(principal): AuthUser,
    Query(q): Query<LangQuery>,
) -> AppResult<Json<Value>> {
    let data = navigation(&principal.permissions, q.lang);
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}

/// Would the caller be let into the page guarded by `permission`?
pub async fn probe(
    AuthUser(principal): AuthUser,
    Path(permission): Path<String>,
) -> AppResult<Json<Value>> {
    let permission: Permission = permission.parse().map_err(AppError::Validation)?;
    Ok(Json(json!({
        "permission": permission,
        "allowed": is_allowed(&principal.permissions, permission),
    })))
}
