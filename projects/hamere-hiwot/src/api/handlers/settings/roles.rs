use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::handlers::non_empty;
use crate::api::middleware::auth::AuthUser;
use crate::api::AppState;
use crate::auth::rbac::PermissionSet;
use crate::db::models::role::{slugify, Role};
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub name: String,
    pub permissions: Vec<String>,
    #[serde(default)]
    pub class_scoped: bool,
}

fn parse_permissions(tags: &[String]) -> AppResult<PermissionSet> {
    let permissions = PermissionSet::parse(tags).map_err(AppError::Validation)?;
    if permissions.is_empty() {
        return Err(AppError::Validation("At least one permission is required".to_string()));
    }
    Ok(permissions)
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> AppResult<Json<Value>> {
    let data = Role::list(&state.db).await?;
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Json(body): Json<RoleRequest>,
) -> AppResult<Json<Value>> {
    let name = non_empty("name", &body.name)?;
    let permissions = parse_permissions(&body.permissions)?;
    let id = slugify(&name);

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM roles WHERE id = ? OR name = ?")
        .bind(&id)
        .bind(&name)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!("Role '{}' already exists", name)));
    }

    sqlx::query(
        "INSERT INTO roles (id, name, permissions, class_scoped, created_at) VALUES (?, ?, ?, ?, ?)"
    )
    .bind(&id)
    .bind(&name)
    .bind(serde_json::to_string(&permissions)?)
    .bind(body.class_scoped)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    tracing::info!("Role {} created by user {}", id, principal.user.id);

    let role = Role { id, name, permissions, class_scoped: body.class_scoped };
    Ok(Json(serde_json::to_value(role)?))
}

/// Renaming a role carries its users along to the new name.
pub async fn update(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<RoleRequest>,
) -> AppResult<Json<Value>> {
    let existing = Role::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))?;
    let name = non_empty("name", &body.name)?;
    let permissions = parse_permissions(&body.permissions)?;

    let clash: Option<(String,)> = sqlx::query_as("SELECT id FROM roles WHERE name = ? AND id != ?")
        .bind(&name)
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;
    if clash.is_some() {
        return Err(AppError::Conflict(format!("Role '{}' already exists", name)));
    }

    sqlx::query("UPDATE roles SET name = ?, permissions = ?, class_scoped = ? WHERE id = ?")
        .bind(&name)
        .bind(serde_json::to_string(&permissions)?)
        .bind(body.class_scoped)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if existing.name != name {
        let moved = sqlx::query("UPDATE users SET role = ? WHERE role = ?")
            .bind(&name)
            .bind(&existing.name)
            .execute(&state.db)
            .await?
            .rows_affected();
        tracing::info!("Role {} renamed {:?} -> {:?} ({} users)", id, existing.name, name, moved);
    }

    tracing::info!("Role {} updated by user {}", id, principal.user.id);

    let role = Role { id, name, permissions, class_scoped: body.class_scoped };
    Ok(Json(serde_json::to_value(role)?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let role = Role::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))?;

    let (in_use,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
        .bind(&role.name)
        .fetch_one(&state.db)
        .await?;
    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Role '{}' is assigned to {} user(s)",
            role.name, in_use
        )));
    }

    sqlx::query("DELETE FROM roles WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    tracing::info!("Role {} deleted by user {}", id, principal.user.id);
    Ok(Json(json!({"success": true})))
}
