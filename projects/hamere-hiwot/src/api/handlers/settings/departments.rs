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
use crate::db::models::department::{Department, SECRETARIAT};
use crate::db::models::role::slugify;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct DepartmentRequest {
    pub name: String,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Json(body): Json<DepartmentRequest>,
) -> AppResult<Json<Value>> {
    let name = non_empty("name", &body.name)?;
    let id = slugify(&name);

    if Department::find(&state.db, &id).await?.is_some() {
        return Err(AppError::Conflict(format!("Department '{}' already exists", id)));
    }

    sqlx::query("INSERT INTO departments (id, name, created_at) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(&name)
        .bind(Utc::now().to_rfc3339())
        .execute(&state.db)
        .await?;

    tracing::info!("Department {} created by user {}", id, principal.user.id);
    Ok(Json(serde_json::to_value(Department { id, name })?))
}

/// Renames a department. Its id, and so its reports, stay the same.
pub async fn update(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<DepartmentRequest>,
) -> AppResult<Json<Value>> {
    let name = non_empty("name", &body.name)?;
    let result = sqlx::query("UPDATE departments SET name = ? WHERE id = ?")
        .bind(&name)
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Department {} not found", id)));
    }

    tracing::info!("Department {} renamed by user {}", id, principal.user.id);
    Ok(Json(serde_json::to_value(Department { id, name })?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    if id == SECRETARIAT {
        return Err(AppError::Validation("The secretariat cannot be deleted".to_string()));
    }
    let result = sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Department {} not found", id)));
    }

    tracing::info!("Department {} deleted by user {}", id, principal.user.id);
    Ok(Json(json!({"success": true})))
}
