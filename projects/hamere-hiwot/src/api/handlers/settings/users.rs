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
use crate::api::validators::password::MIN_PASSWORD_LEN;
use crate::api::validators::{EmailValidator, PasswordPolicy, Validator};
use crate::api::AppState;
use crate::auth::password;
use crate::auth::rbac::Permission;
use crate::db::models::class::Class;
use crate::db::models::role::Role;
use crate::db::models::user::User;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    #[serde(default)]
    pub assigned_classes: Vec<String>,
    pub initial_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    #[serde(default)]
    pub assigned_classes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
    pub confirm_password: String,
}

struct ValidUser {
    name: String,
    email: String,
    phone: String,
    role: String,
    assigned_classes: Vec<String>,
}

/// Shared checks for create and update. `existing_id` is the user being
/// edited, so their own phone does not count as taken.
async fn validate_user(
    db: &DbPool,
    name: &str,
    email: &str,
    phone: &str,
    role: &str,
    assigned_classes: &[String],
    existing_id: Option<i64>,
) -> AppResult<ValidUser> {
    let name = non_empty("name", name)?;
    EmailValidator::new().validate(email)?;
    let phone = non_empty("phone", phone)?;

    let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE phone = ?")
        .bind(&phone)
        .fetch_optional(db)
        .await?;
    if let Some((id,)) = taken {
        if Some(id) != existing_id {
            return Err(AppError::Conflict(format!("Phone {} is already registered", phone)));
        }
    }

    let role = Role::find_by_name(db, role.trim())
        .await?
        .ok_or_else(|| AppError::Validation(format!("Unknown role: {}", role)))?;

    // Class assignments only mean something for roles that can open classes.
    let assigned_classes = if role.permissions.contains(Permission::Classes) {
        let known = Class::ids(db).await?;
        let mut kept: Vec<String> = Vec::new();
        for c in assigned_classes {
            if !known.contains(c) {
                return Err(AppError::Validation(format!("Unknown class: {}", c)));
            }
            if !kept.contains(c) {
                kept.push(c.clone());
            }
        }
        kept
    } else {
        Vec::new()
    };

    Ok(ValidUser {
        name,
        email: email.trim().to_string(),
        phone,
        role: role.name,
        assigned_classes,
    })
}

async fn require_user(db: &DbPool, id: i64) -> AppResult<User> {
    User::find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> AppResult<Json<Value>> {
    let data: Vec<Value> = User::list(&state.db)
        .await?
        .iter()
        .map(User::to_public)
        .collect();
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<Json<Value>> {
    let valid = validate_user(
        &state.db,
        &body.name,
        &body.email,
        &body.phone,
        &body.role,
        &body.assigned_classes,
        None,
    )
    .await?;

    if body.initial_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Initial password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password_hash = password::hash(&body.initial_password)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
    let now = Utc::now().to_rfc3339();

    let id = sqlx::query(
        "INSERT INTO users (name, email, phone, role, assigned_classes, password, is_first_login, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)"
    )
    .bind(&valid.name)
    .bind(&valid.email)
    .bind(&valid.phone)
    .bind(&valid.role)
    .bind(serde_json::to_string(&valid.assigned_classes)?)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?
    .last_insert_rowid();

    tracing::info!("User {} created with role {:?} by user {}", id, valid.role, principal.user.id);

    Ok(Json(require_user(&state.db, id).await?.to_public()))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> AppResult<Json<Value>> {
    require_user(&state.db, id).await?;
    let valid = validate_user(
        &state.db,
        &body.name,
        &body.email,
        &body.phone,
        &body.role,
        &body.assigned_classes,
        Some(id),
    )
    .await?;

    sqlx::query(
        "UPDATE users SET name = ?, email = ?, phone = ?, role = ?, assigned_classes = ?, updated_at = ?
         WHERE id = ?"
    )
    .bind(&valid.name)
    .bind(&valid.email)
    .bind(&valid.phone)
    .bind(&valid.role)
    .bind(serde_json::to_string(&valid.assigned_classes)?)
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(&state.db)
    .await?;

    tracing::info!("User {} updated by user {}", id, principal.user.id);

    Ok(Json(require_user(&state.db, id).await?.to_public()))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    if principal.user.id == id {
        return Err(AppError::Validation("You cannot delete your own account".to_string()));
    }
    require_user(&state.db, id).await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    let closed = state.sessions.revoke_user(id);

    tracing::info!("User {} deleted by user {} ({} sessions closed)", id, principal.user.id, closed);
    Ok(Json(json!({"success": true})))
}

/// Administrator reset. The user must pick a new password at next login.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<Value>> {
    require_user(&state.db, id).await?;
    PasswordPolicy::new().validate_pair(&body.new_password, &body.confirm_password)?;

    let password_hash = password::hash(&body.new_password)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    sqlx::query("UPDATE users SET password = ?, is_first_login = 1, updated_at = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&state.db)
        .await?;

    if id != principal.user.id {
        state.sessions.revoke_user(id);
    }

    tracing::info!("Password of user {} reset by user {}", id, principal.user.id);
    Ok(Json(json!({"success": true})))
}
