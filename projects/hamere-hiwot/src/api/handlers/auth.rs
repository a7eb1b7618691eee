use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use crate::api::middleware::auth::{bearer_token, AuthUser, Principal};
use crate::api::validators::PasswordPolicy;
use crate::api::AppState;
use crate::auth::rbac::{navigation, DataScope};
use crate::db::models::role::Role;
use crate::db::models::user::User;
use crate::error::{AppError, AppResult};
use crate::i18n::Language;
use super::LangQuery;

#[derive(Deserialize)]
pub struct LoginRequest {
    phone: String,
    password: String,
    #[serde(default)]
    lang: Language,
}

#[derive(Deserialize)]
pub struct CompleteFirstLoginRequest {
    new_password: String,
    confirm_password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
    confirm_password: String,
}

/// Profile, permissions and sidebar for the current session.
fn session_view(principal: &Principal, lang: Language) -> Value {
    json!({
        "user": principal.user.to_public(),
        "permissions": principal.permissions.to_tags(),
        "navigation": navigation(&principal.permissions, lang),
        "scope": principal.scope,
        "must_change_password": principal.user.is_first_login,
    })
}

fn check_rate_limit(state: &AppState, phone: &str) -> AppResult<()> {
    if let Some(entry) = state.login_attempts.get(phone) {
        let (failures, window_start) = *entry;
        if window_start.elapsed() < state.login_window && failures >= state.max_login_failures {
            return Err(AppError::TooManyRequests);
        }
    }
    Ok(())
}

/// Drops failure windows that have run out.
fn prune_login_attempts(state: &AppState) {
    state
        .login_attempts
        .retain(|_, (_, window_start)| window_start.elapsed() < state.login_window);
}

fn record_failure(state: &AppState, phone: &str) {
    let mut entry = state
        .login_attempts
        .entry(phone.to_string())
        .or_insert((0, Instant::now()));
    if entry.1.elapsed() >= state.login_window {
        *entry = (0, Instant::now());
    }
    entry.0 += 1;
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    prune_login_attempts(&state);
    check_rate_limit(&state, &req.phone)?;

    // Unknown phone and wrong password fail the same way.
    let user = match User::find_by_phone(&state.db, &req.phone).await? {
        Some(user) if crate::auth::password::verify(&req.password, &user.password) => user,
        _ => {
            record_failure(&state, &req.phone);
            state.metrics.inc_login_failed();
            tracing::info!("Failed login attempt");
            return Err(AppError::AuthFailed);
        }
    };

    state.login_attempts.remove(&req.phone);
    state
        .sessions
        .prune(Duration::from_secs(state.jwt_expiry_hours * 3600));
    let session_id = state.sessions.open(user.id);

    let token = crate::auth::jwt::generate(
        user.id,
        &session_id,
        &user.role,
        &state.jwt_secret,
        state.jwt_expiry_hours,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    let (permissions, class_scoped) = Role::permissions_for(&state.db, &user.role).await?;
    let scope = DataScope::for_user(class_scoped, &user.assigned_classes());
    let principal = Principal { user, session_id, permissions, scope };

    state.metrics.inc_login_succeeded();
    tracing::info!("User {} logged in", principal.user.id);

    let mut body = session_view(&principal, req.lang);
    if let Some(obj) = body.as_object_mut() {
        obj.insert("token".to_string(), json!(token));
        obj.insert("expires_in".to_string(), json!(state.jwt_expiry_hours * 3600));
    }
    Ok(Json(body))
}

/// Clears the caller's session. A missing or stale token still succeeds.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    if let Some(claims) = bearer_token(&headers)
        .and_then(|t| crate::auth::jwt::verify(t, &state.jwt_secret).ok())
    {
        if state.sessions.close(&claims.sid) {
            tracing::info!("User {} logged out", claims.sub);
        }
    }
    Ok(Json(json!({"success": true})))
}

pub async fn me(
    AuthUser(principal): AuthUser,
    Query(q): Query<LangQuery>,
) -> AppResult<Json<Value>> {
    Ok(Json(session_view(&principal, q.lang)))
}

pub async fn complete_first_login(
    State(state): State<Arc<AppState>>,
    AuthUser(mut principal): AuthUser,
    Json(body): Json<CompleteFirstLoginRequest>,
) -> AppResult<Json<Value>> {
    if !principal.user.is_first_login {
        return Err(AppError::Conflict("First login already completed".to_string()));
    }

    PasswordPolicy::new().validate_pair(&body.new_password, &body.confirm_password)?;

    let hash = crate::auth::password::hash(&body.new_password)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
    let now = Utc::now().to_rfc3339();

    sqlx::query("UPDATE users SET password = ?, is_first_login = 0, updated_at = ? WHERE id = ?")
        .bind(&hash)
        .bind(&now)
        .bind(principal.user.id)
        .execute(&state.db)
        .await?;

    tracing::info!("User {} completed first login", principal.user.id);

    principal.user.is_first_login = false;
    principal.user.updated_at = now;
    Ok(Json(session_view(&principal, Language::default())))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> AppResult<Json<Value>> {
    if principal.user.is_first_login {
        return Err(AppError::PasswordChangeRequired);
    }
    if !crate::auth::password::verify(&body.current_password, &principal.user.password) {
        return Err(AppError::Validation("Current password is incorrect".to_string()));
    }

    PasswordPolicy::new().validate_pair(&body.new_password, &body.confirm_password)?;

    let hash = crate::auth::password::hash(&body.new_password)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    sqlx::query("UPDATE users SET password = ?, updated_at = ? WHERE id = ?")
        .bind(&hash)
        .bind(Utc::now().to_rfc3339())
        .bind(principal.user.id)
        .execute(&state.db)
        .await?;

    tracing::info!("User {} changed password", principal.user.id);
    Ok(Json(json!({"success": true})))
}
