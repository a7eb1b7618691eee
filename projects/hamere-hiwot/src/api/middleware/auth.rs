use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::sync::Arc;
use crate::api::AppState;
use crate::auth::rbac::{DataScope, PermissionSet};
use crate::db::models::role::Role;
use crate::db::models::user::User;
use crate::error::{AppError, AppResult};

/// The current user of a request, with the role already resolved.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: User,
    pub session_id: String,
    pub permissions: PermissionSet,
    pub scope: DataScope,
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Resolves the Bearer token to a live session and loads the user and role.
///
/// Every failure maps to `AuthFailed`; callers cannot tell an expired token
/// from a closed session or a deleted user.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> AppResult<Principal> {
    let token = bearer_token(headers).ok_or(AppError::AuthFailed)?;

    let claims = crate::auth::jwt::verify(token, &state.jwt_secret)
        .map_err(|_| AppError::AuthFailed)?;

    state
        .sessions
        .resolve(&claims.sid, claims.sub)
        .ok_or(AppError::AuthFailed)?;

    let user = match User::find_by_id(&state.db, claims.sub).await? {
        Some(user) => user,
        None => {
            state.sessions.close(&claims.sid);
            return Err(AppError::AuthFailed);
        }
    };

    // Role is read on every request so edits to the registry apply at once.
    let (permissions, class_scoped) = Role::permissions_for(&state.db, &user.role).await?;
    if permissions.is_empty() {
        tracing::debug!("user {} has role {:?} which grants nothing", user.id, user.role);
    }
    let scope = DataScope::for_user(class_scoped, &user.assigned_classes());

    Ok(Principal {
        user,
        session_id: claims.sid,
        permissions,
        scope,
    })
}

/// Axum extractor for the authenticated caller.
/// Behind the page guard it reuses the principal the guard resolved.
pub struct AuthUser(pub Principal);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(AuthUser(principal.clone()));
        }
        authenticate(state, &parts.headers).await.map(AuthUser)
    }
}
