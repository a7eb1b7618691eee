use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use crate::api::AppState;
use crate::auth::rbac::{is_allowed, Permission};
use crate::error::AppError;
use super::auth::authenticate;

/// State for the page guard: which permission a route group requires.
#[derive(Clone)]
pub struct PageGuard {
    pub app: Arc<AppState>,
    pub permission: Permission,
}

/// Central allow/deny for every protected page.
///
/// Unauthenticated callers get 401. A caller still on the first-login flow
/// gets 403 until the password is changed, and a role without the page's
/// permission gets 403.
pub async fn require_permission(
    State(guard): State<PageGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = authenticate(&guard.app, req.headers()).await?;

    if principal.user.is_first_login {
        guard.app.metrics.inc_denied();
        return Err(AppError::PasswordChangeRequired);
    }

    if !is_allowed(&principal.permissions, guard.permission) {
        guard.app.metrics.inc_denied();
        tracing::info!(
            "denied {} to user {} (role {:?})",
            guard.permission,
            principal.user.id,
            principal.user.role
        );
        return Err(AppError::Unauthorized(format!(
            "{} permission required",
            guard.permission
        )));
    }

    guard.app.metrics.inc_allowed();
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
