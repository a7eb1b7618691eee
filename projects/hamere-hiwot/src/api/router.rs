use axum::{http::Uri, middleware, routing::{get, post, put}, Router};
use std::sync::Arc;
use crate::auth::rbac::Permission;
use crate::error::AppError;
use super::AppState;
use super::handlers;
use super::middleware::rbac::{require_permission, PageGuard};

/// Puts a route group behind the page guard for `permission`.
fn guarded(
    state: &Arc<AppState>,
    permission: Permission,
    routes: Router<Arc<AppState>>,
) -> Router<Arc<AppState>> {
    routes.route_layer(middleware::from_fn_with_state(
        PageGuard { app: state.clone(), permission },
        require_permission,
    ))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

pub fn routes(state: Arc<AppState>) -> Router {
    let dashboard = Router::new()
        .route("/api/v1/dashboard/stats", get(handlers::dashboard::get_stats));

    let members = Router::new()
        .route("/api/v1/members", get(handlers::members::list).post(handlers::members::create))
        .route("/api/v1/members/transfer", post(handlers::members::transfer))
        .route("/api/v1/members/transfers", get(handlers::members::transfers))
        .route("/api/v1/members/import", post(handlers::members::import))
        .route("/api/v1/members/export", get(handlers::members::export))
        .route(
            "/api/v1/members/{id}",
            get(handlers::members::get)
                .put(handlers::members::update)
                .delete(handlers::members::delete),
        );

    let classes = Router::new()
        .route("/api/v1/classes", get(handlers::classes::list))
        .route("/api/v1/classes/{id}", get(handlers::classes::get))
        .route(
            "/api/v1/classes/{id}/reports",
            get(handlers::classes::list_reports).post(handlers::classes::create_report),
        )
        .route("/api/v1/classes/{id}/transfer", post(handlers::classes::transfer))
        .route(
            "/api/v1/classes/{id}/attendance",
            get(handlers::attendance::history).post(handlers::attendance::submit),
        )
        .route("/api/v1/classes/{id}/attendance/export", get(handlers::attendance::export));

    let finance = Router::new()
        .route(
            "/api/v1/finance/transactions",
            get(handlers::finance::list).post(handlers::finance::create),
        )
        .route("/api/v1/finance/summary", get(handlers::finance::summary))
        .route("/api/v1/finance/export", get(handlers::finance::export));

    let departments = Router::new()
        .route("/api/v1/departments", get(handlers::departments::list))
        .route(
            "/api/v1/departments/{id}/reports",
            get(handlers::departments::list_reports).post(handlers::departments::create_report),
        );

    let reports = Router::new()
        .route("/api/v1/reports", get(handlers::reports::list));

    let about = Router::new()
        .route("/api/v1/about", get(handlers::about::get));

    let settings = Router::new()
        .route(
            "/api/v1/settings/users",
            get(handlers::settings::users::list).post(handlers::settings::users::create),
        )
        .route(
            "/api/v1/settings/users/{id}",
            put(handlers::settings::users::update).delete(handlers::settings::users::delete),
        )
        .route("/api/v1/settings/users/{id}/password", post(handlers::settings::users::reset_password))
        .route(
            "/api/v1/settings/roles",
            get(handlers::settings::roles::list).post(handlers::settings::roles::create),
        )
        .route(
            "/api/v1/settings/roles/{id}",
            put(handlers::settings::roles::update).delete(handlers::settings::roles::delete),
        )
        .route("/api/v1/settings/departments", post(handlers::settings::departments::create))
        .route(
            "/api/v1/settings/departments/{id}",
            put(handlers::settings::departments::update).delete(handlers::settings::departments::delete),
        );

    Router::new()
        // Health (public)
        .route("/health", get(handlers::health::health_check))
        // Auth (public)
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        // Session (authenticated, allowed during first login)
        .route("/api/v1/auth/me", get(handlers::auth::me))
        .route("/api/v1/auth/complete-first-login", post(handlers::auth::complete_first_login))
        .route("/api/v1/auth/change-password", post(handlers::auth::change_password))
        .route("/api/v1/navigation", get(handlers::navigation::list))
        .route("/api/v1/access/{permission}", get(handlers::navigation::probe))
        // Pages
        .merge(guarded(&state, Permission::Dashboard, dashboard))
        .merge(guarded(&state, Permission::Members, members))
        .merge(guarded(&state, Permission::Classes, classes))
        .merge(guarded(&state, Permission::Finance, finance))
        .merge(guarded(&state, Permission::Departments, departments))
        .merge(guarded(&state, Permission::Reports, reports))
        .merge(guarded(&state, Permission::About, about))
        .merge(guarded(&state, Permission::Settings, settings))
        // Prometheus metrics (public)
        .route("/metrics", get(handlers::metrics::prometheus_metrics))
        .fallback(not_found)
        .with_state(state)
}
