use anyhow::Result;
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use dashmap::DashMap;
use crate::auth::session::SessionRegistry;
use crate::config::Config;
use crate::db::DbPool;
use crate::metrics::AccessMetrics;

pub mod router;
pub mod middleware;
pub mod handlers;
pub mod validators;

pub struct AppState {
    pub db: DbPool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub sessions: SessionRegistry,
    /// Login failure tracking: phone → (failure_count, window_start)
    pub login_attempts: DashMap<String, (u32, Instant)>,
    pub max_login_failures: u32,
    pub login_window: Duration,
    pub metrics: Arc<AccessMetrics>,
}

impl AppState {
    pub fn new(cfg: &Config, db: DbPool, metrics: Arc<AccessMetrics>) -> Self {
        Self {
            db,
            jwt_secret: cfg.auth.jwt_secret.clone(),
            jwt_expiry_hours: cfg.auth.jwt_expiry_hours,
            sessions: SessionRegistry::new(),
            login_attempts: DashMap::new(),
            max_login_failures: cfg.auth.max_login_failures,
            login_window: Duration::from_secs(cfg.auth.login_window_secs),
            metrics,
        }
    }
}

pub async fn serve(cfg: Config, db: DbPool, metrics: Arc<AccessMetrics>) -> Result<()> {
    let bind_addr = format!("{}:{}", cfg.api.bind, cfg.api.port);
    let state = Arc::new(AppState::new(&cfg, db, metrics));
    let cors = build_cors_layer(&cfg.api.cors_allowed_origins);
    let app = build_app(state, cors);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Management API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("No valid CORS origins configured; CORS will block all cross-origin requests");
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn build_app(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .merge(router::routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
