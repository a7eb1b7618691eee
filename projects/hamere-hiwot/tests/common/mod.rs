//! Shared setup for the integration tests: an in-memory store with the
//! reference and demo data, and a router driven through `oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt; // for .collect()
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for .oneshot()

use hamere_hiwot::api::{build_app, AppState};
use hamere_hiwot::config::{AdminConfig, ApiConfig, AuthConfig, Config, DatabaseConfig};
use hamere_hiwot::metrics::AccessMetrics;

pub const ADMIN_PHONE: &str = "0900000000";
pub const ADMIN_PASSWORD: &str = "admin";
pub const TEACHER_PHONE: &str = "0932489095";
pub const CHIEF_PHONE: &str = "0933480007";
pub const DEMO_PASSWORD: &str = "password123";
pub const NEW_PASSWORD: &str = "Secur3!pass";

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            port: 18099,
            bind: "127.0.0.1".to_string(),
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        database: DatabaseConfig {
            path: ":memory:".to_string(),
            seed_demo_data: true,
        },
        auth: AuthConfig {
            jwt_secret: "test-jwt-secret-for-integration-tests-only-32chars".to_string(),
            jwt_expiry_hours: 1,
            max_login_failures: 5,
            login_window_secs: 300,
        },
        admin: AdminConfig {
            name: "Administrator".to_string(),
            phone: ADMIN_PHONE.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        },
    }
}

/// Full app over a fresh in-memory database with the demo data loaded.
pub async fn build_test_app() -> (Router, Arc<AppState>) {
    build_test_app_with(test_config()).await
}

pub async fn build_test_app_with(cfg: Config) -> (Router, Arc<AppState>) {
    let db = hamere_hiwot::db::connect(&cfg.database.path)
        .await
        .expect("Failed to open in-memory database");

    hamere_hiwot::db::seed::seed_reference_data(&db).await.expect("reference seed");
    hamere_hiwot::db::seed_admin(&db, &cfg).await.expect("admin seed");
    hamere_hiwot::db::seed::seed_demo_data(&db).await.expect("demo seed");

    let state = Arc::new(AppState::new(&cfg, db, Arc::new(AccessMetrics::default())));
    let cors = tower_http::cors::CorsLayer::new();
    let app = build_app(state.clone(), cors);
    (app, state)
}

/// Sends a request; the body is parsed as JSON when it is JSON, else
/// returned as a string value.
pub async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    let req = match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, req).await
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

pub async fn login(app: &Router, phone: &str, password: &str) -> (StatusCode, Value) {
    call(
        app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "phone": phone, "password": password })),
    )
    .await
}

/// Logs in and finishes the first-login password change, returning a token
/// that can open pages.
pub async fn login_ready(app: &Router, phone: &str, password: &str) -> String {
    let (status, body) = login(app, phone, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    let token = body["token"].as_str().expect("token").to_string();

    if body["must_change_password"] == json!(true) {
        let (status, body) = call(
            app,
            "POST",
            "/api/v1/auth/complete-first-login",
            Some(&token),
            Some(json!({ "new_password": NEW_PASSWORD, "confirm_password": NEW_PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "first login failed: {}", body);
    }
    token
}

pub async fn admin_token(app: &Router) -> String {
    login_ready(app, ADMIN_PHONE, ADMIN_PASSWORD).await
}

pub async fn teacher_token(app: &Router) -> String {
    login_ready(app, TEACHER_PHONE, DEMO_PASSWORD).await
}

pub async fn chief_token(app: &Router) -> String {
    login_ready(app, CHIEF_PHONE, DEMO_PASSWORD).await
}

pub fn hrefs(navigation: &Value) -> Vec<String> {
    navigation
        .as_array()
        .expect("navigation array")
        .iter()
        .map(|e| e["href"].as_str().unwrap_or_default().to_string())
        .collect()
}
