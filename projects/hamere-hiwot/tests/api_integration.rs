//! Session and access-control integration tests.
//!
//! Covered:
//!   - GET  /health, /metrics
//!   - POST /api/v1/auth/login  (success / generic failure / lockout)
//!   - POST /api/v1/auth/logout
//!   - GET  /api/v1/auth/me
//!   - POST /api/v1/auth/complete-first-login, /api/v1/auth/change-password
//!   - GET  /api/v1/navigation, /api/v1/access/{permission}
//!   - page guard decisions per role

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

use common::*;

// ═══════════════════════════════════════════════════════════════════════════════
// Health / metrics
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_health_check() {
    let (app, _) = build_test_app().await;
    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_count_logins_and_denials() {
    let (app, _) = build_test_app().await;
    login(&app, ADMIN_PHONE, "wrong").await;
    let token = teacher_token(&app).await;
    call(&app, "GET", "/api/v1/finance/transactions", Some(&token), None).await;

    let (status, body) = call(&app, "GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().expect("metrics are plain text");
    assert!(text.contains("hamere_logins_total{outcome=\"success\"} 1"));
    assert!(text.contains("hamere_logins_total{outcome=\"failure\"} 1"));
    assert!(text.contains("hamere_guarded_requests_total{decision=\"deny\"} 1"));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (app, _) = build_test_app().await;
    let (status, body) = call(&app, "GET", "/api/v1/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("/api/v1/nowhere"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Auth: Login
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_login_success_returns_session() {
    let (app, _) = build_test_app().await;
    let (status, body) = login(&app, TEACHER_PHONE, DEMO_PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["role"], "Teacher");
    assert!(body["user"].get("password").is_none(), "hash must not leak");
    assert_eq!(body["must_change_password"], true);
    assert_eq!(body["permissions"], json!(["Dashboard", "Classes", "Reports", "About"]));
    assert_eq!(body["scope"]["kind"], "classes");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _) = build_test_app().await;

    let (s1, wrong_password) = login(&app, TEACHER_PHONE, "not-the-password").await;
    let (s2, unknown_phone) = login(&app, "0999999999", DEMO_PASSWORD).await;

    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_phone);
    assert_eq!(wrong_password["error"], "Authentication failed");
}

#[tokio::test]
async fn test_login_phone_is_matched_exactly() {
    let (app, _) = build_test_app().await;
    let (status, _) = login(&app, " 0932489095", DEMO_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_repeated_failures_lock_out_the_phone() {
    let (app, _) = build_test_app().await;
    for _ in 0..5 {
        let (status, _) = login(&app, CHIEF_PHONE, "guess").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused until the window passes.
    let (status, _) = login(&app, CHIEF_PHONE, DEMO_PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Other phones are unaffected.
    let (status, _) = login(&app, TEACHER_PHONE, DEMO_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_success_clears_failure_count() {
    let (app, _) = build_test_app().await;
    for _ in 0..4 {
        login(&app, CHIEF_PHONE, "guess").await;
    }
    let (status, _) = login(&app, CHIEF_PHONE, DEMO_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    for _ in 0..4 {
        login(&app, CHIEF_PHONE, "guess").await;
    }
    let (status, _) = login(&app, CHIEF_PHONE, DEMO_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_failure_windows_are_evicted() {
    let (app, state) = build_test_app().await;
    login(&app, "0911000000", "guess").await;
    login(&app, ADMIN_PHONE, ADMIN_PASSWORD).await;
    assert_eq!(state.login_attempts.len(), 1, "window still open");

    let mut cfg = test_config();
    cfg.auth.login_window_secs = 0;
    let (app, state) = build_test_app_with(cfg).await;
    login(&app, "0911000000", "guess").await;
    login(&app, "0911000001", "guess").await;
    login(&app, ADMIN_PHONE, ADMIN_PASSWORD).await;
    assert_eq!(state.login_attempts.len(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Auth: Session lifetime
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_me_requires_token() {
    let (app, _) = build_test_app().await;
    let (status, _) = call(&app, "GET", "/api/v1/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "GET", "/api/v1/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let (app, _) = build_test_app().await;
    let token = admin_token(&app).await;

    let (status, _) = call(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, "POST", "/api/v1/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = call(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&app, "GET", "/api/v1/dashboard/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_is_fine() {
    let (app, _) = build_test_app().await;
    let (status, _) = call(&app, "POST", "/api/v1/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let token = admin_token(&app).await;
    call(&app, "POST", "/api/v1/auth/logout", Some(&token), None).await;
    let (status, _) = call(&app, "POST", "/api/v1/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let (app, _) = build_test_app().await;
    let first = admin_token(&app).await;
    let (_, body) = login(&app, ADMIN_PHONE, NEW_PASSWORD).await;
    let second = body["token"].as_str().unwrap().to_string();

    call(&app, "POST", "/api/v1/auth/logout", Some(&first), None).await;
    let (status, _) = call(&app, "GET", "/api/v1/auth/me", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
}

// ═══════════════════════════════════════════════════════════════════════════════
// First login
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_first_login_blocks_pages_until_completed() {
    let (app, _) = build_test_app().await;
    let (_, body) = login(&app, TEACHER_PHONE, DEMO_PASSWORD).await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = call(&app, "GET", "/api/v1/dashboard/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Password change required before continuing");

    let (status, me) = call(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["must_change_password"], true);

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/auth/complete-first-login",
        Some(&token),
        Some(json!({ "new_password": NEW_PASSWORD, "confirm_password": NEW_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, "GET", "/api/v1/dashboard/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_first_login_enforces_password_policy() {
    let (app, _) = build_test_app().await;
    let (_, body) = login(&app, TEACHER_PHONE, DEMO_PASSWORD).await;
    let token = body["token"].as_str().unwrap().to_string();

    for (new, confirm) in [
        ("Sh0rt!", "Sh0rt!"),
        ("lowercase1!", "lowercase1!"),
        ("NoDigits!!", "NoDigits!!"),
        ("NoSpecial12", "NoSpecial12"),
        (NEW_PASSWORD, "Secur3!pasS"),
    ] {
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/auth/complete-first-login",
            Some(&token),
            Some(json!({ "new_password": new, "confirm_password": confirm })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} / {} should be rejected", new, confirm);
    }
}

#[tokio::test]
async fn test_completed_first_login_never_returns() {
    let (app, _) = build_test_app().await;
    let token = teacher_token(&app).await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/auth/complete-first-login",
        Some(&token),
        Some(json!({ "new_password": "An0ther!pass", "confirm_password": "An0ther!pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The old password is gone and a fresh login skips the flow.
    let (status, _) = login(&app, TEACHER_PHONE, DEMO_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = login(&app, TEACHER_PHONE, NEW_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["must_change_password"], false);
}

#[tokio::test]
async fn test_change_password() {
    let (app, _) = build_test_app().await;
    let token = chief_token(&app).await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/auth/change-password",
        Some(&token),
        Some(json!({
            "current_password": "wrong",
            "new_password": "Br4nd!new",
            "confirm_password": "Br4nd!new",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/auth/change-password",
        Some(&token),
        Some(json!({
            "current_password": NEW_PASSWORD,
            "new_password": "Br4nd!new",
            "confirm_password": "Br4nd!new",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = login(&app, CHIEF_PHONE, "Br4nd!new").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["must_change_password"], false);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Navigation and page guard
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_navigation_matches_role_permissions() {
    let (app, _) = build_test_app().await;

    let (_, admin) = login(&app, ADMIN_PHONE, ADMIN_PASSWORD).await;
    assert_eq!(
        hrefs(&admin["navigation"]),
        vec!["/dashboard", "/members", "/classes", "/finance", "/departments", "/reports", "/about", "/settings"]
    );

    let (_, teacher) = login(&app, TEACHER_PHONE, DEMO_PASSWORD).await;
    assert_eq!(hrefs(&teacher["navigation"]), vec!["/dashboard", "/classes", "/reports", "/about"]);

    let (_, chief) = login(&app, CHIEF_PHONE, DEMO_PASSWORD).await;
    assert_eq!(
        hrefs(&chief["navigation"]),
        vec!["/dashboard", "/members", "/finance", "/departments", "/reports", "/about"]
    );
    assert_eq!(chief["navigation"][1]["sub_items"].as_array().map(|a| a.len()), Some(3));
}

#[tokio::test]
async fn test_navigation_labels_in_amharic() {
    let (app, _) = build_test_app().await;
    let token = teacher_token(&app).await;
    let (status, body) = call(&app, "GET", "/api/v1/navigation?lang=am", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    assert_eq!(body["data"][1]["label"], "ክፍሎች");
}

#[tokio::test]
async fn test_page_guard_follows_permissions() {
    let (app, _) = build_test_app().await;
    let teacher = teacher_token(&app).await;
    let chief = chief_token(&app).await;

    let cases = [
        ("/api/v1/dashboard/stats", StatusCode::OK, StatusCode::OK),
        ("/api/v1/members", StatusCode::FORBIDDEN, StatusCode::OK),
        ("/api/v1/classes", StatusCode::OK, StatusCode::FORBIDDEN),
        ("/api/v1/finance/transactions", StatusCode::FORBIDDEN, StatusCode::OK),
        ("/api/v1/departments", StatusCode::FORBIDDEN, StatusCode::OK),
        ("/api/v1/reports", StatusCode::OK, StatusCode::OK),
        ("/api/v1/about", StatusCode::OK, StatusCode::OK),
        ("/api/v1/settings/users", StatusCode::FORBIDDEN, StatusCode::FORBIDDEN),
    ];
    for (uri, for_teacher, for_chief) in cases {
        let (status, _) = call(&app, "GET", uri, Some(&teacher), None).await;
        assert_eq!(status, for_teacher, "teacher on {}", uri);
        let (status, _) = call(&app, "GET", uri, Some(&chief), None).await;
        assert_eq!(status, for_chief, "chief officer on {}", uri);
    }
}

#[tokio::test]
async fn test_pages_require_authentication() {
    let (app, _) = build_test_app().await;
    let (status, _) = call(&app, "GET", "/api/v1/finance/summary", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_probe() {
    let (app, _) = build_test_app().await;
    let token = teacher_token(&app).await;

    let (status, body) = call(&app, "GET", "/api/v1/access/Finance", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "permission": "Finance", "allowed": false }));

    let (_, body) = call(&app, "GET", "/api/v1/access/Classes", Some(&token), None).await;
    assert_eq!(body["allowed"], true);

    let (status, _) = call(&app, "GET", "/api/v1/access/Students", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_role_sees_nothing() {
    let (app, state) = build_test_app().await;
    let hash = hamere_hiwot::auth::password::hash(NEW_PASSWORD).unwrap();
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO users (name, email, phone, role, assigned_classes, password, is_first_login, created_at, updated_at)
         VALUES ('Ghost', 'ghost@example.org', '0911000000', 'Ghost', '[]', ?, 0, ?, ?)"
    )
    .bind(&hash)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .unwrap();

    let (status, body) = login(&app, "0911000000", NEW_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["navigation"], json!([]));
    assert_eq!(body["permissions"], json!([]));

    let token = body["token"].as_str().unwrap();
    for uri in ["/api/v1/dashboard/stats", "/api/v1/about", "/api/v1/settings/roles"] {
        let (status, _) = call(&app, "GET", uri, Some(token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[tokio::test]
async fn test_role_edits_apply_to_live_sessions() {
    let (app, _) = build_test_app().await;
    let admin = admin_token(&app).await;
    let chief = chief_token(&app).await;

    let (status, _) = call(&app, "GET", "/api/v1/finance/summary", Some(&chief), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        "PUT",
        "/api/v1/settings/roles/chief-officer",
        Some(&admin),
        Some(json!({ "name": "Chief Officer", "permissions": ["Dashboard", "About"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, "GET", "/api/v1/finance/summary", Some(&chief), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
