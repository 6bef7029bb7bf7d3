//! Integration tests for the tiered rate limit guard.

mod helpers;

use axum::http::StatusCode;
use axum::http::header::RETRY_AFTER;
use serde_json::json;

use helpers::TestApp;
use wastehub_core::config::{AppConfig, Environment};
use wastehub_entity::user::UserRole;

fn production() -> AppConfig {
    let mut config = AppConfig::for_tests();
    config.environment = Environment::Production;
    config
}

async fn verify(app: &TestApp, token: &str) -> helpers::TestResponse {
    app.request("POST", "/api/auth/verify", Some(json!({ "token": token })), None)
        .await
}

#[tokio::test]
async fn test_auth_tier_counts_only_failures() {
    let app = TestApp::with_config(production());
    let user = app.create_user(UserRole::Resident, "Rita Resident");

    for _ in 0..2 {
        assert_eq!(verify(&app, "not-a-token").await.status, StatusCode::UNAUTHORIZED);
    }
    // A success in between neither resets nor consumes the budget.
    let ok = verify(&app, &user.token).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["data"]["role"], "resident");
    for _ in 0..3 {
        assert_eq!(verify(&app, "not-a-token").await.status, StatusCode::UNAUTHORIZED);
    }

    let blocked = verify(&app, &user.token).await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(blocked.error_code(), "RATE_LIMITED");
    assert_eq!(blocked.headers[RETRY_AFTER], "900");
    assert_eq!(blocked.body["retry_after_seconds"], 900);
    assert!(
        blocked.body["message"].as_str().unwrap().contains("15 minutes"),
        "{:?}",
        blocked.body
    );
}

#[tokio::test]
async fn test_non_production_multiplies_ceilings() {
    let app = TestApp::new();
    for _ in 0..6 {
        assert_eq!(verify(&app, "not-a-token").await.status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_rejected_write_never_reaches_the_task() {
    let mut config = production();
    config.rate_limit.write.max_requests = 1;
    let app = TestApp::with_config(config);
    let admin = app.create_user(UserRole::Admin, "Ada Admin");
    let collector = app.create_user(UserRole::Collector, "Cole Collector");
    let resident = app.create_user(UserRole::Resident, "Rita Resident");
    let task = app
        .assign(&admin, app.create_report(&resident), &collector)
        .await;
    let id = task["id"].as_str().unwrap();

    let cancel = app
        .request(
            "POST",
            &format!("/api/tasks/{id}/cancel"),
            Some(json!({ "reason": "Too many" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(cancel.status, StatusCode::TOO_MANY_REQUESTS);

    // Reads are a separate tier.
    let fetched = app
        .request("GET", &format!("/api/tasks/{id}"), None, Some(&admin.token))
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["status"], "scheduled");
    assert_eq!(fetched.body["data"]["version"], 1);
}

#[tokio::test]
async fn test_tiers_are_keyed_by_client() {
    let mut config = production();
    config.server.trust_forwarded_for = true;
    config.rate_limit.write.max_requests = 2;
    let app = TestApp::with_config(config);
    let user = app.create_user(UserRole::Resident, "Rita Resident");

    let mark_all = |ip: &'static str| {
        let app = &app;
        let token = user.token.clone();
        async move {
            app.request_with_headers(
                "PUT",
                "/api/notifications/read-all",
                None,
                Some(&token),
                &[("x-forwarded-for", ip)],
            )
            .await
        }
    };

    let first = mark_all("198.51.100.7").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.headers["x-ratelimit-limit"], "2");
    assert_eq!(first.headers["x-ratelimit-remaining"], "1");
    assert_eq!(mark_all("198.51.100.7").await.status, StatusCode::OK);
    assert_eq!(
        mark_all("198.51.100.7").await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    assert_eq!(mark_all("203.0.113.20").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_disabled_guard_admits_everything() {
    let mut config = production();
    config.rate_limit.enabled = false;
    let app = TestApp::with_config(config);
    for _ in 0..8 {
        assert_eq!(verify(&app, "not-a-token").await.status, StatusCode::UNAUTHORIZED);
    }
}
