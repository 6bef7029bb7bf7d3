//! Integration tests for the pickup task lifecycle over HTTP.

mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use helpers::{TestApp, TestUser};
use wastehub_entity::user::UserRole;

struct Cast {
    admin: TestUser,
    collector: TestUser,
    resident: TestUser,
}

fn cast(app: &TestApp) -> Cast {
    Cast {
        admin: app.create_user(UserRole::Admin, "Ada Admin"),
        collector: app.create_user(UserRole::Collector, "Cole Collector"),
        resident: app.create_user(UserRole::Resident, "Rita Resident"),
    }
}

#[tokio::test]
async fn test_assign_creates_scheduled_task() {
    let app = TestApp::new();
    let c = cast(&app);
    let report = app.create_report(&c.resident);

    let task = app.assign(&c.admin, report, &c.collector).await;

    assert_eq!(task["status"], "scheduled");
    assert_eq!(task["collector_id"], json!(c.collector.id));
    assert_eq!(task["resident_id"], json!(c.resident.id));
    assert_eq!(task["version"], 1);
}

#[tokio::test]
async fn test_only_admin_may_assign() {
    let app = TestApp::new();
    let c = cast(&app);
    let report = app.create_report(&c.resident);

    let body = json!({
        "report_id": report,
        "collector_id": c.collector.id,
        "scheduled_date": Utc::now() + Duration::hours(1),
    });
    let response = app
        .request("POST", "/api/tasks", Some(body), Some(&c.collector.token))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/tasks", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "AUTHENTICATION");
}

#[tokio::test]
async fn test_full_lifecycle_and_history() {
    let app = TestApp::new();
    let c = cast(&app);
    let report = app.create_report(&c.resident);
    let task = app.assign(&c.admin, report, &c.collector).await;
    let id = task["id"].as_str().unwrap().to_string();

    let started = app
        .request("POST", &format!("/api/tasks/{id}/start"), None, Some(&c.collector.token))
        .await;
    assert_eq!(started.status, StatusCode::OK, "{:?}", started.body);
    assert_eq!(started.body["data"]["status"], "in_progress");
    assert!(started.body["data"]["actual_start_time"].is_string());

    let completed = app
        .request(
            "POST",
            &format!("/api/tasks/{id}/complete"),
            Some(json!({ "notes": "Three bags collected" })),
            Some(&c.collector.token),
        )
        .await;
    assert_eq!(completed.status, StatusCode::OK);
    assert_eq!(completed.body["data"]["status"], "completed");
    assert_eq!(completed.body["data"]["completion_notes"], "Three bags collected");

    let history = app
        .request("GET", &format!("/api/tasks/{id}/history"), None, Some(&c.resident.token))
        .await;
    assert_eq!(history.status, StatusCode::OK);
    let statuses: Vec<&str> = history.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["to_status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, ["scheduled", "in_progress", "completed"]);
}

#[tokio::test]
async fn test_double_start_fails_with_invalid_transition() {
    let app = TestApp::new();
    let c = cast(&app);
    let report = app.create_report(&c.resident);
    let task = app.assign(&c.admin, report, &c.collector).await;
    let path = format!("/api/tasks/{}/start", task["id"].as_str().unwrap());

    let first = app.request("POST", &path, None, Some(&c.collector.token)).await;
    let second = app.request("POST", &path, None, Some(&c.collector.token)).await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.error_code(), "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_scheduled_task_cannot_complete() {
    let app = TestApp::new();
    let c = cast(&app);
    let report = app.create_report(&c.resident);
    let task = app.assign(&c.admin, report, &c.collector).await;

    let response = app
        .request(
            "POST",
            &format!("/api/tasks/{}/complete", task["id"].as_str().unwrap()),
            Some(json!({})),
            Some(&c.collector.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_other_collector_cannot_start() {
    let app = TestApp::new();
    let c = cast(&app);
    let intruder = app.create_user(UserRole::Collector, "Ivan Intruder");
    let report = app.create_report(&c.resident);
    let task = app.assign(&c.admin, report, &c.collector).await;

    let response = app
        .request(
            "POST",
            &format!("/api/tasks/{}/start", task["id"].as_str().unwrap()),
            None,
            Some(&intruder.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(
        response.body["message"]
            .as_str()
            .unwrap()
            .contains("assigned collector"),
        "{:?}",
        response.body
    );
}

#[tokio::test]
async fn test_reschedule_keeps_task_scheduled() {
    let app = TestApp::new();
    let c = cast(&app);
    let report = app.create_report(&c.resident);
    let task = app.assign(&c.admin, report, &c.collector).await;
    let id = task["id"].as_str().unwrap();

    let response = app
        .request(
            "POST",
            &format!("/api/tasks/{id}/reschedule"),
            Some(json!({ "scheduled_date": Utc::now() + Duration::days(2) })),
            Some(&c.admin.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["status"], "scheduled");
    assert_eq!(response.body["data"]["version"], 2);
}

#[tokio::test]
async fn test_stale_expected_version_conflicts() {
    let app = TestApp::new();
    let c = cast(&app);
    let report = app.create_report(&c.resident);
    let task = app.assign(&c.admin, report, &c.collector).await;
    let id = task["id"].as_str().unwrap();

    let response = app
        .request(
            "POST",
            &format!("/api/tasks/{id}/cancel"),
            Some(json!({ "reason": "Duplicate report", "expected_version": 7 })),
            Some(&c.admin.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "CONFLICT");
}

#[tokio::test]
async fn test_if_match_header_guards_start() {
    let app = TestApp::new();
    let c = cast(&app);
    let report = app.create_report(&c.resident);
    let task = app.assign(&c.admin, report, &c.collector).await;
    let id = task["id"].as_str().unwrap();
    let path = format!("/api/tasks/{id}/start");

    let stale = app
        .request_with_headers("POST", &path, None, Some(&c.collector.token), &[("if-match", "\"3\"")])
        .await;
    assert_eq!(stale.status, StatusCode::CONFLICT);

    let fresh = app
        .request_with_headers("POST", &path, None, Some(&c.collector.token), &[("if-match", "\"1\"")])
        .await;
    assert_eq!(fresh.status, StatusCode::OK, "{:?}", fresh.body);
    assert_eq!(fresh.body["data"]["status"], "in_progress");
}

#[tokio::test]
async fn test_concurrent_cancel_and_reschedule_one_wins() {
    let app = TestApp::new();
    let c = cast(&app);
    let report = app.create_report(&c.resident);
    let task = app.assign(&c.admin, report, &c.collector).await;
    let id = task["id"].as_str().unwrap();

    let cancel_path = format!("/api/tasks/{id}/cancel");
    let reschedule_path = format!("/api/tasks/{id}/reschedule");
    let (cancel, reschedule) = tokio::join!(
        app.request(
            "POST",
            &cancel_path,
            Some(json!({ "reason": "Resident moved", "expected_version": 1 })),
            Some(&c.admin.token),
        ),
        app.request(
            "POST",
            &reschedule_path,
            Some(json!({
                "scheduled_date": Utc::now() + Duration::days(1),
                "expected_version": 1,
            })),
            Some(&c.admin.token),
        ),
    );

    let successes = [cancel.status, reschedule.status]
        .iter()
        .filter(|s| **s == StatusCode::OK)
        .count();
    assert_eq!(successes, 1, "cancel={:?} reschedule={:?}", cancel.body, reschedule.body);
}

#[tokio::test]
async fn test_lists_are_scoped_by_role() {
    let app = TestApp::new();
    let c = cast(&app);
    let other_resident = app.create_user(UserRole::Resident, "Otto Other");
    app.assign(&c.admin, app.create_report(&c.resident), &c.collector)
        .await;
    app.assign(&c.admin, app.create_report(&other_resident), &c.collector)
        .await;

    let admin_view = app.request("GET", "/api/tasks", None, Some(&c.admin.token)).await;
    let resident_view = app
        .request("GET", "/api/tasks", None, Some(&c.resident.token))
        .await;

    assert_eq!(admin_view.body["data"]["total_items"], 2);
    assert_eq!(resident_view.body["data"]["total_items"], 1);
}

#[tokio::test]
async fn test_resident_cannot_read_foreign_task() {
    let app = TestApp::new();
    let c = cast(&app);
    let stranger = app.create_user(UserRole::Resident, "Sam Stranger");
    let task = app
        .assign(&c.admin, app.create_report(&c.resident), &c.collector)
        .await;

    let response = app
        .request(
            "GET",
            &format!("/api/tasks/{}", task["id"].as_str().unwrap()),
            None,
            Some(&stranger.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_attach_images_validates_body() {
    let app = TestApp::new();
    let c = cast(&app);
    let task = app
        .assign(&c.admin, app.create_report(&c.resident), &c.collector)
        .await;
    let path = format!("/api/tasks/{}/images", task["id"].as_str().unwrap());

    let empty = app
        .request("POST", &path, Some(json!({ "images": [] })), Some(&c.collector.token))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let ok = app
        .request(
            "POST",
            &path,
            Some(json!({ "images": ["https://cdn.example.org/p/1.jpg"] })),
            Some(&c.collector.token),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK, "{:?}", ok.body);
    assert_eq!(ok.body["data"]["images"][0], "https://cdn.example.org/p/1.jpg");
}
