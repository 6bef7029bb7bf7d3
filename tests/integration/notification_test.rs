//! Integration tests for durable notifications over HTTP.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::{TestApp, TestUser};
use wastehub_core::types::ApplicationId;
use wastehub_entity::user::UserRole;

struct Cast {
    admin: TestUser,
    collector: TestUser,
    resident: TestUser,
}

async fn assigned(app: &TestApp) -> (Cast, String) {
    let c = Cast {
        admin: app.create_user(UserRole::Admin, "Ada Admin"),
        collector: app.create_user(UserRole::Collector, "Cole Collector"),
        resident: app.create_user(UserRole::Resident, "Rita Resident"),
    };
    let task = app
        .assign(&c.admin, app.create_report(&c.resident), &c.collector)
        .await;
    let id = task["id"].as_str().unwrap().to_string();
    (c, id)
}

async fn unread(app: &TestApp, user: &TestUser) -> u64 {
    let response = app
        .request("GET", "/api/notifications/unread-count", None, Some(&user.token))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    response.body["data"]["count"].as_u64().unwrap()
}

#[tokio::test]
async fn test_assignment_notifies_collector_and_resident() {
    let app = TestApp::new();
    let (c, _) = assigned(&app).await;

    let collector = app
        .request("GET", "/api/notifications", None, Some(&c.collector.token))
        .await;
    let resident = app
        .request("GET", "/api/notifications", None, Some(&c.resident.token))
        .await;

    assert_eq!(collector.body["data"]["items"][0]["type"], "task_assigned");
    assert_eq!(collector.body["data"]["items"][0]["priority"], "high");
    assert_eq!(resident.body["data"]["items"][0]["type"], "task_scheduled");
    assert_eq!(unread(&app, &c.admin).await, 0);
}

#[tokio::test]
async fn test_actor_is_not_notified_of_own_cancellation() {
    let app = TestApp::new();
    let (c, id) = assigned(&app).await;

    let response = app
        .request(
            "POST",
            &format!("/api/tasks/{id}/cancel"),
            Some(json!({ "reason": "Truck broke down" })),
            Some(&c.collector.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // Collector: only the assignment. Resident: scheduled + cancelled.
    assert_eq!(unread(&app, &c.collector).await, 1);
    assert_eq!(unread(&app, &c.resident).await, 2);

    let cancelled = app
        .request(
            "GET",
            "/api/notifications?type=task_cancelled",
            None,
            Some(&c.resident.token),
        )
        .await;
    let items = cancelled.body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert!(items[0]["message"].as_str().unwrap().contains("Truck broke down"));
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let app = TestApp::new();
    let (c, _) = assigned(&app).await;
    let list = app
        .request("GET", "/api/notifications", None, Some(&c.collector.token))
        .await;
    let nid = list.body["data"]["items"][0]["id"].as_str().unwrap().to_string();
    let path = format!("/api/notifications/{nid}/read");

    let first = app.request("PUT", &path, None, Some(&c.collector.token)).await;
    let second = app.request("PUT", &path, None, Some(&c.collector.token)).await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(first.body["data"]["read_at"], second.body["data"]["read_at"]);
    assert_eq!(unread(&app, &c.collector).await, 0);
}

#[tokio::test]
async fn test_mark_all_read_then_unread_count_is_zero() {
    let app = TestApp::new();
    let (c, id) = assigned(&app).await;
    app.request(
        "POST",
        &format!("/api/tasks/{id}/start"),
        None,
        Some(&c.collector.token),
    )
    .await;
    assert_eq!(unread(&app, &c.resident).await, 2);

    let response = app
        .request("PUT", "/api/notifications/read-all", None, Some(&c.resident.token))
        .await;

    assert_eq!(response.body["data"]["count"], 2);
    assert_eq!(unread(&app, &c.resident).await, 0);

    let read = app
        .request(
            "GET",
            "/api/notifications?is_read=true",
            None,
            Some(&c.resident.token),
        )
        .await;
    assert_eq!(read.body["data"]["total_items"], 2);
}

#[tokio::test]
async fn test_cannot_touch_someone_elses_notification() {
    let app = TestApp::new();
    let (c, _) = assigned(&app).await;
    let list = app
        .request("GET", "/api/notifications", None, Some(&c.collector.token))
        .await;
    let nid = list.body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    let read = app
        .request(
            "PUT",
            &format!("/api/notifications/{nid}/read"),
            None,
            Some(&c.resident.token),
        )
        .await;
    let delete = app
        .request(
            "DELETE",
            &format!("/api/notifications/{nid}"),
            None,
            Some(&c.resident.token),
        )
        .await;

    assert_eq!(read.status, StatusCode::FORBIDDEN);
    assert_eq!(read.error_code(), "FORBIDDEN");
    assert_eq!(delete.status, StatusCode::FORBIDDEN);
    assert_eq!(unread(&app, &c.collector).await, 1);
}

#[tokio::test]
async fn test_delete_and_clear_all() {
    let app = TestApp::new();
    let (c, id) = assigned(&app).await;
    app.request(
        "POST",
        &format!("/api/tasks/{id}/start"),
        None,
        Some(&c.collector.token),
    )
    .await;

    let list = app
        .request("GET", "/api/notifications", None, Some(&c.resident.token))
        .await;
    let nid = list.body["data"]["items"][0]["id"].as_str().unwrap().to_string();
    let deleted = app
        .request(
            "DELETE",
            &format!("/api/notifications/{nid}"),
            None,
            Some(&c.resident.token),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let again = app
        .request(
            "DELETE",
            &format!("/api/notifications/{nid}"),
            None,
            Some(&c.resident.token),
        )
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let cleared = app
        .request("DELETE", "/api/notifications", None, Some(&c.resident.token))
        .await;
    assert_eq!(cleared.body["data"]["count"], 1);
    assert_eq!(unread(&app, &c.resident).await, 0);
}

#[tokio::test]
async fn test_application_decision_notifies_applicant() {
    let app = TestApp::new();
    let admin = app.create_user(UserRole::Admin, "Ada Admin");
    let applicant = app.create_user(UserRole::Resident, "Andy Applicant");

    let response = app
        .request(
            "POST",
            &format!("/api/admin/applications/{}/decision", ApplicationId::new()),
            Some(json!({
                "applicant_id": applicant.id,
                "approved": false,
                "reason": "Licence expired",
            })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    let list = app
        .request("GET", "/api/notifications", None, Some(&applicant.token))
        .await;
    let item = &list.body["data"]["items"][0];
    assert_eq!(item["type"], "application_rejected");
    assert!(item["message"].as_str().unwrap().ends_with("Licence expired"));
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = TestApp::new();
    let collector = app.create_user(UserRole::Collector, "Cole Collector");

    let alert = app
        .request(
            "POST",
            "/api/admin/alerts",
            Some(json!({ "title": "Gas leak", "message": "Avoid Elm St" })),
            Some(&collector.token),
        )
        .await;
    let metrics = app
        .request("GET", "/api/admin/realtime", None, Some(&collector.token))
        .await;

    assert_eq!(alert.status, StatusCode::FORBIDDEN);
    assert_eq!(alert.error_code(), "UNAUTHORIZED");
    assert_eq!(metrics.status, StatusCode::FORBIDDEN);
}
