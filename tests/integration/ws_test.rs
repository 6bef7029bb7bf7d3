//! End-to-end tests for the WebSocket gateway over a real socket.

mod helpers;

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use helpers::{TestApp, TestUser};
use wastehub_entity::user::UserRole;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve the test app's state on an ephemeral port.
async fn serve(app: &TestApp) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local addr");
    let router = wastehub_api::build_app(app.state.clone());
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });
    addr
}

async fn connect(addr: SocketAddr, user: &TestUser) -> Client {
    let url = format!("ws://{addr}/ws?token={}&user_id={}", user.token, user.id);
    let (mut ws, _) = connect_async(url).await.expect("Handshake failed");
    let connected = next_of_type(&mut ws, "connected").await;
    assert_eq!(connected["user_id"], json!(user.id));
    ws
}

async fn send(ws: &mut Client, frame: Value) {
    ws.send(Message::text(frame.to_string()))
        .await
        .expect("Send failed");
}

/// Read frames until one of `kind` arrives, skipping pings and others.
async fn next_of_type(ws: &mut Client, kind: &str) -> Value {
    let wait = async {
        while let Some(msg) = ws.next().await {
            let msg = msg.expect("Socket error");
            if let Message::Text(text) = msg {
                let frame: Value = serde_json::from_str(text.as_str()).expect("Bad frame");
                if frame["type"] == kind {
                    return frame;
                }
            }
        }
        panic!("Socket closed before a {kind} frame");
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .unwrap_or_else(|_| panic!("Timed out waiting for {kind}"))
}

#[tokio::test]
async fn test_handshake_rejects_mismatched_user() {
    let app = TestApp::new();
    let alice = app.create_user(UserRole::Resident, "Alice");
    let bob = app.create_user(UserRole::Resident, "Bob");
    let addr = serve(&app).await;

    let url = format!("ws://{addr}/ws?token={}&user_id={}", alice.token, bob.id);
    assert!(connect_async(url).await.is_err());
}

#[tokio::test]
async fn test_upgrade_without_token_is_refused() {
    let app = TestApp::new();
    let addr = serve(&app).await;

    let err = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect_err("Upgrade without a token must fail");
    match err {
        tokio_tungstenite::tungstenite::Error::Http(response) => {
            assert_eq!(response.status().as_u16(), StatusCode::UNAUTHORIZED.as_u16());
        }
        other => panic!("Expected an HTTP rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connected_frame_lists_auto_joined_rooms() {
    let app = TestApp::new();
    let collector = app.create_user(UserRole::Collector, "Cole");
    let addr = serve(&app).await;

    let url = format!(
        "ws://{addr}/ws?token={}&userId={}",
        collector.token, collector.id
    );
    let (mut ws, _) = connect_async(url).await.expect("Handshake failed");
    let connected = next_of_type(&mut ws, "connected").await;

    let rooms = connected["rooms"].as_array().unwrap();
    assert!(rooms.contains(&json!("role:collector")));
    assert!(rooms.contains(&json!(format!("user:{}", collector.id))));
}

#[tokio::test]
async fn test_task_start_reaches_task_room_and_admins() {
    let app = TestApp::new();
    let admin = app.create_user(UserRole::Admin, "Ada");
    let collector = app.create_user(UserRole::Collector, "Cole");
    let resident = app.create_user(UserRole::Resident, "Rita");
    let task = app
        .assign(&admin, app.create_report(&resident), &collector)
        .await;
    let id = task["id"].as_str().unwrap().to_string();
    let addr = serve(&app).await;

    let mut resident_ws = connect(addr, &resident).await;
    let mut admin_ws = connect(addr, &admin).await;
    send(&mut resident_ws, json!({ "type": "join_room", "room": format!("task:{id}") })).await;
    let joined = next_of_type(&mut resident_ws, "room_joined").await;
    assert_eq!(joined["room"], format!("task:{id}"));

    let started = app
        .request(
            "POST",
            &format!("/api/tasks/{id}/start"),
            None,
            Some(&collector.token),
        )
        .await;
    assert_eq!(started.status, StatusCode::OK);

    for ws in [&mut resident_ws, &mut admin_ws] {
        let update = next_of_type(ws, "task_update").await;
        assert_eq!(update["status"], "in_progress");
        assert_eq!(update["previous_status"], "scheduled");
        assert_eq!(update["task"]["id"], id.as_str());
    }

    let pushed = next_of_type(&mut resident_ws, "new_notification").await;
    assert_eq!(pushed["notification"]["type"], "task_started");
}

#[tokio::test]
async fn test_assignment_pushed_to_online_collector() {
    let app = TestApp::new();
    let admin = app.create_user(UserRole::Admin, "Ada");
    let collector = app.create_user(UserRole::Collector, "Cole");
    let resident = app.create_user(UserRole::Resident, "Rita");
    let addr = serve(&app).await;
    let mut ws = connect(addr, &collector).await;

    app.assign(&admin, app.create_report(&resident), &collector)
        .await;

    let assigned = next_of_type(&mut ws, "assign_task").await;
    assert_eq!(assigned["notes"], "Side gate is unlocked");
    let pushed = next_of_type(&mut ws, "new_notification").await;
    assert_eq!(pushed["notification"]["type"], "task_assigned");
}

#[tokio::test]
async fn test_dm_rooms_are_symmetric() {
    let app = TestApp::new();
    let alice = app.create_user(UserRole::Resident, "Alice");
    let bob = app.create_user(UserRole::Collector, "Bob");
    let addr = serve(&app).await;
    let mut alice_ws = connect(addr, &alice).await;
    let mut bob_ws = connect(addr, &bob).await;

    let a_view = format!("dm:{}:{}", alice.id, bob.id);
    let b_view = format!("dm:{}:{}", bob.id, alice.id);
    send(&mut alice_ws, json!({ "type": "join_room", "room": a_view })).await;
    send(&mut bob_ws, json!({ "type": "join_room", "room": b_view })).await;
    let a_joined = next_of_type(&mut alice_ws, "room_joined").await;
    let b_joined = next_of_type(&mut bob_ws, "room_joined").await;
    assert_eq!(a_joined["room"], b_joined["room"]);

    send(
        &mut alice_ws,
        json!({ "type": "send_message", "room": a_view, "body": "Bins are out", "client_id": "a-1" }),
    )
    .await;

    let echoed = next_of_type(&mut alice_ws, "new_message").await;
    assert_eq!(echoed["message"]["client_id"], "a-1");
    let received = next_of_type(&mut bob_ws, "new_message").await;
    assert_eq!(received["message"]["body"], "Bins are out");
    assert_eq!(received["message"]["sender_id"], json!(alice.id));
}

#[tokio::test]
async fn test_area_chat_is_in_history_right_after_send() {
    let app = TestApp::new();
    let collector = app.create_user(UserRole::Collector, "Cole");
    let addr = serve(&app).await;
    let mut ws = connect(addr, &collector).await;

    send(&mut ws, json!({ "type": "join_room", "room": "area:51.5072,-0.1276" })).await;
    let joined = next_of_type(&mut ws, "room_joined").await;
    let room = joined["room"].as_str().unwrap().to_string();
    assert_eq!(room, "area:51.50,-0.12");

    send(
        &mut ws,
        json!({ "type": "send_message", "room": room, "message": "Road closed at the bridge" }),
    )
    .await;
    next_of_type(&mut ws, "new_message").await;

    let history = app
        .request(
            "GET",
            &format!("/api/chat/rooms/{room}/messages"),
            None,
            Some(&collector.token),
        )
        .await;
    assert_eq!(history.status, StatusCode::OK, "{:?}", history.body);
    let messages = history.body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["body"], "Road closed at the bridge");
}

#[tokio::test]
async fn test_send_without_join_is_refused_with_client_id() {
    let app = TestApp::new();
    let resident = app.create_user(UserRole::Resident, "Rita");
    let addr = serve(&app).await;
    let mut ws = connect(addr, &resident).await;

    send(
        &mut ws,
        json!({ "type": "send_message", "room": "area:10.00,10.00", "body": "hello", "client_id": "r-9" }),
    )
    .await;

    let error = next_of_type(&mut ws, "error").await;
    assert_eq!(error["code"], "FORBIDDEN");
    assert_eq!(error["client_id"], "r-9");
}

#[tokio::test]
async fn test_emergency_alert_reaches_collectors_only() {
    let app = TestApp::new();
    let admin = app.create_user(UserRole::Admin, "Ada");
    let collector = app.create_user(UserRole::Collector, "Cole");
    let addr = serve(&app).await;
    let mut ws = connect(addr, &collector).await;

    let response = app
        .request(
            "POST",
            "/api/admin/alerts",
            Some(json!({ "title": "Gas leak", "message": "Avoid Elm St", "severity": "high" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["delivery"]["sessions"], 1);

    let alert = next_of_type(&mut ws, "emergency_alert").await;
    assert_eq!(alert["title"], "Gas leak");
    assert_eq!(alert["severity"], "high");
}
