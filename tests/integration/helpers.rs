//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use wastehub_api::AppState;
use wastehub_auth::JwtEncoder;
use wastehub_core::config::AppConfig;
use wastehub_core::types::{ReportId, UserId};
use wastehub_database::Stores;
use wastehub_database::memory::MemoryDirectory;
use wastehub_entity::report::ReportSummary;
use wastehub_entity::user::{UserProfile, UserRole};

/// A seeded user with a valid session token.
#[derive(Debug, Clone)]
pub struct TestUser {
    /// User id.
    pub id: UserId,
    /// Role.
    pub role: UserRole,
    /// Bearer token.
    pub token: String,
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for reaching the realtime engine directly
    pub state: AppState,
    /// Directory the stores read users and reports from
    pub directory: Arc<MemoryDirectory>,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a new test application on the in-memory backend
    pub fn new() -> Self {
        Self::with_config(AppConfig::for_tests())
    }

    /// Create a test application with custom configuration
    pub fn with_config(config: AppConfig) -> Self {
        let directory = Arc::new(MemoryDirectory::new());
        let stores = Stores::memory(directory.clone());
        let state = wastehub_api::assemble_state(config.clone(), stores);
        let router = wastehub_api::build_app(state.clone());
        Self {
            router,
            state,
            directory,
            config,
        }
    }

    /// Seed a user in the directory and mint a token for them
    pub fn create_user(&self, role: UserRole, name: &str) -> TestUser {
        let id = UserId::new();
        self.directory.upsert_user(UserProfile {
            id,
            name: name.to_string(),
            role,
        });
        let token = JwtEncoder::new(&self.config.auth)
            .issue(id, role, name)
            .expect("Failed to issue token");
        TestUser { id, role, token }
    }

    /// Seed a report filed by `resident`
    pub fn create_report(&self, resident: &TestUser) -> ReportId {
        let id = ReportId::new();
        self.directory.upsert_report(ReportSummary {
            id,
            resident_id: resident.id,
            title: "Overflowing bins".to_string(),
            address: "12 Harbour Road".to_string(),
            latitude: 51.5072,
            longitude: -0.1276,
            waste_type: "household".to_string(),
        });
        id
    }

    /// Assign `collector` to `report` as `admin`; returns the task JSON
    pub async fn assign(&self, admin: &TestUser, report: ReportId, collector: &TestUser) -> Value {
        let body = json!({
            "report_id": report,
            "collector_id": collector.id,
            "scheduled_date": Utc::now() + Duration::hours(3),
            "estimated_duration_minutes": 45,
            "notes": "Side gate is unlocked",
        });
        let response = self
            .request("POST", "/api/tasks", Some(body), Some(&admin.token))
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Assign failed: {:?}",
            response.body
        );
        response.body["data"].clone()
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.request_with_headers(method, path, body, token, &[])
            .await
    }

    /// Make an HTTP request with extra headers
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `error` code of a failed response.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
