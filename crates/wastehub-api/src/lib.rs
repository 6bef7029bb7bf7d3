//! # wastehub-api
//!
//! HTTP API layer for WasteHub built on Axum.
//!
//! Provides the REST endpoints for tasks, notifications, chat history, and
//! admin broadcasts, the WebSocket upgrade, middleware (rate limiting, CORS,
//! logging), extractors, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{assemble_state, build_app, build_state, run_server};
pub use error::ApiError;
pub use state::AppState;
