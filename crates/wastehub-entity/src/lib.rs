//! # wastehub-entity
//!
//! Domain entities for WasteHub: pickup tasks and their status history,
//! notifications, chat messages, directory records for users and reports,
//! and the [`event::DomainEvent`] union that ties them together.

pub mod chat;
pub mod event;
pub mod notification;
pub mod report;
pub mod task;
pub mod user;
