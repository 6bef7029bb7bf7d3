//! Durable per-user notifications projected from domain events.

pub mod rules;
pub mod service;

pub use rules::project;
pub use service::NotificationService;
