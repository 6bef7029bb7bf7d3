//! Custom Axum extractors.

pub mod auth;
pub mod client_ip;
pub mod if_match;
pub mod json;
pub mod pagination;

pub use auth::AuthUser;
pub use client_ip::ClientIp;
pub use if_match::IfMatch;
pub use json::ValidatedJson;
pub use pagination::PaginationParams;
