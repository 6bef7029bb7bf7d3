//! # wastehub-database
//!
//! Persistence for WasteHub. The [`store`] module defines the traits the
//! service layer depends on; [`postgres`] implements them on `sqlx` and
//! [`memory`] implements them on concurrent maps for tests and
//! single-node development. [`Stores::from_config`] picks the backend.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;

pub use connection::DatabasePool;
pub use store::Stores;
