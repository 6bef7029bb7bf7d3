//! # wastehub-realtime
//!
//! Real-time engine for WasteHub. Provides:
//!
//! - Deterministic room keys (`role:`, `area:`, `dm:`, `task:`, `user:`)
//!   and a sharded room registry with per-room and per-session ceilings
//! - Event dispatch from domain events to every joined session
//! - Durable notification fan-out with live `new_notification` pushes
//! - A session gateway that authenticates, tracks, and reaps connections
//!
//! The transport itself lives in the API crate; everything here works on
//! bounded per-session queues of serialized frames.

pub mod channel;
pub mod connection;
pub mod dispatch;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod server;

pub use channel::registry::RoomRegistry;
pub use channel::room::{AreaGrid, RoomId};
pub use connection::gateway::SessionGateway;
pub use dispatch::dispatcher::EventDispatcher;
pub use notification::fanout::NotificationFanout;
pub use server::RealtimeEngine;
