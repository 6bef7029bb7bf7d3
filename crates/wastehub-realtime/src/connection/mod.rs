//! Session lifecycle: authentication, tracking, inbound handling, heartbeats.

pub mod authenticator;
pub mod gateway;
pub mod handle;
pub mod heartbeat;
pub mod pool;
