//! WebSocket message types, encoding, and validation.

pub mod builder;
pub mod timeline;
pub mod types;
pub mod validator;

use std::sync::Arc;

/// One serialized outbound frame, shared by every session it is pushed to.
pub type Frame = Arc<str>;
