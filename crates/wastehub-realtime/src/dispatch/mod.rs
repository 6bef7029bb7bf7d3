//! Event delivery to joined sessions.

pub mod dispatcher;

pub use dispatcher::{DispatchReport, EventDispatcher};
