//! Pickup task lifecycle.

pub mod service;
pub mod state_machine;

pub use service::{AssignTask, TaskOutcome, TaskService};
pub use state_machine::TaskAction;
