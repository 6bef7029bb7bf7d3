//! Pickup task entities.

pub mod history;
pub mod model;
pub mod snapshot;
pub mod status;

pub use history::TaskStatusChange;
pub use model::PickupTask;
pub use snapshot::TaskSnapshot;
pub use status::TaskStatus;
