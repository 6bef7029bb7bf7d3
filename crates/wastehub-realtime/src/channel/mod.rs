//! Rooms: keys, membership, access, and event routing.

pub mod access;
pub mod registry;
pub mod resolver;
pub mod room;
