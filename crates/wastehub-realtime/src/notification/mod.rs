//! Durable notification fan-out.

pub mod fanout;

pub use fanout::NotificationFanout;
