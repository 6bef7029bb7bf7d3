//! Tiered fixed-window rate limiting.

pub mod guard;
pub mod tier;

pub use guard::RateLimitGuard;
pub use tier::RateLimitTier;
