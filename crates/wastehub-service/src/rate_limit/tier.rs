//! Operation classes with independent windows.

use std::fmt;

use serde::{Deserialize, Serialize};

use wastehub_core::config::rate_limit::{RateLimitConfig, TierConfig};

/// One operation class. Each route group maps to exactly one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitTier {
    /// Catch-all.
    General,
    /// Authentication attempts; only failures are charged.
    Auth,
    /// Password reset requests.
    PasswordReset,
    /// Read endpoints.
    Read,
    /// Mutations and chat sends.
    Write,
    /// Image attachment.
    Upload,
}

impl RateLimitTier {
    /// Every tier.
    pub const ALL: [Self; 6] = [
        Self::General,
        Self::Auth,
        Self::PasswordReset,
        Self::Read,
        Self::Write,
        Self::Upload,
    ];

    /// The tier's configured window and production ceiling.
    pub fn config(self, config: &RateLimitConfig) -> TierConfig {
        match self {
            Self::General => config.general,
            Self::Auth => config.auth,
            Self::PasswordReset => config.password_reset,
            Self::Read => config.read,
            Self::Write => config.write,
            Self::Upload => config.upload,
        }
    }

    /// Whether only failed attempts are charged.
    pub fn counts_failures_only(self) -> bool {
        matches!(self, Self::Auth)
    }

    /// Returns the tier as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::PasswordReset => "password_reset",
            Self::Read => "read",
            Self::Write => "write",
            Self::Upload => "upload",
        }
    }
}

impl fmt::Display for RateLimitTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
