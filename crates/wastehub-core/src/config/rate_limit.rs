//! Rate limit tier configuration.

use serde::{Deserialize, Serialize};

/// One fixed-window tier: at most `max_requests` per `window_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Production ceiling for one window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_seconds: u64,
}

impl TierConfig {
    const fn new(max_requests: u32, window_minutes: u64) -> Self {
        Self {
            max_requests,
            window_seconds: window_minutes * 60,
        }
    }
}

/// Rate limit guard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Master switch.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Ceiling multiplier applied outside production.
    #[serde(default = "default_multiplier")]
    pub non_production_multiplier: u32,
    /// How often expired windows are swept, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Catch-all tier.
    #[serde(default = "default_general")]
    pub general: TierConfig,
    /// Authentication attempts; only failures are counted.
    #[serde(default = "default_auth")]
    pub auth: TierConfig,
    /// Password reset requests.
    #[serde(default = "default_password_reset")]
    pub password_reset: TierConfig,
    /// Read endpoints.
    #[serde(default = "default_read")]
    pub read: TierConfig,
    /// Mutating endpoints and chat sends.
    #[serde(default = "default_write")]
    pub write: TierConfig,
    /// Image attachment.
    #[serde(default = "default_upload")]
    pub upload: TierConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            non_production_multiplier: default_multiplier(),
            sweep_interval_seconds: default_sweep_interval(),
            general: default_general(),
            auth: default_auth(),
            password_reset: default_password_reset(),
            read: default_read(),
            write: default_write(),
            upload: default_upload(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_multiplier() -> u32 {
    10
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_general() -> TierConfig {
    TierConfig::new(100, 15)
}

fn default_auth() -> TierConfig {
    TierConfig::new(5, 15)
}

fn default_password_reset() -> TierConfig {
    TierConfig::new(3, 60)
}

fn default_read() -> TierConfig {
    TierConfig::new(200, 15)
}

fn default_write() -> TierConfig {
    TierConfig::new(50, 15)
}

fn default_upload() -> TierConfig {
    TierConfig::new(20, 60)
}
