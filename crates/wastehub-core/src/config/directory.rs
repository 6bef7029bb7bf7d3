//! Directory lookup cache configuration.

use serde::{Deserialize, Serialize};

/// Caching of report and user lookups used to enrich task events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Time-to-live of cached entries in seconds.
    #[serde(default = "default_ttl")]
    pub cache_ttl_seconds: u64,
    /// Maximum number of cached entries per directory.
    #[serde(default = "default_capacity")]
    pub cache_capacity: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: default_ttl(),
            cache_capacity: default_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_capacity() -> u64 {
    10_000
}
