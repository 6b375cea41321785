//! # Engine Configuration
//!
//! Environment-based settings read once at startup.

use std::env;

/// Engine-wide configuration shared by every strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Development mode enables context assertions and diagnostics reports.
    pub development: bool,

    /// First segment of generated cache names.
    pub cache_prefix: String,

    /// Optional last segment of generated cache names (e.g. a scope).
    pub cache_suffix: Option<String>,
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            development: env::var("RTCACHE_ENV")
                .map(|v| !v.eq_ignore_ascii_case("production"))
                .unwrap_or(defaults.development),

            cache_prefix: env::var("RTCACHE_CACHE_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cache_prefix),

            cache_suffix: env::var("RTCACHE_CACHE_SUFFIX")
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }

    /// Production settings: no assertions, no diagnostics.
    #[must_use]
    pub fn production() -> Self {
        Self {
            development: false,
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            development: true,
            cache_prefix: "rtcache".to_string(),
            cache_suffix: None,
        }
    }
}
