//! # Proxy Configuration
//!
//! Environment-based configuration for the caching proxy.
//!
//! | Variable | Default |
//! |---|---|
//! | `SERVER_ADDR` | `0.0.0.0:8080` |
//! | `UPSTREAM_URL` | `http://127.0.0.1:3000` (must be absolute) |
//! | `STRATEGY` | `cache-first` |
//! | `CACHE_NAME` | generated runtime name |
//! | `CACHE_BACKEND` | `memory` (or `redis`) |
//! | `REDIS_URL` | `redis://127.0.0.1:6379` |
//! | `CACHE_TTL_SECS` | unset (`0` also means unset) |
//! | `FETCH_TIMEOUT_MS` | unset (`0` also means unset) |
//! | `LOG_LEVEL` | `info` |
//! | `RTCACHE_ENV` | development |
//!
//! The engine runs in development mode unless `RTCACHE_ENV=production`:
//! every request is checked for a fetch event and diagnostics are reported.
//! Production deployments should always set it.

use rtcache_strategies::{EngineConfig, StrategyKind};
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_UPSTREAM: &str = "http://127.0.0.1:3000";

/// Configuration that cannot fall back to a default.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid UPSTREAM_URL '{value}': {source}")]
    InvalidUpstream {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Where cached responses live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown cache backend '{other}'")),
        }
    }
}

/// Redis connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub url: String,
    pub ttl: Option<Duration>,
}

/// Proxy server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub server_addr: SocketAddr,

    /// Origin every request is forwarded to
    pub upstream_url: Url,

    /// Strategy answering every request
    pub strategy: StrategyKind,

    /// Cache name hint; the engine's runtime name when absent
    pub cache_name: Option<String>,

    pub cache_backend: CacheBackend,

    /// Redis configuration, used when `cache_backend` is Redis
    pub redis: RedisConfig,

    /// Per-request upstream timeout
    pub fetch_timeout: Option<Duration>,

    /// Logging level
    pub log_level: String,

    pub engine: EngineConfig,

    /// Values that could not be parsed and fell back to defaults. Logged
    /// once tracing is up.
    pub warnings: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `UPSTREAM_URL` is not an absolute URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|key| env::var(key).ok())?;
        config.engine = EngineConfig::from_env();
        Ok(config)
    }

    /// Load configuration from any key/value source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `UPSTREAM_URL` is not an absolute URL.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut warnings = Vec::new();

        let upstream = value("UPSTREAM_URL").unwrap_or_else(|| DEFAULT_UPSTREAM.to_string());
        let upstream_url = Url::parse(&upstream).map_err(|source| ConfigError::InvalidUpstream {
            value: upstream.clone(),
            source,
        })?;

        Ok(Self {
            server_addr: parsed(&mut warnings, "SERVER_ADDR", value("SERVER_ADDR"), || {
                SocketAddr::from(([0, 0, 0, 0], 8080))
            }),
            upstream_url,
            strategy: parsed(&mut warnings, "STRATEGY", value("STRATEGY"), StrategyKind::default),
            cache_name: value("CACHE_NAME"),
            cache_backend: parsed(&mut warnings, "CACHE_BACKEND", value("CACHE_BACKEND"), CacheBackend::default),
            redis: RedisConfig {
                url: value("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
                ttl: positive(&mut warnings, "CACHE_TTL_SECS", value("CACHE_TTL_SECS")).map(Duration::from_secs),
            },
            fetch_timeout: positive(&mut warnings, "FETCH_TIMEOUT_MS", value("FETCH_TIMEOUT_MS"))
                .map(Duration::from_millis),
            log_level: value("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            engine: EngineConfig::default(),
            warnings,
        })
    }
}

fn parsed<T>(warnings: &mut Vec<String>, key: &str, raw: Option<String>, default: impl FnOnce() -> T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = raw else {
        return default();
    };
    raw.trim().parse().unwrap_or_else(|e| {
        warnings.push(format!("Invalid {key} '{raw}' ({e}), using default"));
        default()
    })
}

/// Zero means unset.
fn positive(warnings: &mut Vec<String>, key: &str, raw: Option<String>) -> Option<u64> {
    Some(parsed(warnings, key, raw, || 0_u64)).filter(|v| *v > 0)
}
