//! # Strategy Module
//!
//! Runtime caching strategies behind one contract: built from an
//! [`Engine`] and [`StrategyOptions`] without I/O, then asked to
//! [`Strategy::handle`] one request at a time.
//!
//! ## Available Strategies
//!
//! - `CacheFirst` - Serve from cache, fetch and write back on miss (default)
//! - `CacheOnly` - Serve from cache, fail on miss
//! - `NetworkFirst` - Fetch and write back, fall back to cache on failure
//! - `NetworkOnly` - Fetch, never touch the cache
//! - `StaleWhileRevalidate` - Serve from cache and refresh it in the background
//!
//! ## Example
//!
//! ```rust,ignore
//! use rtcache_strategies::{CacheFirst, Engine, EngineConfig, StrategyOptions};
//!
//! let engine = Engine::new(EngineConfig::from_env(), store, transport);
//! let strategy = CacheFirst::new(&engine, StrategyOptions::new().with_cache_name("images"));
//!
//! let response = strategy.handle(&ctx).await?;
//! ```

mod base;
pub mod cache_first;
pub mod cache_only;
pub mod network_first;
pub mod network_only;
pub mod stale_while_revalidate;

use async_trait::async_trait;
use rtcache_domain::Response;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::MatchOptions;
use crate::context::RequestContext;
use crate::engine::Engine;
use crate::error::Result;
use crate::fetch::FetchOptions;
use crate::plugin::SharedPlugin;

pub use cache_first::CacheFirst;
pub use cache_only::CacheOnly;
pub use network_first::NetworkFirst;
pub use network_only::NetworkOnly;
pub use stale_while_revalidate::StaleWhileRevalidate;

/// Uniform request-handling contract.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fully-qualified cache name resolved at construction.
    fn cache_name(&self) -> &str;

    fn plugins(&self) -> &[SharedPlugin];

    /// Produce a response for `ctx.request`, or fail so the router can fall
    /// back.
    async fn handle(&self, ctx: &RequestContext) -> Result<Response>;
}

/// Shared strategy handle
pub type SharedStrategy = Arc<dyn Strategy>;

/// Construction options common to every strategy.
#[derive(Clone, Default)]
pub struct StrategyOptions {
    /// Hint resolved into a cache name; the engine's default when `None`.
    pub cache_name: Option<String>,
    /// Run in this order for every hook.
    pub plugins: Vec<SharedPlugin>,
    pub match_options: MatchOptions,
    pub fetch_options: FetchOptions,
}

impl StrategyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_plugin(mut self, plugin: SharedPlugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    #[must_use]
    pub const fn with_match_options(mut self, options: MatchOptions) -> Self {
        self.match_options = options;
        self
    }

    #[must_use]
    pub const fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }
}

impl fmt::Debug for StrategyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyOptions")
            .field("cache_name", &self.cache_name)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("match_options", &self.match_options)
            .field("fetch_options", &self.fetch_options)
            .finish()
    }
}

// =============================================================================
// STRATEGY SELECTION
// =============================================================================

/// Strategy enum for configuration-driven selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    #[default]
    CacheFirst,
    CacheOnly,
    NetworkFirst,
    NetworkOnly,
    StaleWhileRevalidate,
}

impl StrategyKind {
    pub const ALL: [Self; 5] = [
        Self::CacheFirst,
        Self::CacheOnly,
        Self::NetworkFirst,
        Self::NetworkOnly,
        Self::StaleWhileRevalidate,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CacheFirst => "CacheFirst",
            Self::CacheOnly => "CacheOnly",
            Self::NetworkFirst => "NetworkFirst",
            Self::NetworkOnly => "NetworkOnly",
            Self::StaleWhileRevalidate => "StaleWhileRevalidate",
        }
    }

    /// Construct the strategy this kind names.
    pub fn build(self, engine: &Engine, options: StrategyOptions) -> SharedStrategy {
        match self {
            Self::CacheFirst => Arc::new(CacheFirst::new(engine, options)),
            Self::CacheOnly => Arc::new(CacheOnly::new(engine, options)),
            Self::NetworkFirst => Arc::new(NetworkFirst::new(engine, options)),
            Self::NetworkOnly => Arc::new(NetworkOnly::new(engine, options)),
            Self::StaleWhileRevalidate => Arc::new(StaleWhileRevalidate::new(engine, options)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown strategy: {0}")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    /// Accepts `CacheFirst`, `cache-first`, `cache_first` and so on.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}
