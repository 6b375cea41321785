//! # Runtime Caching Strategies
//!
//! Decides, per outgoing request, whether to answer from a response cache,
//! from the network, or from both, running an ordered list of plugins
//! around every cache and network step.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Routing Layer                          │
//! │          (selects a strategy, builds RequestContext)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Strategies                           │
//! │  CacheFirst, CacheOnly, NetworkFirst, NetworkOnly, SWR       │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │      CacheWrapper       │   │        FetchWrapper          │
//! │  key / hit / write hooks│   │  request / result hooks      │
//! └─────────────────────────┘   └──────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │       CacheStore        │   │          Transport           │
//! │   (memory, Redis)       │   │          (reqwest)           │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! Cache writes that follow a network fetch never delay the response: they
//! are handed to the request's [`ExtendableEvent`] as background tasks, and
//! the host tracks them to completion.
//!
//! ## Features
//!
//! - `redis`: Enable the Redis cache store (default)
//! - `reqwest`: Enable the reqwest transport (default)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rtcache_strategies::{
//!     CacheFirst, Engine, EngineConfig, ExtendableEvent, MemoryCacheStore,
//!     ReqwestTransport, RequestContext, Strategy, StrategyOptions, TaskRegistry,
//! };
//!
//! let engine = Engine::new(
//!     EngineConfig::from_env(),
//!     Arc::new(MemoryCacheStore::new()),
//!     Arc::new(ReqwestTransport::new()),
//! );
//! let strategy = CacheFirst::new(&engine, StrategyOptions::new().with_cache_name("images"));
//!
//! let registry = Arc::new(TaskRegistry::new());
//! let ctx = RequestContext::new(request, ExtendableEvent::fetch(registry.clone()));
//! let response = strategy.handle(&ctx).await?;
//!
//! // Before shutdown
//! registry.drain().await;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod naming;
pub mod plugin;
pub mod strategy;

// Re-export commonly used types
pub use cache::{CacheLookup, CacheStore, CacheWrapper, MatchOptions, MemoryCacheStore, StoreError};
#[cfg(feature = "redis")]
pub use cache::{RedisCacheStore, RedisStoreConfig};
pub use config::EngineConfig;
pub use context::{EventKind, ExtendableEvent, RequestContext};
pub use diagnostics::{DiagnosticsReport, DiagnosticsSink, NoopSink, TracingSink};
pub use engine::Engine;
pub use error::{PluginFailure, Result, StrategyError};
#[cfg(feature = "reqwest")]
pub use fetch::ReqwestTransport;
pub use fetch::{FetchOptions, FetchWrapper, Transport, TransportError, TransportErrorKind};
pub use lifecycle::{BackgroundTask, LifetimeExtender, TaskRegistry};
pub use naming::{CacheNames, DefaultCacheNames};
pub use plugin::{CacheOkAndOpaque, Hook, HookContext, HookSet, Plugin, PluginError, SharedPlugin};
pub use strategy::{
    CacheFirst, CacheOnly, NetworkFirst, NetworkOnly, SharedStrategy, StaleWhileRevalidate,
    Strategy, StrategyKind, StrategyOptions, UnknownStrategy,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
