//! Cache store capability.

use async_trait::async_trait;
use rtcache_domain::{Request, Response};
use std::sync::Arc;
use thiserror::Error;

/// Lookup relaxations passed through to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Compare URLs without their query string.
    pub ignore_search: bool,
    /// Match regardless of request method.
    pub ignore_method: bool,
}

/// Cache store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store cannot be reached at all.
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    #[error("Cache read error: {0}")]
    Read(String),

    #[error("Cache write error: {0}")]
    Write(String),

    #[error("Quota exceeded for cache {cache_name}")]
    QuotaExceeded { cache_name: String },

    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),
}

/// Persistent, namespaced key to response store.
///
/// Writes are last-write-wins per key; the engine adds no locking on top.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Find the entry filed under `key` in cache `cache_name`.
    async fn get(
        &self,
        cache_name: &str,
        key: &Request,
        options: &MatchOptions,
    ) -> Result<Option<Response>, StoreError>;

    /// File `response` under `key`, replacing any previous entry.
    async fn put(&self, cache_name: &str, key: &Request, response: Response) -> Result<(), StoreError>;
}

/// Shared cache store handle
pub type SharedCacheStore = Arc<dyn CacheStore>;
