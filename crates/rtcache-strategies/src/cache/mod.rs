//! # Cache Module
//!
//! The cache access orchestrator and the cache stores it runs against.
//!
//! - [`CacheWrapper`] - plugin hooks around lookups and writes
//! - [`CacheStore`] - the namespaced key/response store capability
//! - [`MemoryCacheStore`] - in-process store
//! - [`RedisCacheStore`] - Redis-backed store (feature `redis`)

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod store;
pub mod wrapper;

pub use memory::MemoryCacheStore;
#[cfg(feature = "redis")]
pub use redis_store::{RedisCacheStore, RedisStoreConfig};
pub use store::{CacheStore, MatchOptions, SharedCacheStore, StoreError};
pub use wrapper::{CacheLookup, CacheWrapper};
