//! In-process cache store.

use async_trait::async_trait;
use http::Method;
use parking_lot::RwLock;
use rtcache_domain::{Request, Response, StoredResponse};
use std::collections::{BTreeMap, HashMap};
use url::Url;

use super::store::{CacheStore, MatchOptions, StoreError};

struct Entry {
    method: Method,
    url: Url,
    response: StoredResponse,
}

impl Entry {
    fn matches(&self, key: &Request, options: &MatchOptions) -> bool {
        if !options.ignore_method && self.method != key.method {
            return false;
        }
        if options.ignore_search {
            let mut url = self.url.clone();
            url.set_query(None);
            url.set_fragment(None);
            url == key.url_without_search()
        } else {
            self.url == key.url
        }
    }
}

/// Cache store held in memory, one map per cache name.
#[derive(Default)]
pub struct MemoryCacheStore {
    caches: RwLock<HashMap<String, BTreeMap<String, Entry>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in `cache_name`.
    pub fn entry_count(&self, cache_name: &str) -> usize {
        self.caches.read().get(cache_name).map_or(0, BTreeMap::len)
    }

    /// Remove the entry filed under `key`, returning whether one existed.
    pub fn delete(&self, cache_name: &str, key: &Request) -> bool {
        self.caches
            .write()
            .get_mut(cache_name)
            .is_some_and(|cache| cache.remove(&key.cache_key()).is_some())
    }

    /// Drop a whole cache.
    pub fn clear(&self, cache_name: &str) -> bool {
        self.caches.write().remove(cache_name).is_some()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(
        &self,
        cache_name: &str,
        key: &Request,
        options: &MatchOptions,
    ) -> Result<Option<Response>, StoreError> {
        let caches = self.caches.read();
        let Some(cache) = caches.get(cache_name) else {
            return Ok(None);
        };

        let entry = if *options == MatchOptions::default() {
            cache.get(&key.cache_key())
        } else {
            cache.values().find(|entry| entry.matches(key, options))
        };

        entry
            .map(|entry| entry.response.to_response())
            .transpose()
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    async fn put(&self, cache_name: &str, key: &Request, response: Response) -> Result<(), StoreError> {
        let stored = response
            .into_stored()
            .map_err(|e| StoreError::Write(e.to_string()))?;

        self.caches
            .write()
            .entry(cache_name.to_string())
            .or_default()
            .insert(
                key.cache_key(),
                Entry {
                    method: key.method.clone(),
                    url: key.url.clone(),
                    response: stored,
                },
            );
        Ok(())
    }
}
