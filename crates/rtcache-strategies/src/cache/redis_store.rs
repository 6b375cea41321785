//! # Redis Cache Store
//!
//! Responses are stored as JSON-encoded [`StoredResponse`] values under
//! `<cache_name>:<METHOD> <url>`, optionally with a TTL.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use rtcache_domain::{Request, Response, StoredResponse};
use std::time::Duration;
use url::Url;

use super::store::{CacheStore, MatchOptions, StoreError};

/// Redis store configuration
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    pub url: String,
    /// Expiry applied to every write; `None` keeps entries until replaced.
    pub ttl: Option<Duration>,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            ttl: None,
        }
    }
}

/// Redis-backed cache store with a managed, auto-reconnecting connection
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
    config: RedisStoreConfig,
}

impl RedisCacheStore {
    /// Connect to Redis.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URL is invalid or the
    /// server cannot be reached.
    pub async fn new(config: RedisStoreConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.url.as_str()).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self { conn, config })
    }

    /// Get raw connection for advanced operations
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Delete the entry filed under `key`
    pub async fn delete(&self, cache_name: &str, key: &Request) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = conn
            .del(entry_key(cache_name, key))
            .await
            .map_err(read_error)?;
        Ok(deleted > 0)
    }

    /// Find the Redis key to read when match options relax the lookup.
    async fn find_relaxed(
        &self,
        cache_name: &str,
        key: &Request,
        options: &MatchOptions,
    ) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        // KEYS walks the keyspace; relaxed matching is expected to be rare.
        let mut candidates: Vec<String> = conn
            .keys(relaxed_pattern(cache_name, key, options))
            .await
            .map_err(read_error)?;
        candidates.sort();

        let wanted = key.url_without_search();
        let prefix_len = cache_name.len() + 1;
        Ok(candidates.into_iter().find(|candidate| {
            let Some((method, url)) = candidate.get(prefix_len..).and_then(|rest| rest.split_once(' ')) else {
                return false;
            };
            if !options.ignore_method && method != key.method.as_str() {
                return false;
            }
            Url::parse(url).is_ok_and(|mut url| {
                if options.ignore_search {
                    url.set_query(None);
                    url.set_fragment(None);
                    url == wanted
                } else {
                    url == key.url
                }
            })
        }))
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(
        &self,
        cache_name: &str,
        key: &Request,
        options: &MatchOptions,
    ) -> Result<Option<Response>, StoreError> {
        let redis_key = if *options == MatchOptions::default() {
            entry_key(cache_name, key)
        } else {
            match self.find_relaxed(cache_name, key, options).await? {
                Some(found) => found,
                None => return Ok(None),
            }
        };

        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(&redis_key).await.map_err(read_error)?;

        match value {
            Some(json) => {
                let stored: StoredResponse =
                    serde_json::from_str(&json).map_err(|e| StoreError::Corrupt(e.to_string()))?;
                let response = stored
                    .to_response()
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                Ok(Some(response))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, cache_name: &str, key: &Request, response: Response) -> Result<(), StoreError> {
        let stored = response
            .into_stored()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        let json = serde_json::to_string(&stored).map_err(|e| StoreError::Write(e.to_string()))?;

        let redis_key = entry_key(cache_name, key);
        let mut conn = self.conn.clone();
        let written: Result<(), RedisError> = match self.config.ttl {
            Some(ttl) => conn.set_ex(&redis_key, json, ttl.as_secs().max(1)).await,
            None => conn.set(&redis_key, json).await,
        };

        written.map_err(|e| write_error(cache_name, &e))
    }
}

fn entry_key(cache_name: &str, key: &Request) -> String {
    format!("{cache_name}:{}", key.cache_key())
}

fn relaxed_pattern(cache_name: &str, key: &Request, options: &MatchOptions) -> String {
    let method = if options.ignore_method {
        "*".to_string()
    } else {
        escape_glob(key.method.as_str())
    };
    let url = if options.ignore_search {
        format!("{}*", escape_glob(key.url_without_search().as_str()))
    } else {
        escape_glob(key.url.as_str())
    };
    format!("{}:{method} {url}", escape_glob(cache_name))
}

fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn is_unreachable(err: &RedisError) -> bool {
    err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() || err.is_timeout()
}

fn read_error(err: RedisError) -> StoreError {
    if is_unreachable(&err) {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Read(err.to_string())
    }
}

fn write_error(cache_name: &str, err: &RedisError) -> StoreError {
    if err.code() == Some("OOM") {
        StoreError::QuotaExceeded {
            cache_name: cache_name.to_string(),
        }
    } else if is_unreachable(err) {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Write(err.to_string())
    }
}
