//! Cache access orchestrator: plugin hooks around store reads and writes.

use http::{Method, StatusCode};
use rtcache_domain::{Request, Response};
use std::sync::Arc;

use super::store::{MatchOptions, SharedCacheStore, StoreError};
use crate::error::{Result, StrategyError};
use crate::lifecycle::BackgroundTask;
use crate::plugin::{Hook, HookContext, Pipeline, SharedPlugin};

/// Outcome of a lookup: the key the plugins settled on, and the entry if
/// one survived `cached_response_will_be_used`.
///
/// Strategies write back under `key` so a lookup and its write-back always
/// agree on the key.
#[derive(Debug)]
pub struct CacheLookup {
    pub key: Request,
    pub response: Option<Response>,
}

/// Runs the cache hooks around a [`CacheStore`](super::CacheStore).
#[derive(Clone)]
pub struct CacheWrapper {
    store: SharedCacheStore,
}

impl CacheWrapper {
    pub fn new(store: SharedCacheStore) -> Self {
        Self { store }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Resolve the key, read the store, and let plugins veto or replace a hit.
    ///
    /// A miss is `response: None`, never an error. Read faults are treated as
    /// misses unless the store is unreachable.
    ///
    /// # Errors
    ///
    /// [`StrategyError::CacheRead`] when the store is unavailable, and
    /// [`StrategyError::PluginHook`] when a value hook fails.
    pub async fn lookup(
        &self,
        ctx: &HookContext,
        request: &Request,
        options: &MatchOptions,
        plugins: &[SharedPlugin],
    ) -> Result<CacheLookup> {
        let pipeline = Pipeline::new(plugins, ctx);
        let key = pipeline.cache_key_will_be_used(request.clone()).await?;

        let cached = match self.store.get(&ctx.cache_name, &key, options).await {
            Ok(cached) => cached,
            Err(e @ StoreError::Unavailable(_)) => return Err(StrategyError::CacheRead(e)),
            Err(e) => {
                tracing::warn!(
                    cache_name = %ctx.cache_name,
                    url = %key.url,
                    error = %e,
                    "Cache read failed, treating as miss"
                );
                None
            }
        };

        let response = match cached {
            Some(response) => {
                tracing::debug!(cache_name = %ctx.cache_name, url = %key.url, "Cache hit");
                pipeline.cached_response_will_be_used(&key, response).await?
            }
            None => {
                tracing::debug!(cache_name = %ctx.cache_name, url = %key.url, "Cache miss");
                None
            }
        };

        Ok(CacheLookup { key, response })
    }

    /// [`CacheWrapper::lookup`] without the resolved key.
    ///
    /// # Errors
    ///
    /// Same as [`CacheWrapper::lookup`].
    pub async fn match_response(
        &self,
        ctx: &HookContext,
        request: &Request,
        options: &MatchOptions,
        plugins: &[SharedPlugin],
    ) -> Result<Option<Response>> {
        Ok(self.lookup(ctx, request, options, plugins).await?.response)
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Resolve the key for `request`, then [`CacheWrapper::write`].
    ///
    /// # Errors
    ///
    /// Same as [`CacheWrapper::write`].
    pub async fn put(
        &self,
        ctx: &HookContext,
        request: &Request,
        response: Response,
        plugins: &[SharedPlugin],
    ) -> Result<()> {
        let key = Pipeline::new(plugins, ctx)
            .cache_key_will_be_used(request.clone())
            .await?;
        self.write(ctx, key, response, plugins).await
    }

    /// Persist `response` under an already-resolved `key`.
    ///
    /// `cache_will_update` decides cacheability (default: status 200 only).
    /// `cache_did_update` observers see the previous entry, which is only
    /// read when some plugin implements the hook.
    ///
    /// # Errors
    ///
    /// [`StrategyError::NonGetCacheWrite`] for non-GET keys,
    /// [`StrategyError::CacheWrite`] when the store rejects the write, and
    /// [`StrategyError::PluginHook`] when plugins fail.
    pub async fn write(
        &self,
        ctx: &HookContext,
        key: Request,
        response: Response,
        plugins: &[SharedPlugin],
    ) -> Result<()> {
        if key.method != Method::GET {
            return Err(StrategyError::NonGetCacheWrite {
                method: key.method,
                url: key.url,
            });
        }

        let pipeline = Pipeline::new(plugins, ctx);
        let cacheable = pipeline
            .cache_will_update(&key, &response)
            .await?
            .unwrap_or_else(|| default_cacheable(&response));

        if !cacheable {
            tracing::debug!(
                cache_name = %ctx.cache_name,
                url = %key.url,
                status = response.status.as_u16(),
                "Response not cacheable, skipping write"
            );
            return Ok(());
        }

        let observed = if pipeline.has(Hook::CacheDidUpdate) {
            let old = self
                .store
                .get(&ctx.cache_name, &key, &MatchOptions::default())
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Could not read previous cache entry");
                    None
                });
            Some((old, response.try_clone()?))
        } else {
            None
        };

        self.store
            .put(&ctx.cache_name, &key, response)
            .await
            .map_err(StrategyError::CacheWrite)?;
        tracing::debug!(cache_name = %ctx.cache_name, url = %key.url, "Cache updated");

        if let Some((old, new)) = observed {
            pipeline.cache_did_update(&key, old.as_ref(), &new).await?;
        }
        Ok(())
    }

    /// [`CacheWrapper::write`] packaged as a task for a lifetime extender.
    pub fn write_task(
        &self,
        ctx: HookContext,
        key: Request,
        response: Response,
        plugins: Arc<[SharedPlugin]>,
    ) -> BackgroundTask {
        let cache = self.clone();
        Box::pin(async move { cache.write(&ctx, key, response, &plugins).await })
    }

    /// [`CacheWrapper::put`] packaged as a task for a lifetime extender.
    pub fn put_task(
        &self,
        ctx: HookContext,
        request: Request,
        response: Response,
        plugins: Arc<[SharedPlugin]>,
    ) -> BackgroundTask {
        let cache = self.clone();
        Box::pin(async move { cache.put(&ctx, &request, response, &plugins).await })
    }
}

fn default_cacheable(response: &Response) -> bool {
    response.status == StatusCode::OK && !response.is_opaque()
}
