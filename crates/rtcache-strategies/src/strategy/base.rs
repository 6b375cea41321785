//! State and steps shared by every strategy.

use rtcache_domain::{Request, Response};
use std::sync::Arc;

use super::StrategyOptions;
use crate::cache::{CacheLookup, CacheWrapper, MatchOptions};
use crate::context::{EventKind, RequestContext};
use crate::diagnostics::{DiagnosticsSink, Trace};
use crate::engine::Engine;
use crate::error::{Result, StrategyError};
use crate::fetch::{FetchOptions, FetchWrapper};
use crate::lifecycle::BackgroundTask;
use crate::plugin::{CacheOkAndOpaque, Hook, HookContext, SharedPlugin};

pub(crate) struct StrategyCore {
    pub(crate) name: &'static str,
    pub(crate) cache_name: Arc<str>,
    pub(crate) plugins: Arc<[SharedPlugin]>,
    pub(crate) match_options: MatchOptions,
    pub(crate) fetch_options: FetchOptions,
    pub(crate) cache: CacheWrapper,
    pub(crate) fetcher: FetchWrapper,
    diagnostics: Arc<dyn DiagnosticsSink>,
    development: bool,
}

impl StrategyCore {
    pub(crate) fn new(name: &'static str, engine: &Engine, options: StrategyOptions) -> Self {
        let cache_name: Arc<str> = engine.names.runtime_name(options.cache_name.as_deref()).into();
        Self {
            name,
            cache_name,
            plugins: options.plugins.into(),
            match_options: options.match_options,
            fetch_options: options.fetch_options,
            cache: engine.cache.clone(),
            fetcher: engine.fetcher.clone(),
            diagnostics: Arc::clone(&engine.diagnostics),
            development: engine.config().development,
        }
    }

    /// Like [`StrategyCore::new`], but caches opaque responses too unless a
    /// supplied plugin already decides cacheability.
    pub(crate) fn caching_opaque(name: &'static str, engine: &Engine, mut options: StrategyOptions) -> Self {
        let decided = options
            .plugins
            .iter()
            .any(|p| p.hooks().contains(Hook::CacheWillUpdate));
        if !decided {
            options.plugins.push(Arc::new(CacheOkAndOpaque));
        }
        Self::new(name, engine, options)
    }

    /// Check the context and open this invocation's trace.
    pub(crate) fn begin(&self, ctx: &RequestContext) -> Result<(HookContext, Trace)> {
        if self.development && ctx.event.kind() != EventKind::Fetch {
            return Err(StrategyError::InvalidContext {
                strategy: self.name,
                expected: EventKind::Fetch,
                found: ctx.event.kind(),
            });
        }

        let hooks = HookContext {
            event_id: ctx.event.id(),
            cache_name: Arc::clone(&self.cache_name),
        };
        Ok((hooks, Trace::new(self.development)))
    }

    pub(crate) fn finish(&self, ctx: &RequestContext, trace: Trace) {
        trace.finish(self.diagnostics.as_ref(), self.name, ctx.url());
    }

    pub(crate) async fn lookup(&self, hooks: &HookContext, ctx: &RequestContext) -> Result<CacheLookup> {
        self.cache
            .lookup(hooks, &ctx.request, &self.match_options, &self.plugins)
            .await
    }

    pub(crate) async fn fetch(&self, hooks: &HookContext, ctx: &RequestContext) -> Result<Response> {
        self.fetcher
            .fetch(hooks, &ctx.request, &self.fetch_options, &self.plugins)
            .await
    }

    /// Fetch, return the response, and hand a duplicate to a background
    /// write registered with the event. `key` is the lookup's resolved key
    /// when there was a lookup.
    pub(crate) async fn fetch_and_cache(
        &self,
        hooks: &HookContext,
        ctx: &RequestContext,
        key: Option<Request>,
    ) -> Result<Response> {
        let response = self.fetch(hooks, ctx).await?;
        let copy = response.try_clone()?;

        let plugins = Arc::clone(&self.plugins);
        let task = match key {
            Some(key) => self.cache.write_task(hooks.clone(), key, copy, plugins),
            None => self
                .cache
                .put_task(hooks.clone(), ctx.request.clone(), copy, plugins),
        };
        ctx.event.wait_until(task);

        Ok(response)
    }

    /// Fetch and write back entirely in the background.
    pub(crate) fn revalidate_task(&self, hooks: &HookContext, ctx: &RequestContext, key: Request) -> BackgroundTask {
        let fetcher = self.fetcher.clone();
        let cache = self.cache.clone();
        let plugins = Arc::clone(&self.plugins);
        let options = self.fetch_options;
        let hooks = hooks.clone();
        let request = ctx.request.clone();

        Box::pin(async move {
            let response = fetcher.fetch(&hooks, &request, &options, &plugins).await?;
            cache.write(&hooks, key, response, &plugins).await
        })
    }
}
