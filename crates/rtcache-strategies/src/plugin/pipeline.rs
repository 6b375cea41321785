//! Runs one hook across an ordered plugin list.

use rtcache_domain::{Request, Response};

use super::{Hook, HookContext, SharedPlugin};
use crate::error::{PluginFailure, Result, StrategyError};
use crate::fetch::TransportError;

/// Hook runner bound to one plugin list and one invocation's context.
///
/// A hook nobody implements returns its input untouched without calling
/// anything.
pub struct Pipeline<'a> {
    plugins: &'a [SharedPlugin],
    ctx: &'a HookContext,
}

impl<'a> Pipeline<'a> {
    pub const fn new(plugins: &'a [SharedPlugin], ctx: &'a HookContext) -> Self {
        Self { plugins, ctx }
    }

    /// Whether any plugin implements `hook`.
    pub fn has(&self, hook: Hook) -> bool {
        self.plugins.iter().any(|p| p.hooks().contains(hook))
    }

    fn implementing(&self, hook: Hook) -> impl Iterator<Item = &'a SharedPlugin> + use<'a> {
        self.plugins.iter().filter(move |p| p.hooks().contains(hook))
    }

    // =========================================================================
    // VALUE HOOKS
    // =========================================================================

    pub async fn cache_key_will_be_used(&self, mut request: Request) -> Result<Request> {
        for plugin in self.implementing(Hook::CacheKeyWillBeUsed) {
            request = plugin
                .cache_key_will_be_used(self.ctx, request)
                .await
                .map_err(|e| StrategyError::plugin(Hook::CacheKeyWillBeUsed, plugin.name(), e))?;
        }
        Ok(request)
    }

    /// `None` once any plugin vetoes; later plugins are not consulted.
    pub async fn cached_response_will_be_used(
        &self,
        request: &Request,
        cached: Response,
    ) -> Result<Option<Response>> {
        let mut current = cached;
        for plugin in self.implementing(Hook::CachedResponseWillBeUsed) {
            let next = plugin
                .cached_response_will_be_used(self.ctx, request, current)
                .await
                .map_err(|e| {
                    StrategyError::plugin(Hook::CachedResponseWillBeUsed, plugin.name(), e)
                })?;

            match next {
                Some(response) => current = response,
                None => {
                    tracing::debug!(plugin = plugin.name(), url = %request.url, "Cached response vetoed");
                    return Ok(None);
                }
            }
        }
        Ok(Some(current))
    }

    pub async fn request_will_fetch(&self, mut request: Request) -> Result<Request> {
        for plugin in self.implementing(Hook::RequestWillFetch) {
            request = plugin
                .request_will_fetch(self.ctx, request)
                .await
                .map_err(|e| StrategyError::plugin(Hook::RequestWillFetch, plugin.name(), e))?;
        }
        Ok(request)
    }

    pub async fn fetch_did_succeed(&self, request: &Request, mut response: Response) -> Result<Response> {
        for plugin in self.implementing(Hook::FetchDidSucceed) {
            response = plugin
                .fetch_did_succeed(self.ctx, request, response)
                .await
                .map_err(|e| StrategyError::plugin(Hook::FetchDidSucceed, plugin.name(), e))?;
        }
        Ok(response)
    }

    // =========================================================================
    // AGGREGATING HOOKS
    // =========================================================================

    /// `None` when no plugin implements the hook, so the caller can apply
    /// its default policy. Otherwise `Some(true)` only if every plugin
    /// confirmed.
    pub async fn cache_will_update(&self, request: &Request, response: &Response) -> Result<Option<bool>> {
        if !self.has(Hook::CacheWillUpdate) {
            return Ok(None);
        }

        let mut confirmed = true;
        let mut failures = Vec::new();
        for plugin in self.implementing(Hook::CacheWillUpdate) {
            match plugin.cache_will_update(self.ctx, request, response).await {
                Ok(verdict) => confirmed &= verdict,
                Err(error) => failures.push(failure(plugin, error)),
            }
        }

        collected(Hook::CacheWillUpdate, failures)?;
        Ok(Some(confirmed))
    }

    pub async fn fetch_did_fail(
        &self,
        original: &Request,
        request: &Request,
        error: &TransportError,
    ) -> Result<()> {
        let mut failures = Vec::new();
        for plugin in self.implementing(Hook::FetchDidFail) {
            if let Err(e) = plugin.fetch_did_fail(self.ctx, original, request, error).await {
                failures.push(failure(plugin, e));
            }
        }
        collected(Hook::FetchDidFail, failures)
    }

    pub async fn cache_did_update(
        &self,
        request: &Request,
        old_response: Option<&Response>,
        new_response: &Response,
    ) -> Result<()> {
        let mut failures = Vec::new();
        for plugin in self.implementing(Hook::CacheDidUpdate) {
            if let Err(e) = plugin
                .cache_did_update(self.ctx, request, old_response, new_response)
                .await
            {
                failures.push(failure(plugin, e));
            }
        }
        collected(Hook::CacheDidUpdate, failures)
    }
}

fn failure(plugin: &SharedPlugin, error: super::PluginError) -> PluginFailure {
    tracing::warn!(plugin = plugin.name(), error = %error, "Plugin hook failed");
    PluginFailure {
        plugin: plugin.name().to_string(),
        error,
    }
}

fn collected(hook: Hook, failures: Vec<PluginFailure>) -> Result<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(StrategyError::PluginHook { hook, failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{HookSet, Plugin, PluginError};
    use async_trait::async_trait;
    use http::header::{HeaderValue, ACCEPT};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use uuid::Uuid;

    struct Tagger {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Plugin for Tagger {
        fn name(&self) -> &str {
            self.tag
        }

        fn hooks(&self) -> HookSet {
            HookSet::of(&[Hook::RequestWillFetch, Hook::CacheDidUpdate])
        }

        async fn request_will_fetch(
            &self,
            _ctx: &HookContext,
            mut request: Request,
        ) -> std::result::Result<Request, PluginError> {
            self.log.lock().push(format!("{}:request_will_fetch", self.tag));
            if self.fail {
                return Err(PluginError::msg("rewrite refused"));
            }
            let value = HeaderValue::from_static(self.tag);
            request.headers.append(ACCEPT, value);
            Ok(request)
        }

        async fn cache_did_update(
            &self,
            _ctx: &HookContext,
            _request: &Request,
            _old: Option<&Response>,
            _new: &Response,
        ) -> std::result::Result<(), PluginError> {
            self.log.lock().push(format!("{}:cache_did_update", self.tag));
            if self.fail {
                return Err(PluginError::msg("observer broke"));
            }
            Ok(())
        }
    }

    fn ctx() -> HookContext {
        HookContext {
            event_id: Uuid::nil(),
            cache_name: Arc::from("test"),
        }
    }

    fn tagger(tag: &'static str, log: &Arc<Mutex<Vec<String>>>, fail: bool) -> SharedPlugin {
        Arc::new(Tagger {
            tag,
            log: Arc::clone(log),
            fail,
        })
    }

    fn request() -> Request {
        Request::parse(http::Method::GET, "https://example.com/a").unwrap()
    }

    #[tokio::test]
    async fn test_value_hook_chains_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let plugins = vec![tagger("first", &log, false), tagger("second", &log, false)];
        let ctx = ctx();

        let rewritten = Pipeline::new(&plugins, &ctx)
            .request_will_fetch(request())
            .await
            .unwrap();

        let accepts: Vec<_> = rewritten.headers.get_all(ACCEPT).iter().collect();
        assert_eq!(accepts, vec!["first", "second"]);
        assert_eq!(
            *log.lock(),
            vec!["first:request_will_fetch", "second:request_will_fetch"]
        );
    }

    #[tokio::test]
    async fn test_value_hook_failure_aborts_pass() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let plugins = vec![tagger("broken", &log, true), tagger("after", &log, false)];
        let ctx = ctx();

        let err = Pipeline::new(&plugins, &ctx)
            .request_will_fetch(request())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StrategyError::PluginHook { hook: Hook::RequestWillFetch, ref failures }
                if failures.len() == 1 && failures[0].plugin == "broken"
        ));
        assert_eq!(*log.lock(), vec!["broken:request_will_fetch"]);
    }

    #[tokio::test]
    async fn test_observer_failure_collected_after_pass() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let plugins = vec![
            tagger("broken", &log, true),
            tagger("after", &log, false),
            tagger("also-broken", &log, true),
        ];
        let ctx = ctx();
        let response = Response::ok("x");

        let err = Pipeline::new(&plugins, &ctx)
            .cache_did_update(&request(), None, &response)
            .await
            .unwrap_err();

        assert_eq!(
            *log.lock(),
            vec![
                "broken:cache_did_update",
                "after:cache_did_update",
                "also-broken:cache_did_update"
            ]
        );
        match err {
            StrategyError::PluginHook { hook, failures } => {
                assert_eq!(hook, Hook::CacheDidUpdate);
                let names: Vec<_> = failures.iter().map(|f| f.plugin.as_str()).collect();
                assert_eq!(names, vec!["broken", "also-broken"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unimplemented_hook_is_identity() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let plugins = vec![tagger("only", &log, false)];
        let ctx = ctx();
        let pipeline = Pipeline::new(&plugins, &ctx);

        let key = pipeline.cache_key_will_be_used(request()).await.unwrap();
        assert_eq!(key, request());
        assert_eq!(
            pipeline.cache_will_update(&request(), &Response::ok("x")).await.unwrap(),
            None
        );
        assert!(log.lock().is_empty());
    }
}
