//! Cache first, falling back to the network.

use async_trait::async_trait;
use rtcache_domain::Response;

use super::base::StrategyCore;
use super::{Strategy, StrategyOptions};
use crate::context::RequestContext;
use crate::engine::Engine;
use crate::error::Result;
use crate::plugin::SharedPlugin;

/// Serves a cached response when there is one. On a miss the network
/// response is returned and a duplicate is written back in the background.
///
/// Suited to revisioned assets that can stay cached for a long time.
pub struct CacheFirst {
    core: StrategyCore,
}

impl CacheFirst {
    pub fn new(engine: &Engine, options: StrategyOptions) -> Self {
        Self {
            core: StrategyCore::new("CacheFirst", engine, options),
        }
    }
}

#[async_trait]
impl Strategy for CacheFirst {
    fn name(&self) -> &'static str {
        self.core.name
    }

    fn cache_name(&self) -> &str {
        &self.core.cache_name
    }

    fn plugins(&self) -> &[SharedPlugin] {
        &self.core.plugins
    }

    async fn handle(&self, ctx: &RequestContext) -> Result<Response> {
        let (hooks, mut trace) = self.core.begin(ctx)?;

        let lookup = self.core.lookup(&hooks, ctx).await?;
        if let Some(cached) = lookup.response {
            trace.note(|| format!("Found a cached response in the '{}' cache.", self.core.cache_name));
            self.core.finish(ctx, trace);
            return Ok(cached);
        }

        trace.note(|| "No cached response found, requesting from network.".to_string());
        let result = self.core.fetch_and_cache(&hooks, ctx, Some(lookup.key)).await;
        match &result {
            Ok(response) => trace.note(|| {
                format!(
                    "Got response with status {} from network; caching a copy.",
                    response.status.as_u16()
                )
            }),
            Err(e) => trace.note(|| format!("Failed to get response from network: {e}")),
        }

        self.core.finish(ctx, trace);
        // Never swallow the failure; the router may have a fallback.
        result
    }
}
