//! Stale while revalidate.

use async_trait::async_trait;
use rtcache_domain::Response;

use super::base::StrategyCore;
use super::{Strategy, StrategyOptions};
use crate::context::RequestContext;
use crate::engine::Engine;
use crate::error::Result;
use crate::plugin::SharedPlugin;

/// Serves a cached response immediately and refreshes the entry from the
/// network in the background. On a miss the network fetch is the response
/// path and the write-back runs in the background.
pub struct StaleWhileRevalidate {
    core: StrategyCore,
}

impl StaleWhileRevalidate {
    pub fn new(engine: &Engine, options: StrategyOptions) -> Self {
        Self {
            core: StrategyCore::caching_opaque("StaleWhileRevalidate", engine, options),
        }
    }
}

#[async_trait]
impl Strategy for StaleWhileRevalidate {
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
        let result = match lookup.response {
            Some(cached) => {
                trace.note(|| "Serving cached response, revalidating in the background.".to_string());
                ctx.event
                    .wait_until(self.core.revalidate_task(&hooks, ctx, lookup.key));
                Ok(cached)
            }
            None => {
                trace.note(|| "No cached response found, requesting from network.".to_string());
                self.core.fetch_and_cache(&hooks, ctx, Some(lookup.key)).await
            }
        };

        self.core.finish(ctx, trace);
        result
    }
}
