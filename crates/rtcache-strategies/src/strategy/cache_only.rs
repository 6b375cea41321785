//! Cache only.

use async_trait::async_trait;
use rtcache_domain::Response;

use super::base::StrategyCore;
use super::{Strategy, StrategyOptions};
use crate::context::RequestContext;
use crate::engine::Engine;
use crate::error::{Result, StrategyError};
use crate::plugin::SharedPlugin;

/// Serves from the cache and fails on a miss. Never touches the network.
pub struct CacheOnly {
    core: StrategyCore,
}

impl CacheOnly {
    pub fn new(engine: &Engine, options: StrategyOptions) -> Self {
        Self {
            core: StrategyCore::new("CacheOnly", engine, options),
        }
    }
}

#[async_trait]
impl Strategy for CacheOnly {
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
        let result = lookup.response.ok_or_else(|| StrategyError::NoCachedResponse {
            url: ctx.url().clone(),
        });

        if result.is_ok() {
            trace.note(|| format!("Found a cached response in the '{}' cache.", self.core.cache_name));
        } else {
            trace.note(|| format!("No response found in the '{}' cache.", self.core.cache_name));
        }

        self.core.finish(ctx, trace);
        result
    }
}
