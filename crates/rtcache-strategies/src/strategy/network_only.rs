//! Network only.

use async_trait::async_trait;
use rtcache_domain::Response;

use super::base::StrategyCore;
use super::{Strategy, StrategyOptions};
use crate::context::RequestContext;
use crate::engine::Engine;
use crate::error::Result;
use crate::plugin::SharedPlugin;

/// Always fetches. The cache is never read or written; the cache name is
/// resolved only so every strategy has the same shape.
///
/// Useful when the fetch plugins are wanted without any caching.
pub struct NetworkOnly {
    core: StrategyCore,
}

impl NetworkOnly {
    pub fn new(engine: &Engine, options: StrategyOptions) -> Self {
        Self {
            core: StrategyCore::new("NetworkOnly", engine, options),
        }
    }
}

#[async_trait]
impl Strategy for NetworkOnly {
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

        let result = self.core.fetch(&hooks, ctx).await;
        match &result {
            Ok(response) => trace.note(|| {
                format!(
                    "A response was retrieved from the network with status code '{}', \
                     this will be returned.",
                    response.status.as_u16()
                )
            }),
            Err(e) => trace.note(|| format!("A response could not be retrieved from the network: {e}")),
        }

        self.core.finish(ctx, trace);
        result
    }
}
