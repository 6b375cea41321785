//! Network first, falling back to the cache.

use async_trait::async_trait;
use rtcache_domain::Response;

use super::base::StrategyCore;
use super::{Strategy, StrategyOptions};
use crate::context::RequestContext;
use crate::engine::Engine;
use crate::error::{Result, StrategyError};
use crate::plugin::SharedPlugin;

/// Fetches and writes a duplicate back in the background. When the network
/// fails, a cached response is served instead; with nothing cached the
/// original network failure is returned.
///
/// Only network failures fall back. Plugin and body errors propagate.
pub struct NetworkFirst {
    core: StrategyCore,
}

impl NetworkFirst {
    pub fn new(engine: &Engine, options: StrategyOptions) -> Self {
        Self {
            core: StrategyCore::caching_opaque("NetworkFirst", engine, options),
        }
    }
}

#[async_trait]
impl Strategy for NetworkFirst {
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

        let network_error = match self.core.fetch_and_cache(&hooks, ctx, None).await {
            Ok(response) => {
                trace.note(|| "Got response from network; caching a copy.".to_string());
                self.core.finish(ctx, trace);
                return Ok(response);
            }
            Err(StrategyError::Network(e)) => e,
            Err(e) => {
                self.core.finish(ctx, trace);
                return Err(e);
            }
        };

        trace.note(|| format!("Network request failed ({network_error}), looking in the cache."));
        let cached = match self.core.lookup(&hooks, ctx).await {
            Ok(lookup) => lookup.response,
            Err(e) => {
                tracing::warn!(error = %e, "Cache fallback failed");
                None
            }
        };

        let result = match cached {
            Some(response) => {
                trace.note(|| "Serving the cached response.".to_string());
                Ok(response)
            }
            None => {
                trace.note(|| "Nothing cached either.".to_string());
                Err(StrategyError::Network(network_error))
            }
        };

        self.core.finish(ctx, trace);
        result
    }
}
