//! Network fetch orchestrator: plugin hooks around the transport.

use rtcache_domain::{Request, Response};

use super::transport::{FetchOptions, SharedTransport};
use crate::error::{Result, StrategyError};
use crate::plugin::{HookContext, Pipeline, SharedPlugin};

/// Runs the fetch hooks around a [`Transport`](super::Transport).
#[derive(Clone)]
pub struct FetchWrapper {
    transport: SharedTransport,
}

impl FetchWrapper {
    pub fn new(transport: SharedTransport) -> Self {
        Self { transport }
    }

    /// Let plugins rewrite the request, send it, and let plugins replace the
    /// response.
    ///
    /// On a transport failure every `fetch_did_fail` observer sees the error
    /// and both the original and rewritten request, then the original
    /// failure is returned. Observer failures are logged, never substituted
    /// for it.
    ///
    /// # Errors
    ///
    /// [`StrategyError::Network`] carrying the transport's error unchanged,
    /// or [`StrategyError::PluginHook`] when a value hook fails.
    pub async fn fetch(
        &self,
        ctx: &HookContext,
        request: &Request,
        options: &FetchOptions,
        plugins: &[SharedPlugin],
    ) -> Result<Response> {
        let pipeline = Pipeline::new(plugins, ctx);
        let outgoing = pipeline.request_will_fetch(request.clone()).await?;

        match self.transport.send(&outgoing, options).await {
            Ok(response) => {
                tracing::debug!(
                    url = %outgoing.url,
                    status = response.status.as_u16(),
                    "Network request succeeded"
                );
                pipeline.fetch_did_succeed(&outgoing, response).await
            }
            Err(error) => {
                tracing::debug!(url = %outgoing.url, error = %error, "Network request failed");
                if let Err(observer) = pipeline.fetch_did_fail(request, &outgoing, &error).await {
                    tracing::warn!(error = %observer, "fetch_did_fail observers failed");
                }
                Err(StrategyError::Network(error))
            }
        }
    }
}
