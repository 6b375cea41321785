//! Strategy engine error types

use http::Method;
use rtcache_domain::BodyUsed;
use thiserror::Error;
use url::Url;

use crate::cache::StoreError;
use crate::context::EventKind;
use crate::fetch::TransportError;
use crate::plugin::{Hook, PluginError};

/// A single plugin's failure inside a hook pass.
#[derive(Debug)]
pub struct PluginFailure {
    pub plugin: String,
    pub error: PluginError,
}

/// Strategy engine errors
#[derive(Debug, Error)]
pub enum StrategyError {
    /// Transport fault, passed through unchanged.
    #[error("Network request failed: {0}")]
    Network(#[from] TransportError),

    /// The cache store could not be reached during a lookup.
    #[error("Cache read failed: {0}")]
    CacheRead(StoreError),

    #[error("Cache write failed: {0}")]
    CacheWrite(StoreError),

    #[error("Plugin hook {hook} failed in {} plugin(s)", .failures.len())]
    PluginHook {
        hook: Hook,
        failures: Vec<PluginFailure>,
    },

    #[error("{strategy} expected a {expected} event, got {found}")]
    InvalidContext {
        strategy: &'static str,
        expected: EventKind,
        found: EventKind,
    },

    #[error("No cached response for {url}")]
    NoCachedResponse { url: Url },

    #[error("Refusing to cache a {method} request to {url}")]
    NonGetCacheWrite { method: Method, url: Url },

    #[error(transparent)]
    BodyUsed(#[from] BodyUsed),

    #[error("Background task did not complete: {0}")]
    BackgroundTask(String),
}

impl StrategyError {
    /// Value-hook failure raised by one plugin.
    pub(crate) fn plugin(hook: Hook, plugin: &str, error: PluginError) -> Self {
        Self::PluginHook {
            hook,
            failures: vec![PluginFailure {
                plugin: plugin.to_string(),
                error,
            }],
        }
    }
}

pub type Result<T> = std::result::Result<T, StrategyError>;
