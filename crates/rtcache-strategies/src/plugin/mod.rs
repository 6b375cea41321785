//! # Plugin Module
//!
//! Plugins implement any subset of seven hooks. Each plugin declares that
//! subset through [`Plugin::hooks`]; the [`Pipeline`] only calls hooks a
//! plugin declares, in the order plugins were supplied to the strategy.
//!
//! ## Hooks
//!
//! Value hooks (a failure aborts the pass and propagates):
//! - `cache_key_will_be_used` - rewrite the key used for lookup and write
//! - `cached_response_will_be_used` - replace or veto a cache hit
//! - `request_will_fetch` - rewrite the outgoing request
//! - `fetch_did_succeed` - replace the network response
//!
//! Aggregating hooks (every plugin runs, failures are re-raised afterwards):
//! - `cache_will_update` - every plugin must confirm cacheability
//! - `cache_did_update` - observe a completed cache write
//!
//! `fetch_did_fail` also runs every plugin, but its failures are only
//! logged: the caller always gets the transport error.

pub mod pipeline;

use async_trait::async_trait;
use rtcache_domain::{Request, Response};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::fetch::TransportError;

pub use pipeline::Pipeline;

/// Plugins are shared, read-only, across every invocation.
pub type SharedPlugin = Arc<dyn Plugin>;

// =============================================================================
// HOOKS
// =============================================================================

/// Named extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    CacheKeyWillBeUsed,
    CachedResponseWillBeUsed,
    RequestWillFetch,
    FetchDidSucceed,
    FetchDidFail,
    CacheWillUpdate,
    CacheDidUpdate,
}

impl Hook {
    pub const ALL: [Self; 7] = [
        Self::CacheKeyWillBeUsed,
        Self::CachedResponseWillBeUsed,
        Self::RequestWillFetch,
        Self::FetchDidSucceed,
        Self::FetchDidFail,
        Self::CacheWillUpdate,
        Self::CacheDidUpdate,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CacheKeyWillBeUsed => "cache_key_will_be_used",
            Self::CachedResponseWillBeUsed => "cached_response_will_be_used",
            Self::RequestWillFetch => "request_will_fetch",
            Self::FetchDidSucceed => "fetch_did_succeed",
            Self::FetchDidFail => "fetch_did_fail",
            Self::CacheWillUpdate => "cache_will_update",
            Self::CacheDidUpdate => "cache_did_update",
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of hooks a plugin implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookSet(u8);

impl HookSet {
    pub const EMPTY: Self = Self(0);

    pub const fn of(hooks: &[Hook]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < hooks.len() {
            bits |= hooks[i].bit();
            i += 1;
        }
        Self(bits)
    }

    #[must_use]
    pub const fn with(self, hook: Hook) -> Self {
        Self(self.0 | hook.bit())
    }

    pub const fn contains(self, hook: Hook) -> bool {
        self.0 & hook.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Hook> {
        Hook::ALL.into_iter().filter(move |h| self.contains(*h))
    }
}

impl FromIterator<Hook> for HookSet {
    fn from_iter<I: IntoIterator<Item = Hook>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

// =============================================================================
// PLUGIN TRAIT
// =============================================================================

/// Error raised by a plugin from inside a hook.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct PluginError(#[from] pub Box<dyn std::error::Error + Send + Sync>);

impl PluginError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }
}

/// What every hook call can see besides its own arguments.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub event_id: Uuid,
    pub cache_name: Arc<str>,
}

/// Request/response lifecycle plugin.
///
/// Default method bodies are identity/no-op, but they are never called for
/// hooks missing from [`Plugin::hooks`].
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Name used when reporting this plugin's failures
    fn name(&self) -> &str;

    /// Hooks this plugin implements
    fn hooks(&self) -> HookSet;

    async fn cache_key_will_be_used(
        &self,
        _ctx: &HookContext,
        request: Request,
    ) -> Result<Request, PluginError> {
        Ok(request)
    }

    /// Return `None` to veto the cached response.
    async fn cached_response_will_be_used(
        &self,
        _ctx: &HookContext,
        _request: &Request,
        cached: Response,
    ) -> Result<Option<Response>, PluginError> {
        Ok(Some(cached))
    }

    async fn request_will_fetch(
        &self,
        _ctx: &HookContext,
        request: Request,
    ) -> Result<Request, PluginError> {
        Ok(request)
    }

    async fn fetch_did_succeed(
        &self,
        _ctx: &HookContext,
        _request: &Request,
        response: Response,
    ) -> Result<Response, PluginError> {
        Ok(response)
    }

    /// `original` is the request before `request_will_fetch` rewrote it.
    async fn fetch_did_fail(
        &self,
        _ctx: &HookContext,
        _original: &Request,
        _request: &Request,
        _error: &TransportError,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    /// Return `false` to keep `response` out of the cache.
    async fn cache_will_update(
        &self,
        _ctx: &HookContext,
        _request: &Request,
        _response: &Response,
    ) -> Result<bool, PluginError> {
        Ok(true)
    }

    async fn cache_did_update(
        &self,
        _ctx: &HookContext,
        _request: &Request,
        _old_response: Option<&Response>,
        _new_response: &Response,
    ) -> Result<(), PluginError> {
        Ok(())
    }
}

// =============================================================================
// BUILT-IN PLUGINS
// =============================================================================

/// Caches 200 responses and opaque responses.
///
/// Appended by strategies that talk to the network first when none of the
/// supplied plugins implements `cache_will_update`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheOkAndOpaque;

#[async_trait]
impl Plugin for CacheOkAndOpaque {
    fn name(&self) -> &str {
        "cache_ok_and_opaque"
    }

    fn hooks(&self) -> HookSet {
        HookSet::of(&[Hook::CacheWillUpdate])
    }

    async fn cache_will_update(
        &self,
        _ctx: &HookContext,
        _request: &Request,
        response: &Response,
    ) -> Result<bool, PluginError> {
        Ok(response.status == http::StatusCode::OK || response.is_opaque())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_set_membership() {
        let set = HookSet::of(&[Hook::RequestWillFetch, Hook::CacheDidUpdate]);
        assert!(set.contains(Hook::RequestWillFetch));
        assert!(set.contains(Hook::CacheDidUpdate));
        assert!(!set.contains(Hook::FetchDidFail));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Hook::RequestWillFetch, Hook::CacheDidUpdate]
        );
        assert!(HookSet::EMPTY.is_empty());
        assert_eq!(
            [Hook::RequestWillFetch, Hook::CacheDidUpdate]
                .into_iter()
                .collect::<HookSet>(),
            set
        );
    }
}
