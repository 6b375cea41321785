//! Shared collaborators every strategy is built from.

use std::sync::Arc;

use crate::cache::{CacheWrapper, SharedCacheStore};
use crate::config::EngineConfig;
use crate::diagnostics::{default_sink, DiagnosticsSink};
use crate::fetch::{FetchWrapper, SharedTransport};
use crate::naming::{CacheNames, DefaultCacheNames};

/// Cache store, transport, naming service and diagnostics sink, bundled so
/// strategies can be constructed without I/O.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    pub(crate) cache: CacheWrapper,
    pub(crate) fetcher: FetchWrapper,
    pub(crate) names: Arc<dyn CacheNames>,
    pub(crate) diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Engine {
    pub fn new(config: EngineConfig, store: SharedCacheStore, transport: SharedTransport) -> Self {
        let names = Arc::new(DefaultCacheNames::from_config(&config));
        Self {
            config,
            cache: CacheWrapper::new(store),
            fetcher: FetchWrapper::new(transport),
            names,
            diagnostics: default_sink(),
        }
    }

    #[must_use]
    pub fn with_cache_names(mut self, names: Arc<dyn CacheNames>) -> Self {
        self.names = names;
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Cache access orchestrator bound to this engine's store.
    pub const fn cache(&self) -> &CacheWrapper {
        &self.cache
    }

    /// Network fetch orchestrator bound to this engine's transport.
    pub const fn fetcher(&self) -> &FetchWrapper {
        &self.fetcher
    }
}
