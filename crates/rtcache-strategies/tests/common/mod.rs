//! Recording fakes shared by the strategy integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rtcache_domain::{Request, Response, StoredResponse};
use rtcache_strategies::{
    CacheStore, DiagnosticsReport, DiagnosticsSink, Engine, EngineConfig, ExtendableEvent, Hook,
    HookContext, HookSet, MatchOptions, MemoryCacheStore, Plugin, PluginError, RequestContext,
    StoreError, TaskRegistry, Transport, TransportError,
};
use rtcache_strategies::FetchOptions;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// =============================================================================
// CACHE STORE
// =============================================================================

/// One write observed by [`RecordingStore`].
#[derive(Debug, Clone)]
pub struct PutRecord {
    pub cache_name: String,
    pub key: Request,
    pub stored: StoredResponse,
}

/// Memory store that counts every call and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryCacheStore,
    gets: AtomicUsize,
    puts: Mutex<Vec<PutRecord>>,
    pub fail_reads: Mutex<Option<StoreError>>,
    pub fail_writes: Mutex<Option<StoreError>>,
}

impl RecordingStore {
    /// Insert an entry without counting it as a call.
    pub async fn seed(&self, cache_name: &str, url: &str, response: Response) {
        self.inner
            .put(cache_name, &request(url), response)
            .await
            .expect("seeding the memory store");
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().len()
    }

    pub fn puts(&self) -> Vec<PutRecord> {
        self.puts.lock().clone()
    }
}

#[async_trait]
impl CacheStore for RecordingStore {
    async fn get(
        &self,
        cache_name: &str,
        key: &Request,
        options: &MatchOptions,
    ) -> Result<Option<Response>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_reads.lock().clone() {
            return Err(err);
        }
        self.inner.get(cache_name, key, options).await
    }

    async fn put(&self, cache_name: &str, key: &Request, response: Response) -> Result<(), StoreError> {
        let stored = response
            .into_stored()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        self.puts.lock().push(PutRecord {
            cache_name: cache_name.to_string(),
            key: key.clone(),
            stored: stored.clone(),
        });
        if let Some(err) = self.fail_writes.lock().clone() {
            return Err(err);
        }
        let response = stored
            .to_response()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        self.inner.put(cache_name, key, response).await
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

type Responder = Box<dyn Fn(&Request) -> Result<Response, TransportError> + Send + Sync>;

/// Transport answering from a closure and recording what it was sent.
pub struct ScriptedTransport {
    respond: Responder,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new(
        respond: impl Fn(&Request) -> Result<Response, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(body: &'static str) -> Self {
        Self::new(move |_| Ok(Response::ok(body)))
    }

    pub fn failing(error: TransportError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &Request, _options: &FetchOptions) -> Result<Response, TransportError> {
        self.requests.lock().push(request.clone());
        (self.respond)(request)
    }
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

#[derive(Default)]
pub struct RecordingSink(Mutex<Vec<DiagnosticsReport>>);

impl RecordingSink {
    pub fn reports(&self) -> Vec<DiagnosticsReport> {
        self.0.lock().clone()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn report(&self, report: DiagnosticsReport) {
        self.0.lock().push(report);
    }
}

// =============================================================================
// PLUGINS
// =============================================================================

pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Records every hook it declares as `<label>:<hook>` and changes nothing.
pub struct Probe {
    pub label: &'static str,
    pub hooks: HookSet,
    pub log: CallLog,
}

impl Probe {
    pub fn all(label: &'static str, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            label,
            hooks: Hook::ALL.into_iter().collect(),
            log: Arc::clone(log),
        })
    }

    fn record(&self, hook: Hook) {
        self.log.lock().push(format!("{}:{hook}", self.label));
    }
}

#[async_trait]
impl Plugin for Probe {
    fn name(&self) -> &str {
        self.label
    }

    fn hooks(&self) -> HookSet {
        self.hooks
    }

    async fn cache_key_will_be_used(&self, _ctx: &HookContext, request: Request) -> Result<Request, PluginError> {
        self.record(Hook::CacheKeyWillBeUsed);
        Ok(request)
    }

    async fn cached_response_will_be_used(
        &self,
        _ctx: &HookContext,
        _request: &Request,
        cached: Response,
    ) -> Result<Option<Response>, PluginError> {
        self.record(Hook::CachedResponseWillBeUsed);
        Ok(Some(cached))
    }

    async fn request_will_fetch(&self, _ctx: &HookContext, request: Request) -> Result<Request, PluginError> {
        self.record(Hook::RequestWillFetch);
        Ok(request)
    }

    async fn fetch_did_succeed(
        &self,
        _ctx: &HookContext,
        _request: &Request,
        response: Response,
    ) -> Result<Response, PluginError> {
        self.record(Hook::FetchDidSucceed);
        Ok(response)
    }

    async fn fetch_did_fail(
        &self,
        _ctx: &HookContext,
        _original: &Request,
        _request: &Request,
        _error: &TransportError,
    ) -> Result<(), PluginError> {
        self.record(Hook::FetchDidFail);
        Ok(())
    }

    async fn cache_will_update(
        &self,
        _ctx: &HookContext,
        _request: &Request,
        _response: &Response,
    ) -> Result<bool, PluginError> {
        self.record(Hook::CacheWillUpdate);
        Ok(true)
    }

    async fn cache_did_update(
        &self,
        _ctx: &HookContext,
        _request: &Request,
        _old_response: Option<&Response>,
        _new_response: &Response,
    ) -> Result<(), PluginError> {
        self.record(Hook::CacheDidUpdate);
        Ok(())
    }
}

/// Files every request under its URL without the query string.
pub struct IgnoreSearch;

#[async_trait]
impl Plugin for IgnoreSearch {
    fn name(&self) -> &str {
        "ignore_search"
    }

    fn hooks(&self) -> HookSet {
        HookSet::of(&[Hook::CacheKeyWillBeUsed])
    }

    async fn cache_key_will_be_used(&self, _ctx: &HookContext, mut request: Request) -> Result<Request, PluginError> {
        request.url = request.url_without_search();
        Ok(request)
    }
}

/// Vetoes every cached response.
pub struct VetoCached;

#[async_trait]
impl Plugin for VetoCached {
    fn name(&self) -> &str {
        "veto_cached"
    }

    fn hooks(&self) -> HookSet {
        HookSet::of(&[Hook::CachedResponseWillBeUsed])
    }

    async fn cached_response_will_be_used(
        &self,
        _ctx: &HookContext,
        _request: &Request,
        _cached: Response,
    ) -> Result<Option<Response>, PluginError> {
        Ok(None)
    }
}

// =============================================================================
// HARNESS
// =============================================================================

pub fn request(url: &str) -> Request {
    Request::parse(http::Method::GET, url).expect("test URL")
}

/// Engine wired to recording fakes, plus the registry background writes go to.
pub struct Harness {
    pub store: Arc<RecordingStore>,
    pub transport: Arc<ScriptedTransport>,
    pub registry: Arc<TaskRegistry>,
    pub sink: Arc<RecordingSink>,
    pub engine: Engine,
}

impl Harness {
    pub fn new(transport: ScriptedTransport) -> Self {
        Self::with_config(EngineConfig::default(), transport)
    }

    pub fn with_config(config: EngineConfig, transport: ScriptedTransport) -> Self {
        let store = Arc::new(RecordingStore::default());
        let transport = Arc::new(transport);
        let sink = Arc::new(RecordingSink::default());
        let engine = Engine::new(config, store.clone(), transport.clone()).with_diagnostics(sink.clone());

        Self {
            store,
            transport,
            registry: Arc::new(TaskRegistry::new()),
            sink,
            engine,
        }
    }

    pub fn context(&self, url: &str) -> RequestContext {
        RequestContext::new(request(url), ExtendableEvent::fetch(self.registry.clone()))
    }
}
