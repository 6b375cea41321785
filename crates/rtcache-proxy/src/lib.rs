//! # Runtime Cache Proxy
//!
//! Long-lived HTTP host for the runtime caching strategies: every inbound
//! request is forwarded to one upstream origin through a configured
//! strategy, and background cache writes are tracked until shutdown.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Axum HTTP Server                         │
//! │             (fallback route + /health)                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RequestContext                          │
//! │         (upstream URL, fetch event, TaskRegistry)           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Strategy                             │
//! │            (CacheFirst, NetworkFirst, ...)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │   Memory / Redis cache  │   │      Upstream (reqwest)      │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod convert;
pub mod error;

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Router,
};
use rtcache_strategies::{ExtendableEvent, RequestContext, SharedStrategy, TaskRegistry};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use url::Url;

pub use config::{CacheBackend, Config, ConfigError};
pub use error::{ProxyError, ProxyResult};

/// Response header naming the strategy that answered.
pub const STRATEGY_HEADER: &str = "x-rtcache-strategy";

/// Application state for Axum handlers
#[derive(Clone)]
pub struct AppState {
    pub strategy: SharedStrategy,
    pub registry: Arc<TaskRegistry>,
    pub upstream: Url,
}

/// Answer one request through the configured strategy.
pub async fn proxy_handler(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> ProxyResult<axum::response::Response> {
    let request = convert::into_domain_request(&state.upstream, request).await?;
    let ctx = RequestContext::new(request, ExtendableEvent::fetch(state.registry.clone()));

    let response = state.strategy.handle(&ctx).await?;

    let mut http = convert::into_http_response(response)?;
    http.headers_mut().insert(
        HeaderName::from_static(STRATEGY_HEADER),
        HeaderValue::from_static(state.strategy.name()),
    );
    Ok(http)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    "OK"
}

/// Build the Axum router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .fallback(proxy_handler)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
