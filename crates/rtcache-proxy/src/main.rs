//! # Runtime Cache Proxy Server
//!
//! Binary entry point for the caching proxy.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rtcache_proxy::{build_router, AppState, CacheBackend, Config};
use rtcache_strategies::{
    CacheStore, Engine, FetchOptions, MemoryCacheStore, RedisCacheStore, RedisStoreConfig,
    ReqwestTransport, StrategyOptions, TaskRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    for warning in &config.warnings {
        tracing::warn!("{warning}");
    }

    tracing::info!(
        version = rtcache_proxy::VERSION,
        development = config.engine.development,
        "Starting runtime cache proxy"
    );
    if config.engine.development {
        tracing::warn!("Development checks and diagnostics are on; set RTCACHE_ENV=production to disable");
    }

    // Cache store
    let store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Memory => {
            tracing::info!("Using in-memory cache");
            Arc::new(MemoryCacheStore::new())
        }
        CacheBackend::Redis => {
            tracing::info!(url = %config.redis.url, ttl = ?config.redis.ttl, "Connecting to Redis");
            let store = RedisCacheStore::new(RedisStoreConfig {
                url: config.redis.url.clone(),
                ttl: config.redis.ttl,
            })
            .await?;
            tracing::info!("Redis connected");
            Arc::new(store)
        }
    };

    // Strategy
    let engine = Engine::new(config.engine.clone(), store, Arc::new(ReqwestTransport::new()));

    let mut options = StrategyOptions::new().with_fetch_options(FetchOptions {
        timeout: config.fetch_timeout,
    });
    if let Some(name) = &config.cache_name {
        options = options.with_cache_name(name.clone());
    }
    let strategy = config.strategy.build(&engine, options);

    tracing::info!(
        strategy = strategy.name(),
        cache_name = strategy.cache_name(),
        upstream = %config.upstream_url,
        "Strategy ready"
    );

    // Build router
    let registry = Arc::new(TaskRegistry::new());
    let app = build_router(AppState {
        strategy,
        registry: registry.clone(),
        upstream: config.upstream_url.clone(),
    });

    // Start server
    let addr = config.server_addr;
    tracing::info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Background cache writes outlive their requests, not the process.
    let pending = registry.pending();
    let failures = registry.drain().await;
    tracing::info!(pending, failed = failures.len(), "Background cache writes drained");

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
