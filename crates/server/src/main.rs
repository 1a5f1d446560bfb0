//! pagefront server entry point.
//!
//! Boots the HTTP API. Logging goes to stderr as JSON, filtered by `RUST_LOG`.

use std::sync::Arc;

use anyhow::Result;
use pagefront_client::{ArticleService, HttpFetcher, PageFetcher, ServiceOptions};
use pagefront_core::params::env_defaults;
use pagefront_core::{AppConfig, CacheStore, FetcherKind};
use tracing_subscriber::EnvFilter;

mod app;
mod error;
mod routes;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let store = CacheStore::open(&config.cache_dir).await?;
    let fetcher = build_fetcher(&config);

    let options = ServiceOptions {
        env_defaults: env_defaults(),
        user_scripts_dir: config.user_scripts_dir.clone(),
        screenshots_dir: config.screenshots_dir.clone(),
    };
    let service = ArticleService::new(store, fetcher, options);
    let router = app::build_router(app::AppState::new(service.clone()));

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        fetcher = service.fetcher_name(),
        cache_dir = %config.cache_dir.display(),
        "Starting pagefront server"
    );

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("pagefront server stopped");
    Ok(())
}

fn build_fetcher(config: &AppConfig) -> Arc<dyn PageFetcher> {
    match config.fetcher {
        FetcherKind::Http => Arc::new(HttpFetcher::default()),
        #[cfg(feature = "render")]
        FetcherKind::Browser => Arc::new(pagefront_client::BrowserFetcher::new(pagefront_client::BrowserFetcherConfig {
            chrome_executable: config.chrome_path.clone(),
            no_sandbox: config.no_sandbox,
        })),
        #[cfg(not(feature = "render"))]
        FetcherKind::Browser => {
            tracing::warn!("built without the render feature, using the http fetcher");
            Arc::new(HttpFetcher::default())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
