mod errors;
mod handlers;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::download::MOUNT_PREFIX;
use crate::download::extractor::Extractor;
use crate::download::job::JobRunner;
use crate::download::yt_dlp::YtDlp;
use crate::store::Store;

/// Everything a request handler needs, cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub jobs: JobRunner,
    pub catalog: Catalog,
    pub store: Store,
}

impl AppState {
    pub fn new(store: Store, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            jobs: JobRunner::new(store.clone(), extractor),
            catalog: Catalog::new(store.clone()),
            store,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let extractor = YtDlp::new(&config.extractor.path, config.extractor.params.clone());
        Self::new(Store::new(&config.downloads_dir), Arc::new(extractor))
    }
}

pub fn router(state: AppState) -> Router {
    let file_route = format!("{}/{{filename}}", MOUNT_PREFIX);
    Router::new()
        .route("/download", post(handlers::download))
        .route(
            MOUNT_PREFIX,
            get(handlers::list).delete(handlers::delete_all),
        )
        .route(&file_route, get(handlers::serve).delete(handlers::delete_one))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Prepares the store and serves until Ctrl-C
pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config);
    state.store.ensure_exists().await.with_context(|| {
        format!(
            "Could not initialize download directory {}",
            config.downloads_dir.display()
        )
    })?;

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("Failed to listen on {}", config.listen_addr()))?;
    info!("Server is running on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server stopped unexpectedly")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
