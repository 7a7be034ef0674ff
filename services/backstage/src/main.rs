//! Backstage HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage and token verification into the router, then
//! serves the API and the metrics listener until shutdown.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use backstage::app::{AppState, build_router};
use backstage::auth::TokenVerifier;
use backstage::config::{self, BackstageConfig};
use backstage::observability;
use backstage::store::Store;
use backstage::store::memory::InMemoryStore;
use backstage::store::postgres::PostgresStore;
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BackstageConfig::from_env_or_yaml().context("backstage config")?;
    run_with_shutdown(config, shutdown_signal()).await
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn run_with_shutdown<F>(config: BackstageConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("backstage", &config.profile)?;
    let state = build_state(config.clone()).await?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state.clone());
    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(
        profile = %state.profile,
        %addr,
        backend = state.store.backend_name(),
        "started application with profile: {}",
        state.profile
    );
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    tracing::info!(profile = %state.profile, "stopping application cleanly");
    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: BackstageConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn Store> = match config.storage {
        config::StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        config::StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(PostgresStore::connect(pg).await?)
        }
    };
    let tokens = match config.auth.jwt_secret.as_deref() {
        Some(secret) => Some(TokenVerifier::new(
            secret.as_bytes(),
            config.auth.jwt_issuer.clone(),
        )),
        None => {
            tracing::warn!("no token secret configured; every caller is anonymous");
            None
        }
    };
    Ok(AppState {
        store,
        tokens,
        profile: config.profile,
    })
}
