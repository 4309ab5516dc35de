use anyhow::{Context, Result};
use environment_sidecar::config::Config;
use environment_sidecar::ingest::IngestCoordinator;
use environment_sidecar::routes;
use environment_sidecar::services::{EnvironmentService, StatsService, TraceService};
use environment_sidecar::state::AppState;
use environment_sidecar::store::{
    build_pool, PgEnvironmentalStore, PgInventory, PgMaterialCatalog, PgSiteDirectory,
    PgTransactionLog,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = build_pool(&config.database_url, config.db_pool_size).await?;

    let store = Arc::new(PgEnvironmentalStore::new(
        pool.clone(),
        config.latest_window_hours,
    ));
    let sites = Arc::new(PgSiteDirectory::new(pool.clone()));

    let cancel = CancellationToken::new();
    let coordinator =
        IngestCoordinator::start(&config, sites.clone(), store.clone(), cancel.clone()).await?;
    tracing::info!(readers = coordinator.reader_count().await, "ingestion running");

    let environment = Arc::new(EnvironmentService::new(
        store.clone(),
        config.chart_max_points,
    ));
    let trace = Arc::new(TraceService::new(
        Arc::new(PgTransactionLog::new(pool.clone())),
        Arc::new(PgInventory::new(pool.clone())),
        Arc::new(PgMaterialCatalog::new(pool.clone())),
        environment.clone(),
    ));
    let stats = Arc::new(StatsService::new(sites, environment.clone()));

    let app = routes::router(AppState {
        environment,
        trace,
        stats,
    });

    let addr = format!("{}:{}", config.http_host, config.http_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind listener on {addr}"))?;
    tracing::info!(addr = %addr, "listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
            shutdown.cancel();
        })
        .await?;
    cancel.cancel();
    Ok(())
}
