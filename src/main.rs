use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use orgchart_api::config::{self, AppConfig};
use orgchart_api::layout::LayoutEngine;
use orgchart_api::share::{
    spawn_expiry_sweeper, Clock, FileSnapshotStore, MemorySnapshotStore, ShareTokenManager, SnapshotStore,
    SystemClock,
};
use orgchart_api::source::{EmployeeSource, FileEmployeeSource, MemoryEmployeeSource, PgEmployeeSource};
use orgchart_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, ORGCHART_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    info!("Starting Org Chart API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        if orgchart_api::is_production!() {
            anyhow::bail!("ORGCHART_JWT_SECRET must be set in production");
        }
        warn!("ORGCHART_JWT_SECRET is not set; every /api request will be rejected");
    }

    let source = employee_source(config).await?;
    info!("Reading staff data from {}", source.describe());

    let store: Arc<dyn SnapshotStore> = match &config.share.store_path {
        Some(path) => Arc::new(FileSnapshotStore::open(path).await?),
        None => Arc::new(MemorySnapshotStore::new()),
    };
    let shares = ShareTokenManager::new(store);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    if config.share.sweep_interval_secs > 0 {
        spawn_expiry_sweeper(
            shares.clone(),
            clock.clone(),
            StdDuration::from_secs(config.share.sweep_interval_secs),
            config.share.expired_retention(),
        );
    }

    let state = AppState::new(
        source,
        shares,
        clock,
        LayoutEngine::new(config.layout),
        config.share.clone(),
        &config.server.public_base_url,
    )
    .context("invalid ORGCHART_PUBLIC_BASE_URL")?;

    let app = orgchart_api::app(state, config.security.enable_cors);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Org Chart API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// File beats database; with neither configured the chart is empty.
async fn employee_source(config: &AppConfig) -> anyhow::Result<Arc<dyn EmployeeSource>> {
    if let Some(path) = &config.source.employees_file {
        return Ok(Arc::new(FileEmployeeSource::new(path)?));
    }

    if let Some(url) = &config.source.database_url {
        let source =
            PgEmployeeSource::connect(url, &config.source.staff_table, config.source.max_connections).await?;
        return Ok(Arc::new(source));
    }

    warn!("No staff source configured (ORGCHART_EMPLOYEES_FILE or DATABASE_URL); serving an empty chart");
    Ok(Arc::new(MemoryEmployeeSource::new(Vec::new())))
}
