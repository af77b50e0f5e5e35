use plug_usage_api::repositories::{InMemoryReadingStore, PgReadingRepository, ReadingStore};
use plug_usage_api::services::{
    Clock, SystemClock, TelemetryService, UsageReconstructor, UsageService,
};
use plug_usage_api::{create_pool, create_router, ensure_schema, AppState, Config};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Starting plug-usage-api");

    let cfg_path = std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.yaml".into());
    let cfg = Config::load(&cfg_path)?;
    let zone = cfg.operating_zone()?;
    let threshold = cfg.power_threshold()?;
    info!(
        timezone = zone.name(),
        threshold_w = threshold.watts(),
        "Configuration loaded"
    );

    let store: Arc<dyn ReadingStore> = match cfg.database {
        Some(ref db) => {
            let pool = create_pool(db).await?;
            ensure_schema(&pool).await?;
            info!("Connected to database");
            Arc::new(PgReadingRepository::new(pool))
        }
        None => {
            warn!("No database configured, readings are kept in memory only");
            Arc::new(InMemoryReadingStore::new())
        }
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let usage = UsageService::new(
        store.clone(),
        UsageReconstructor::new(zone, threshold),
        clock.clone(),
    );
    let telemetry = TelemetryService::new(store, threshold, clock);
    let router = create_router(AppState::new(usage, telemetry));

    let addr = cfg.api_bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    info!("API server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Application shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
