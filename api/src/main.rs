use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

mod handlers;
mod routes;
mod state;

use common::config::{LockBackend, Settings};
use common::db::repositories::{AvailabilityRepository, WorkItemRepository};
use common::db::{DbPool, RedisPool};
use common::lock::{DistributedLock, LocalLock, RedLock};
use common::planner::{PlannerService, ReschedulePolicy};
use common::telemetry;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load and validate configuration before anything else
    let config = Settings::load()?;
    config.validate().map_err(anyhow::Error::msg)?;

    telemetry::init_logging(
        &config.observability.log_level,
        config.observability.tracing_endpoint.as_deref(),
    )?;
    telemetry::init_metrics(config.observability.metrics_port)?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        timezone = %config.planner.timezone,
        max_days = config.planner.max_days,
        "Configuration loaded"
    );

    // Initialize database connection pool
    let db_pool = DbPool::new(&config.database).await?;
    tracing::info!("Database connection pool established");

    if config.database.run_migrations {
        db_pool.run_migrations().await?;
    } else {
        tracing::info!("Database migrations skipped");
    }

    let lock = build_lock(&config).await?;
    let policy = ReschedulePolicy::from_config(&config.planner).map_err(anyhow::Error::msg)?;

    let planner = PlannerService::new(
        Arc::new(AvailabilityRepository::new(db_pool.clone())),
        Arc::new(WorkItemRepository::new(db_pool.clone())),
        lock,
        policy,
        Duration::from_secs(config.planner.lock_ttl_seconds),
    );

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    let state = AppState::new(db_pool.clone(), planner, config);
    let app = routes::create_router(state);

    tracing::info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    telemetry::shutdown_tracer();

    tracing::info!("API server stopped");
    Ok(())
}

/// Per-learner lock backend selected by `planner.lock_backend`
async fn build_lock(config: &Settings) -> Result<Arc<dyn DistributedLock>> {
    match config.planner.lock_backend {
        LockBackend::Local => {
            tracing::info!("Using in-process learner lock");
            Ok(Arc::new(LocalLock::new()))
        }
        LockBackend::Redis => {
            let redis_pool = RedisPool::new(&config.redis).await?;
            redis_pool.health_check().await?;
            tracing::info!("Using Redis learner lock");
            Ok(Arc::new(RedLock::new(redis_pool)))
        }
    }
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Initiating graceful shutdown");
}
