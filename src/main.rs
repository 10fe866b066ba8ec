use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use ecuship::api::routes::{create_router, AppState};
use ecuship::config::Config;
use ecuship::directory::provider_for;
use ecuship::observability::{init_tracing, MetricsRegistry};
use ecuship::rating::{RateEngine, RateSettings};
use ecuship::seed::{apply_seed, load_seed};
use ecuship::storage::{MemoryStorage, PostgresStorage, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize tracing
    init_tracing(&config.log_level, config.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        directory_mode = config.directory_mode.as_str(),
        "Starting ecuship rate service"
    );

    // Open storage
    let storage: Arc<dyn Storage> = match config.database_url {
        Some(ref url) => {
            let pg = PostgresStorage::connect(
                url,
                config.db_min_connections,
                config.db_max_connections,
            )
            .await?;
            pg.run_migrations().await?;
            info!("Connected to PostgreSQL, migrations applied");
            Arc::new(pg)
        }
        None => {
            warn!("No database URL configured, using in-memory storage");
            Arc::new(MemoryStorage::new())
        }
    };

    // Seed routes and cities
    if let Some(ref seed_path) = config.seed_path {
        match load_seed(seed_path) {
            Ok(seed) => {
                apply_seed(storage.as_ref(), &seed).await?;
            }
            Err(e) => {
                error!(path = %seed_path.display(), error = %e, "Failed to load seed file");
                return Err(e.into());
            }
        }
    }

    // Create application state
    let state = Arc::new(AppState {
        directory: provider_for(config.directory_mode, storage.clone()),
        storage,
        engine: RateEngine::new(RateSettings {
            currency: config.currency.clone(),
            ..Default::default()
        }),
        metrics: Arc::new(MetricsRegistry::new()),
        directory_timeout: config.directory_timeout(),
        max_concurrent_requests: config.max_concurrent_requests,
        start_time: Instant::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    // Create router
    let app = create_router(state);

    // Parse listen address
    let addr: SocketAddr = config.listen_addr.parse()?;

    info!(addr = %addr, "Starting HTTP server");

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    if config.graceful_shutdown {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        axum::serve(listener, app).await?;
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
