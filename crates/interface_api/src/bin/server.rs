//! Treasury API Server Binary
//!
//! Starts the HTTP API for bill payments, cash-flow projection and the
//! consumption dashboard.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin treasury-api
//!
//! # Run with environment variables
//! API_HOST=0.0.0.0 API_PORT=8080 API_DATABASE_URL=postgres://... cargo run --bin treasury-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_MAX_COMMIT_ATTEMPTS` - Payment unit attempts on write conflicts (default: 3)
//! * `API_RETRY_BACKOFF_MS` - Base backoff between attempts (default: 50)
//! * `API_DEFAULT_MONTHS_AHEAD` - Projection horizon (default: 6)
//! * `API_NOTIFICATION_BUFFER` - Bill-paid notification queue size (default: 256)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_treasury::adapters::{spawn_dispatcher, ChannelNotifier};
use infra_db::{create_pool, run_migrations, PostgresCashflowSource, PostgresTreasuryStore};
use interface_api::{config::ApiConfig, create_router, AppState};

/// Main entry point for the API server.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - Database connection or migrations fail
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Treasury API Server"
    );

    let pool = create_pool(config.database()).await?;
    run_migrations(&pool).await?;

    let (notifier, receiver) = ChannelNotifier::new(config.notification_buffer);
    let dispatcher = spawn_dispatcher(receiver);

    let state = AppState::new(
        Arc::new(PostgresTreasuryStore::new(pool.clone())),
        Arc::new(PostgresCashflowSource::new(pool)),
        Arc::new(notifier),
        config.clone(),
    );
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last sender; the dispatcher drains and exits.
    if let Err(e) = dispatcher.await {
        tracing::warn!(error = %e, "Notification dispatcher ended abnormally");
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
