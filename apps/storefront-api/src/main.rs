//! API server entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use storefront_api::auth::JwtVerifier;
use storefront_api::{create_app, ApiConfig, AppState};
use storefront_db::{Database, DbConfig};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting storefront API server...");

    // 2. Load configuration
    let config = ApiConfig::load().context("invalid configuration")?;
    info!(
        port = config.port,
        database = %config.database_path,
        policy = %config.coupon_policy,
        "Configuration loaded"
    );

    // 3. Open the database (runs migrations)
    let db = Database::new(
        DbConfig::new(&config.database_path)
            .max_connections(config.db_max_connections)
            .busy_timeout(Duration::from_millis(config.db_busy_timeout_ms)),
    )
    .await
    .context("failed to open database")?;

    // 4. Build state and router
    let verifier = Arc::new(JwtVerifier::new(config.jwt_secret.clone()));
    let state = Arc::new(
        AppState::new(db.clone(), verifier, &config).context("invalid coupon session cache")?,
    );
    let app = create_app(state);

    // 5. Serve
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("server shut down gracefully");
    Ok(())
}
