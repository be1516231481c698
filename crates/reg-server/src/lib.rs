//! reg-server: HTTP API for registrar.
//!
//! Exposes every registrar resource as JSON REST under `/api`, gates
//! mutations behind the admin API key, and serves an OpenAPI document with
//! Swagger UI. [`start`] runs the server until SIGINT or SIGTERM.

pub mod context;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod router;
pub mod routes;

use std::net::SocketAddr;

use reg_core::config::Config;

use crate::context::AppContext;

/// Start the registrar server.
///
/// Opens (and migrates) the database, builds the router and serves it until a
/// shutdown signal arrives.
pub async fn start(config: Config) -> reg_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }
    let db_str = db_path.to_string_lossy();
    let db = reg_db::pool::init_pool(&db_str, &config.database)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| reg_core::Error::Internal(format!("Invalid server address: {e}")))?;

    if config.auth.enabled {
        tracing::info!("Admin API key required for write requests");
    } else {
        tracing::warn!("Auth disabled: write requests are open");
    }

    let app = router::build_router(AppContext::new(db, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| reg_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Starting server on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
