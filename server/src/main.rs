//! Todo list server.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `session` (default) | `database`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=database`)
//! - `HOST`: server host address (default: `127.0.0.1`)
//! - `PORT`: server port (default: `3000`)
//! - `SESSION_IDLE_MINUTES`: idle minutes before a session is dropped (default: `1440`)
//! - `RUST_LOG`: logging filter (default: `todo_server=debug,tower_http=debug`)

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_server::{router, AppState, ServerConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "configuration error");
            std::process::exit(1);
        }
    };
    tracing::info!(storage_mode = ?config.storage_mode, "configuration loaded");

    let state = match AppState::from_config(&config).await {
        Ok(state) => state,
        Err(error) => {
            tracing::error!(%error, "failed to initialize storage");
            std::process::exit(1);
        }
    };

    let (host, port) = config.bind_address();
    let listener = match TcpListener::bind((host, port)).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, host, port, "failed to bind");
            std::process::exit(1);
        }
    };
    match listener.local_addr() {
        Ok(address) => tracing::info!("listening on {address}"),
        Err(_) => tracing::info!(host, port, "listening"),
    }

    if let Err(error) = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "server error");
        std::process::exit(1);
    }

    tracing::info!("server shutdown complete");
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
