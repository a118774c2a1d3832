//! JSON API over the property directory and the auth gate

pub mod extract;
pub mod handlers;
pub mod router;

pub use extract::Caller;
pub use router::build_router;

use crate::config::ListingsConfig;
use crate::core::auth::AuthGate;
use crate::directory::PropertyDirectory;
use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<PropertyDirectory>,
    pub auth: AuthGate,
    pub listings: Arc<ListingsConfig>,
}

impl AppState {
    pub fn new(directory: Arc<PropertyDirectory>, auth: AuthGate, listings: ListingsConfig) -> Self {
        Self {
            directory,
            auth,
            listings: Arc::new(listings),
        }
    }

    pub fn router(self) -> Router {
        build_router(self)
    }
}

/// Serve `app` on `addr` until SIGTERM or Ctrl+C
pub async fn serve(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
