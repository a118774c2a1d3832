//! `estate-server`: serve the listing site API
//!
//! Usage: `estate-server [CONFIG]`. The configuration path falls back to
//! `ESTATE_CONFIG`, then to `config/site.yaml`.

use anyhow::Result;
use estate::config::SiteConfig;
use estate::core::auth::AuthGate;
use estate::directory::PropertyDirectory;
use estate::server::{self, AppState};
use estate::storage::StoreBackend;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/site.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ESTATE_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = SiteConfig::from_yaml_file(&path)?;
    tracing::info!(config = %path, "configuration loaded");

    let backend = StoreBackend::from_config(&config).await?;
    let directory = Arc::new(PropertyDirectory::from_backend(&backend));
    let sync = directory.subscribe_to_changes();

    // Startup continues on a failed load; the next change notification retries.
    if let Err(e) = directory.load_all().await {
        tracing::error!(error = %e, "initial directory load failed");
    }

    let auth = AuthGate::new(backend.sessions.clone());
    let app = AppState::new(directory, auth, config.listings.clone()).router();

    let result = server::serve(config.bind_addr()?, app).await;
    sync.shutdown().await;
    result
}
