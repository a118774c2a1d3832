//! Listing store backends
//!
//! [`StoreBackend`] bundles the three collaborators the rest of the crate
//! consumes: one [`ListingService`] per collection and the
//! [`SessionService`].

pub mod in_memory;
#[cfg(feature = "rest")]
pub mod rest;

pub use in_memory::{InMemoryListingService, InMemorySessionService};
#[cfg(feature = "rest")]
pub use rest::{RestListingService, RestSessionService};

use crate::config::{SeedData, SiteConfig, StoreConfig};
use crate::core::listing::{Plot, RentalHouse};
use crate::core::service::{ListingService, SessionService};
use anyhow::{Context, Result};
use std::sync::Arc;

/// The listing store as seen by the directory and the auth gate
#[derive(Clone)]
pub struct StoreBackend {
    pub plots: Arc<dyn ListingService<Plot>>,
    pub rentals: Arc<dyn ListingService<RentalHouse>>,
    pub sessions: Arc<dyn SessionService>,
}

impl StoreBackend {
    /// Empty in-memory backend
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            plots: Arc::new(InMemoryListingService::<Plot>::new(capacity)),
            rentals: Arc::new(InMemoryListingService::<RentalHouse>::new(capacity)),
            sessions: Arc::new(InMemorySessionService::new()),
        }
    }

    /// Build the backend selected by configuration
    pub async fn from_config(config: &SiteConfig) -> Result<Self> {
        match &config.store {
            StoreConfig::InMemory { admins, seed } => {
                let sessions = InMemorySessionService::new();
                for admin in admins {
                    sessions
                        .register(admin)
                        .with_context(|| format!("Failed to register admin {}", admin.email))?;
                }

                let backend = Self {
                    plots: Arc::new(InMemoryListingService::<Plot>::new(config.events.capacity)),
                    rentals: Arc::new(InMemoryListingService::<RentalHouse>::new(
                        config.events.capacity,
                    )),
                    sessions: Arc::new(sessions),
                };
                backend.seed(seed).await?;
                Ok(backend)
            }
            #[cfg(feature = "rest")]
            StoreConfig::Rest {
                url,
                api_key,
                plots_table,
                rentals_table,
            } => Ok(rest::backend(
                url,
                api_key,
                plots_table,
                rentals_table,
                config.events.capacity,
            )?),
            #[cfg(not(feature = "rest"))]
            StoreConfig::Rest { .. } => {
                anyhow::bail!("the rest store backend requires the `rest` feature")
            }
        }
    }

    /// Insert seed records in reverse so the first entry lists first
    pub async fn seed(&self, seed: &SeedData) -> Result<()> {
        for plot in seed.plots.iter().rev() {
            self.plots
                .insert(plot.clone())
                .await
                .with_context(|| format!("Failed to seed plot '{}'", plot.title))?;
        }
        for house in seed.rentals.iter().rev() {
            self.rentals
                .insert(house.clone())
                .await
                .with_context(|| format!("Failed to seed rental '{}'", house.title))?;
        }

        tracing::info!(
            plots = seed.plots.len(),
            rentals = seed.rentals.len(),
            "listing store seeded"
        );
        Ok(())
    }
}
