//! # Estate Listings
//!
//! Listing directory, filter engine and admin API for a real-estate site that
//! publishes plots of land for sale and houses for rent.
//!
//! ## Features
//!
//! - **Filter/Sort Engine**: Pure functions over listing snapshots (price, size, location, type, rooms)
//! - **Property Directory**: In-process cache kept in sync with the listing store via change feeds
//! - **Write-Through Admin Operations**: Create and delete go to the store; the cache follows notifications
//! - **Auth Gate**: Per-client admin sessions gating the admin surface
//! - **Pluggable Stores**: In-memory backend by default, PostgREST-compatible backend behind `rest`
//! - **Configuration-Based**: Server, listing presentation and store selection via YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use estate::prelude::*;
//! use std::sync::Arc;
//!
//! let backend = StoreBackend::in_memory(1024);
//! let directory = Arc::new(PropertyDirectory::from_backend(&backend));
//! directory.load_all().await?;
//! let _sync = directory.subscribe_to_changes();
//!
//! let criteria = PlotCriteria {
//!     location: Some("valley".into()),
//!     ..Default::default()
//! };
//! let plots = filter_plots(&directory.plots(), &criteria, SortKey::PriceLow);
//! ```

pub mod config;
pub mod core;
pub mod directory;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Model ===
    pub use crate::core::listing::{
        Collection, Furnishing, Listing, ListingId, NewPlot, NewRentalHouse, Plot, PlotType,
        RentalHouse, SizeUnit,
    };

    // === Filter/Sort Engine ===
    pub use crate::core::filter::{
        Criteria, PlotCriteria, RentalCriteria, SortKey, featured, filter_and_sort, filter_plots,
        filter_rentals, find_by_id, similar_plots, similar_rentals,
    };

    // === Store Traits and Events ===
    pub use crate::core::events::{ChangeAction, ChangeEvent, ChangeFeed, EventBus, EventEnvelope};
    pub use crate::core::service::{
        Credentials, ListingService, Session, SessionService, SessionTable,
    };

    // === Errors ===
    pub use crate::core::error::{AuthError, ListingError, StoreError, WriteOp};

    // === Auth ===
    pub use crate::core::auth::{AuthContext, AuthGate, AuthPolicy};

    // === Directory ===
    pub use crate::directory::{ListingCache, PropertyDirectory, SyncHandle};

    // === Storage ===
    pub use crate::storage::{InMemoryListingService, InMemorySessionService, StoreBackend};

    // === Config ===
    pub use crate::config::{ListingsConfig, SiteConfig, StoreConfig};

    // === Server ===
    pub use crate::server::{AppState, Caller, build_router, serve};

    // === Re-exports from dependencies ===
    pub use anyhow::{Result, anyhow};
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
}
