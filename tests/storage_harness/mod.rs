//! Shared test harness for listing store and directory testing
//!
//! Provides draft builders for both collections, a [`FlakyListingService`]
//! that fails on demand, and helpers for waiting on directory revisions.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
mod listing_service_tests;

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use estate::core::error::StoreError;
use estate::core::events::ChangeFeed;
use estate::core::listing::{
    Furnishing, Listing, ListingId, NewPlot, NewRentalHouse, PlotType, SizeUnit,
};
use estate::core::service::ListingService;
use estate::storage::InMemoryListingService;

// ---------------------------------------------------------------------------
// Draft builders
// ---------------------------------------------------------------------------

pub fn plot_draft(title: &str, price: f64, location: &str, size: f64, plot_type: PlotType) -> NewPlot {
    NewPlot {
        title: title.to_string(),
        price,
        location: location.to_string(),
        size,
        size_unit: SizeUnit::SqFt,
        dimensions: "40x60 ft".to_string(),
        plot_type,
        description: format!("{} description", title),
        images: vec![],
        features: vec!["Road Access".to_string()],
    }
}

pub fn rental_draft(
    title: &str,
    monthly_rent: f64,
    location: &str,
    bedrooms: u32,
    bathrooms: u32,
    furnishing: Furnishing,
) -> NewRentalHouse {
    NewRentalHouse {
        title: title.to_string(),
        monthly_rent,
        deposit: monthly_rent * 2.0,
        location: location.to_string(),
        bedrooms,
        bathrooms,
        sqft: 1000 + bedrooms * 300,
        furnishing,
        available_from: "2026-02-01".to_string(),
        description: format!("{} description", title),
        images: vec![],
        amenities: vec!["Parking".to_string()],
    }
}

/// A residential plot with only the title varying
pub fn simple_plot(title: &str) -> NewPlot {
    plot_draft(title, 100_000.0, "Green Valley", 2400.0, PlotType::Residential)
}

// ---------------------------------------------------------------------------
// FlakyListingService: in-memory store that fails on demand
// ---------------------------------------------------------------------------

/// In-memory listing store whose reads and writes can be made to fail
///
/// Change events still flow from the wrapped store, so a failing read can be
/// observed as a refresh error inside the directory's sync task.
pub struct FlakyListingService<T: Listing> {
    inner: InMemoryListingService<T>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
}

impl<T: Listing> FlakyListingService<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryListingService::new(64),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
        })
    }

    pub fn inner(&self) -> &InMemoryListingService<T> {
        &self.inner
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `list` calls so far, failed ones included
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Live change feed subscriptions on the wrapped store
    pub fn subscribers(&self) -> usize {
        self.inner.bus().receiver_count()
    }
}

#[async_trait]
impl<T: Listing> ListingService<T> for FlakyListingService<T> {
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.list().await
    }

    async fn insert(&self, draft: T::Draft) -> Result<T, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.insert(draft).await
    }

    async fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.delete(id).await
    }

    fn subscribe(&self) -> ChangeFeed {
        self.inner.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Waiting helpers
// ---------------------------------------------------------------------------

const WAIT_LIMIT: Duration = Duration::from_secs(2);

/// Wait until the revision counter reaches `at_least`
pub async fn wait_for_revision(rx: &mut watch::Receiver<u64>, at_least: u64) {
    tokio::time::timeout(WAIT_LIMIT, rx.wait_for(|revision| *revision >= at_least))
        .await
        .unwrap_or_else(|_| panic!("revision {} not reached in time", at_least))
        .expect("directory dropped");
}

/// Poll `condition` until it holds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
