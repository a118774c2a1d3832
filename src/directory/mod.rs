//! Property directory: the in-process copy of both listing collections
//!
//! The directory is the single writer of its caches. Every refresh replaces a
//! collection wholesale with one snapshot swap, so readers see either the old
//! or the new collection, never a mix. Mutations are write-through and not
//! optimistic: the cache only changes when the store's change feed triggers a
//! refetch (or when the caller refreshes explicitly).
//!
//! ```text
//! create/delete ──▶ ListingService ──▶ change feed ──▶ sync task ──▶ refresh() ──▶ snapshot swap
//!                                                                                     │
//!                                                                       revision watch ◀┘
//! ```

use crate::core::error::{ListingError, WriteOp};
use crate::core::events::ChangeFeed;
use crate::core::filter;
use crate::core::listing::{Listing, ListingId, Plot, RentalHouse};
use crate::core::service::ListingService;
use crate::storage::StoreBackend;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Atomically swapped snapshot of one collection
pub struct ListingCache<T> {
    current: RwLock<Arc<Vec<T>>>,
}

impl<T> ListingCache<T> {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Current snapshot; later swaps do not affect it
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the whole collection in one swap
    pub fn replace(&self, items: Vec<T>) {
        let next = Arc::new(items);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

impl<T> Default for ListingCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Store handle plus cache for one collection
struct CollectionSync<T: Listing> {
    store: Arc<dyn ListingService<T>>,
    cache: ListingCache<T>,
    revision: Arc<watch::Sender<u64>>,
}

impl<T: Listing> CollectionSync<T> {
    async fn refresh(&self) -> Result<usize, ListingError> {
        let records = self
            .store
            .list()
            .await
            .map_err(|e| ListingError::read(T::COLLECTION, e))?;

        let count = records.len();
        self.cache.replace(records);
        self.revision.send_modify(|r| *r += 1);

        tracing::debug!(collection = %T::COLLECTION, count, "collection refreshed");
        Ok(count)
    }

    async fn create(&self, draft: T::Draft) -> Result<T, ListingError> {
        let record = self
            .store
            .insert(draft)
            .await
            .map_err(|e| ListingError::write(T::COLLECTION, WriteOp::Create, e))?;

        tracing::info!(collection = %T::COLLECTION, id = %record.id(), "listing created");
        Ok(record)
    }

    async fn delete(&self, id: &ListingId) -> Result<(), ListingError> {
        self.store
            .delete(id)
            .await
            .map_err(|e| ListingError::write(T::COLLECTION, WriteOp::Delete, e))?;

        tracing::info!(collection = %T::COLLECTION, id = %id, "listing deleted");
        Ok(())
    }
}

/// Refetch `collection` on every event of `feed` until the feed closes
fn spawn_sync<T: Listing>(collection: Arc<CollectionSync<T>>, mut feed: ChangeFeed) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match feed.recv().await {
                Ok(envelope) => {
                    tracing::debug!(
                        collection = %T::COLLECTION,
                        action = envelope.event.action.as_str(),
                        "change notification received"
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(collection = %T::COLLECTION, skipped, "change feed lagged");
                }
                Err(RecvError::Closed) => {
                    tracing::debug!(collection = %T::COLLECTION, "change feed closed");
                    break;
                }
            }

            if let Err(e) = collection.refresh().await {
                tracing::warn!(collection = %T::COLLECTION, error = %e, "refresh after change failed");
            }
        }
    })
}

/// Guard over the directory's change subscriptions
///
/// Dropping the guard aborts the sync tasks, which releases their feeds.
/// [`SyncHandle::shutdown`] additionally waits until they are gone.
#[must_use = "dropping the handle ends change synchronization"]
pub struct SyncHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl SyncHandle {
    /// Whether any sync task is still running
    pub fn is_active(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    /// Stop synchronization and wait for the subscriptions to be released
    pub async fn shutdown(mut self) {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        tracing::debug!("directory sync stopped");
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// In-process cache of plots and rentals, synchronized with the listing store
pub struct PropertyDirectory {
    plots: Arc<CollectionSync<Plot>>,
    rentals: Arc<CollectionSync<RentalHouse>>,
    revision: Arc<watch::Sender<u64>>,
}

impl PropertyDirectory {
    pub fn new(
        plots: Arc<dyn ListingService<Plot>>,
        rentals: Arc<dyn ListingService<RentalHouse>>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        let revision = Arc::new(revision);

        Self {
            plots: Arc::new(CollectionSync {
                store: plots,
                cache: ListingCache::new(),
                revision: revision.clone(),
            }),
            rentals: Arc::new(CollectionSync {
                store: rentals,
                cache: ListingCache::new(),
                revision: revision.clone(),
            }),
            revision,
        }
    }

    pub fn from_backend(backend: &StoreBackend) -> Self {
        Self::new(backend.plots.clone(), backend.rentals.clone())
    }

    // === Reads ===

    pub fn plots(&self) -> Arc<Vec<Plot>> {
        self.plots.cache.snapshot()
    }

    pub fn rentals(&self) -> Arc<Vec<RentalHouse>> {
        self.rentals.cache.snapshot()
    }

    pub fn plot(&self, id: &ListingId) -> Option<Plot> {
        filter::find_by_id(&self.plots(), id).cloned()
    }

    pub fn rental(&self, id: &ListingId) -> Option<RentalHouse> {
        filter::find_by_id(&self.rentals(), id).cloned()
    }

    /// Number of snapshot swaps so far
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Receiver notified after every snapshot swap
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // === Synchronization ===

    /// Fetch both collections from the store
    ///
    /// Each collection is swapped independently. On failure the affected
    /// collection keeps its previous snapshot and the first error is returned;
    /// nothing is retried.
    pub async fn load_all(&self) -> Result<(), ListingError> {
        let (plots, rentals) = tokio::join!(self.plots.refresh(), self.rentals.refresh());

        match (plots, rentals) {
            (Ok(plots), Ok(rentals)) => {
                tracing::info!(plots, rentals, "directory loaded");
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "directory load failed");
                Err(e)
            }
        }
    }

    pub async fn refresh_plots(&self) -> Result<usize, ListingError> {
        self.plots.refresh().await
    }

    pub async fn refresh_rentals(&self) -> Result<usize, ListingError> {
        self.rentals.refresh().await
    }

    /// Subscribe to both change feeds; each event refetches its collection
    pub fn subscribe_to_changes(&self) -> SyncHandle {
        let tasks = vec![
            spawn_sync(self.plots.clone(), self.plots.store.subscribe()),
            spawn_sync(self.rentals.clone(), self.rentals.store.subscribe()),
        ];
        tracing::debug!("directory sync started");
        SyncHandle { tasks }
    }

    // === Write-through ===

    pub async fn create_plot(&self, draft: <Plot as Listing>::Draft) -> Result<Plot, ListingError> {
        self.plots.create(draft).await
    }

    pub async fn delete_plot(&self, id: &ListingId) -> Result<(), ListingError> {
        self.plots.delete(id).await
    }

    pub async fn create_rental(
        &self,
        draft: <RentalHouse as Listing>::Draft,
    ) -> Result<RentalHouse, ListingError> {
        self.rentals.create(draft).await
    }

    pub async fn delete_rental(&self, id: &ListingId) -> Result<(), ListingError> {
        self.rentals.delete(id).await
    }
}
