//! Change notification feed for listing collections
//!
//! Every store keeps one [`EventBus`] per collection. Writers publish a
//! [`ChangeEvent`] after each successful insert or delete; the directory
//! subscribes and treats every event as "this collection changed, refetch it".
//! Events carry the id of the touched record for logging only, consumers make
//! no use of the payload.
//!
//! ```text
//! insert/delete ──▶ EventBus::publish() ──▶ broadcast channel ──▶ directory sync task
//!                                                             ──▶ other subscribers
//! ```

use crate::core::listing::{Collection, ListingId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// What happened to the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Inserted,
    Deleted,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Inserted => "inserted",
            ChangeAction::Deleted => "deleted",
        }
    }
}

/// A row-level change on one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub action: ChangeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_id: Option<ListingId>,
}

impl ChangeEvent {
    pub fn inserted(collection: Collection, id: ListingId) -> Self {
        Self {
            collection,
            action: ChangeAction::Inserted,
            listing_id: Some(id),
        }
    }

    pub fn deleted(collection: Collection, id: ListingId) -> Self {
        Self {
            collection,
            action: ChangeAction::Deleted,
            listing_id: Some(id),
        }
    }
}

/// Envelope wrapping a change event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    pub event: ChangeEvent,
}

impl EventEnvelope {
    pub fn new(event: ChangeEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Receiving half of a collection's change feed
pub type ChangeFeed = broadcast::Receiver<EventEnvelope>;

/// Broadcast-based change bus for one collection
///
/// Cheap to clone; all clones share the same channel. Slow receivers that
/// fall more than `capacity` events behind get `Lagged` on their next
/// `recv()`, which for a refetch-everything consumer is just another reason
/// to refetch.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per receiver
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails. Returns the number of receivers that will see the event,
    /// zero when nobody is subscribed.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> ChangeFeed {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
