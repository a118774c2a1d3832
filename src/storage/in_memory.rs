//! In-memory listing store for development and testing
//!
//! Rows live behind an `RwLock`, newest first. Each collection has its own
//! [`EventBus`]; a successful insert or delete publishes one change event.
//! The session service keeps a small account table seeded from configuration.

use crate::core::error::{AuthError, StoreError};
use crate::core::events::{ChangeEvent, ChangeFeed, EventBus};
use crate::core::listing::{Listing, ListingId};
use crate::core::service::{Credentials, ListingService, Session, SessionService, SessionTable};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use uuid::Uuid;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid login credentials";

/// In-memory store for one listing collection
///
/// Cheap to clone; clones share rows and change bus.
#[derive(Clone)]
pub struct InMemoryListingService<T: Listing> {
    rows: Arc<RwLock<Vec<T>>>,
    bus: EventBus,
}

impl<T: Listing> InMemoryListingService<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
            bus: EventBus::new(capacity),
        }
    }

    /// Change bus of this collection
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

impl<T: Listing> Default for InMemoryListingService<T> {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl<T: Listing> ListingService<T> for InMemoryListingService<T> {
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire read lock: {}", e)))?;

        Ok(rows.clone())
    }

    async fn insert(&self, draft: T::Draft) -> Result<T, StoreError> {
        draft
            .validate()
            .map_err(|e| StoreError::Rejected(e.to_string()))?;

        let record = T::from_draft(ListingId::generate(), Utc::now(), draft);
        {
            let mut rows = self.rows.write().map_err(|e| {
                StoreError::Unavailable(format!("Failed to acquire write lock: {}", e))
            })?;
            rows.insert(0, record.clone());
        }

        self.bus
            .publish(ChangeEvent::inserted(T::COLLECTION, record.id().clone()));
        Ok(record)
    }

    async fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
        let removed = {
            let mut rows = self.rows.write().map_err(|e| {
                StoreError::Unavailable(format!("Failed to acquire write lock: {}", e))
            })?;
            let before = rows.len();
            rows.retain(|row| row.id() != id);
            rows.len() != before
        };

        if removed {
            self.bus.publish(ChangeEvent::deleted(T::COLLECTION, id.clone()));
        }
        Ok(())
    }

    fn subscribe(&self) -> ChangeFeed {
        self.bus.subscribe()
    }
}

struct Account {
    user_id: Uuid,
    password: String,
}

/// In-memory session service
///
/// Passwords are compared as given; this backend exists for local runs and
/// tests, not for deployment. Each sign-in issues a fresh random token.
pub struct InMemorySessionService {
    accounts: RwLock<HashMap<String, Account>>,
    sessions: watch::Sender<SessionTable>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        let (sessions, _) = watch::channel(SessionTable::default());
        Self {
            accounts: RwLock::new(HashMap::new()),
            sessions,
        }
    }

    /// Register an account without signing it in
    pub fn register(&self, credentials: &Credentials) -> Result<Uuid, AuthError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|e| AuthError::new(format!("Failed to acquire write lock: {}", e)))?;

        let key = normalize(&credentials.email);
        if accounts.contains_key(&key) {
            return Err(AuthError::new("User already registered"));
        }

        let user_id = Uuid::new_v4();
        accounts.insert(
            key,
            Account {
                user_id,
                password: credentials.password.clone(),
            },
        );
        Ok(user_id)
    }

    fn establish(&self, user_id: Uuid, email: &str) -> Session {
        let session = Session {
            user_id,
            email: normalize(email),
            access_token: Uuid::new_v4().simple().to_string(),
            established_at: Utc::now(),
        };
        self.sessions
            .send_modify(|table| table.insert(session.clone()));
        session
    }
}

impl Default for InMemorySessionService {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let user_id = {
            let accounts = self
                .accounts
                .read()
                .map_err(|e| AuthError::new(format!("Failed to acquire read lock: {}", e)))?;

            match accounts.get(&normalize(&credentials.email)) {
                Some(account) if account.password == credentials.password => account.user_id,
                _ => return Err(AuthError::new(INVALID_CREDENTIALS)),
            }
        };

        Ok(self.establish(user_id, &credentials.email))
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let user_id = self.register(credentials)?;
        Ok(self.establish(user_id, &credentials.email))
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.sessions
            .send_if_modified(|table| table.remove(token).is_some());
        Ok(())
    }

    fn session_changes(&self) -> watch::Receiver<SessionTable> {
        self.sessions.subscribe()
    }
}
