//! Service traits for the listing store collaborator
//!
//! The directory and the auth gate only see these traits; the concrete
//! persistence (in-memory, PostgREST-compatible REST) lives in `storage`.

use crate::core::error::{AuthError, StoreError};
use crate::core::events::ChangeFeed;
use crate::core::listing::{Listing, ListingId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::watch;
use uuid::Uuid;

/// Store operations for one listing collection
///
/// Implementations assign `id` and `created_at` on insert and publish a
/// change event on their feed after every successful write.
#[async_trait]
pub trait ListingService<T: Listing>: Send + Sync {
    /// Fetch every record, newest first by creation time
    async fn list(&self) -> Result<Vec<T>, StoreError>;

    /// Insert a new record and return it as stored
    async fn insert(&self, draft: T::Draft) -> Result<T, StoreError>;

    /// Delete a record by id
    ///
    /// Deleting an absent id is not an error.
    async fn delete(&self, id: &ListingId) -> Result<(), StoreError>;

    /// Subscribe to change notifications for this collection
    ///
    /// Dropping the returned feed releases the subscription.
    fn subscribe(&self) -> ChangeFeed;
}

/// Credential pair submitted to login/signup
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An established admin session, as reported by the store
///
/// `access_token` identifies the session to the store. It is handed to the
/// client that signed in and presented back on every admin request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub established_at: DateTime<Utc>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("access_token", &"<redacted>")
            .field("established_at", &self.established_at)
            .finish()
    }
}

/// Live sessions keyed by access token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTable {
    sessions: HashMap<String, Session>,
}

impl SessionTable {
    pub fn get(&self, token: &str) -> Option<&Session> {
        self.sessions.get(token)
    }

    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.access_token.clone(), session);
    }

    pub fn remove(&mut self, token: &str) -> Option<Session> {
        self.sessions.remove(token)
    }

    /// Most recently established session
    pub fn latest(&self) -> Option<&Session> {
        self.sessions.values().max_by_key(|s| s.established_at)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Session-based authentication offered by the listing store
///
/// Every successful sign-in or sign-up establishes a separate session; ending
/// one leaves the others alive.
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// End the session identified by `token`
    ///
    /// Unknown tokens are not an error.
    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

    /// Session-change feed; the current value holds every live session
    fn session_changes(&self) -> watch::Receiver<SessionTable>;
}
