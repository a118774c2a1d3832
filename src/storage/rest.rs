//! PostgREST-compatible remote listing store
//!
//! Talks to a hosted backend exposing tables under `/rest/v1/{table}` and
//! password authentication under `/auth/v1`. Every sign-in yields its own
//! access token, returned to the caller and kept in the session table. The
//! listing clients send the most recent live token so admin writes run under
//! an admin session; with no session they fall back to the API key.
//!
//! Change notification covers writes issued through this process: after a
//! successful insert or delete the client publishes on its local bus.

use super::StoreBackend;
use crate::core::error::{AuthError, StoreError};
use crate::core::events::{ChangeEvent, ChangeFeed, EventBus};
use crate::core::listing::{Listing, ListingId, Plot, RentalHouse};
use crate::core::service::{Credentials, ListingService, Session, SessionService, SessionTable};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;
use validator::Validate;

/// HTTP plumbing shared by the listing and session clients
#[derive(Clone)]
struct RestClient {
    http: Client,
    base_url: String,
    api_key: String,
    sessions: Arc<watch::Sender<SessionTable>>,
}

impl RestClient {
    fn new(http: Client, base_url: &str, api_key: &str) -> Self {
        let (sessions, _) = watch::channel(SessionTable::default());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            sessions: Arc::new(sessions),
        }
    }

    fn bearer(&self) -> String {
        self.sessions
            .borrow()
            .latest()
            .map(|session| session.access_token.clone())
            .unwrap_or_else(|| self.api_key.clone())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_as(method, path, &self.bearer())
    }

    fn request_as(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }
}

fn unavailable(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// Map non-success statuses: 4xx is a rejection, everything else an outage
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = format!("{}: {}", status, body);
    if status.is_client_error() {
        Err(StoreError::Rejected(message))
    } else {
        Err(StoreError::Unavailable(message))
    }
}

/// Remote store for one listing collection
pub struct RestListingService<T: Listing> {
    client: RestClient,
    table: String,
    bus: EventBus,
    _record: PhantomData<fn() -> T>,
}

impl<T: Listing> RestListingService<T> {
    fn new(client: RestClient, table: &str, capacity: usize) -> Self {
        Self {
            client,
            table: table.to_string(),
            bus: EventBus::new(capacity),
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Listing> ListingService<T> for RestListingService<T> {
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let path = format!("/rest/v1/{}", self.table);
        let response = self
            .client
            .request(Method::GET, &path)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await
            .map_err(unavailable)?;

        check(response)
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(unavailable)
    }

    async fn insert(&self, draft: T::Draft) -> Result<T, StoreError> {
        draft
            .validate()
            .map_err(|e| StoreError::Rejected(e.to_string()))?;

        let path = format!("/rest/v1/{}", self.table);
        let response = self
            .client
            .request(Method::POST, &path)
            .header("Prefer", "return=representation")
            .json(&draft)
            .send()
            .await
            .map_err(unavailable)?;

        let record = check(response)
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(unavailable)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Unavailable("insert returned no representation".into()))?;

        self.bus
            .publish(ChangeEvent::inserted(T::COLLECTION, record.id().clone()));
        Ok(record)
    }

    async fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
        let path = format!("/rest/v1/{}", self.table);
        let response = self
            .client
            .request(Method::DELETE, &path)
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(unavailable)?;
        check(response).await?;

        self.bus.publish(ChangeEvent::deleted(T::COLLECTION, id.clone()));
        Ok(())
    }

    fn subscribe(&self) -> ChangeFeed {
        self.bus.subscribe()
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthFailure {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl AuthFailure {
    fn into_error(self) -> AuthError {
        let message = self
            .error_description
            .or(self.msg)
            .or(self.message)
            .unwrap_or_else(|| "Authentication failed".to_string());
        AuthError::new(message)
    }
}

/// Remote session service
///
/// Only sessions established through this process are known; the session
/// table is shared with the listing clients.
pub struct RestSessionService {
    client: RestClient,
}

impl RestSessionService {
    fn new(client: RestClient) -> Self {
        Self { client }
    }

    async fn authenticate(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<Session, AuthError> {
        let response = self
            .client
            .request(Method::POST, path)
            .json(credentials)
            .send()
            .await
            .map_err(|e| AuthError::new(e.to_string()))?;

        if !response.status().is_success() {
            let failure = response.json::<AuthFailure>().await.unwrap_or_default();
            return Err(failure.into_error());
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::new(e.to_string()))?;
        let (Some(token), Some(user)) = (body.access_token, body.user) else {
            return Err(AuthError::new(
                "Account created; confirm the email address before signing in",
            ));
        };

        let session = Session {
            user_id: user.id,
            email: user.email.unwrap_or_else(|| credentials.email.clone()),
            access_token: token,
            established_at: Utc::now(),
        };
        self.client
            .sessions
            .send_modify(|table| table.insert(session.clone()));
        Ok(session)
    }
}

#[async_trait]
impl SessionService for RestSessionService {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        self.authenticate("/auth/v1/token?grant_type=password", credentials)
            .await
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        self.authenticate("/auth/v1/signup", credentials).await
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let known = self.client.sessions.borrow().get(token).is_some();
        if !known {
            return Ok(());
        }

        let result = self
            .client
            .request_as(Method::POST, "/auth/v1/logout", token)
            .send()
            .await;

        // the local session ends even if the remote call fails
        self.client
            .sessions
            .send_if_modified(|table| table.remove(token).is_some());

        result
            .map(|_| ())
            .map_err(|e| AuthError::new(e.to_string()))
    }

    fn session_changes(&self) -> watch::Receiver<SessionTable> {
        self.client.sessions.subscribe()
    }
}

/// Build a REST-backed [`StoreBackend`]
pub fn backend(
    url: &str,
    api_key: &str,
    plots_table: &str,
    rentals_table: &str,
    capacity: usize,
) -> Result<StoreBackend> {
    let http = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")?;

    let client = RestClient::new(http, url, api_key);

    Ok(StoreBackend {
        plots: Arc::new(RestListingService::<Plot>::new(
            client.clone(),
            plots_table,
            capacity,
        )),
        rentals: Arc::new(RestListingService::<RentalHouse>::new(
            client.clone(),
            rentals_table,
            capacity,
        )),
        sessions: Arc::new(RestSessionService::new(client)),
    })
}
