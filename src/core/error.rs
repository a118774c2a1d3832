//! Typed error handling for listing operations
//!
//! Store backends report [`StoreError`]; the authentication collaborator
//! reports [`AuthError`]. The directory and the API wrap both into
//! [`ListingError`], which knows its HTTP status and error code so handlers
//! can return it directly.
//!
//! # Error Categories
//!
//! - [`ListingError::StoreRead`]: fetching a collection failed, cache untouched
//! - [`ListingError::StoreWrite`]: insert/delete failed, cache untouched
//! - [`ListingError::Auth`]: login/signup/logout failed
//! - [`ListingError::Unauthorized`]: admin surface reached without a session
//! - [`ListingError::NotFound`]: detail lookup with no matching record
//!
//! ```rust,ignore
//! match directory.create_plot(draft).await {
//!     Ok(plot) => info!(id = %plot.id, "plot submitted"),
//!     Err(ListingError::StoreWrite { source, .. }) => warn!("keep the form: {source}"),
//!     Err(e) => return Err(e),
//! }
//! ```

use crate::core::listing::{Collection, ListingId};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure reported by a listing store backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Network failure, lock failure or remote outage
    #[error("listing store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the request (malformed record, constraint violation)
    #[error("listing store rejected the request: {0}")]
    Rejected(String),
}

/// Failure reported by the authentication collaborator
///
/// The message is shown to the user as-is. It never tells a wrong password
/// apart from an unknown account.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthError {
    pub message: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Write operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Delete,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::Create => f.write_str("create"),
            WriteOp::Delete => f.write_str("delete"),
        }
    }
}

/// The main error type exposed to the presentation layer
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("failed to load {collection}: {source}")]
    StoreRead {
        collection: Collection,
        #[source]
        source: StoreError,
    },

    #[error("failed to {operation} {}: {source}", .collection.singular())]
    StoreWrite {
        collection: Collection,
        operation: WriteOp,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("an admin session is required")]
    Unauthorized,

    #[error("{} with id '{id}' not found", .collection.singular())]
    NotFound { collection: Collection, id: ListingId },
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ListingError {
    pub fn read(collection: Collection, source: StoreError) -> Self {
        ListingError::StoreRead { collection, source }
    }

    pub fn write(collection: Collection, operation: WriteOp, source: StoreError) -> Self {
        ListingError::StoreWrite {
            collection,
            operation,
            source,
        }
    }

    pub fn not_found(collection: Collection, id: ListingId) -> Self {
        ListingError::NotFound { collection, id }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ListingError::StoreRead { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ListingError::StoreWrite {
                source: StoreError::Rejected(_),
                ..
            } => StatusCode::UNPROCESSABLE_ENTITY,
            ListingError::StoreWrite { .. } => StatusCode::BAD_GATEWAY,
            ListingError::Auth(_) | ListingError::Unauthorized => StatusCode::UNAUTHORIZED,
            ListingError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ListingError::StoreRead { .. } => "STORE_READ_ERROR",
            ListingError::StoreWrite { .. } => "STORE_WRITE_ERROR",
            ListingError::Auth(_) => "AUTH_ERROR",
            ListingError::Unauthorized => "UNAUTHORIZED",
            ListingError::NotFound { .. } => "LISTING_NOT_FOUND",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ListingError::NotFound { collection, id } => Some(serde_json::json!({
                "collection": collection.as_str(),
                "id": id.as_str(),
            })),
            ListingError::StoreWrite {
                collection,
                operation,
                ..
            } => Some(serde_json::json!({
                "collection": collection.as_str(),
                "operation": operation.to_string(),
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}
