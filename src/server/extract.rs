//! Per-request caller identity
//!
//! The caller presents the access token returned by login or signup in an
//! `Authorization: Bearer <token>` header. [`Caller`] resolves it against the
//! auth gate once per request; a missing, malformed or unknown token yields
//! an anonymous caller.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header::AUTHORIZATION, request::Parts};
use std::convert::Infallible;

use super::AppState;
use crate::core::auth::{AuthContext, AuthPolicy};
use crate::core::error::ListingError;

/// Identity of the client making the request
#[derive(Clone)]
pub struct Caller {
    token: Option<String>,
    pub context: AuthContext,
}

impl Caller {
    /// Bearer token presented with the request, whether or not it is live
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn require(&self, policy: AuthPolicy) -> Result<(), ListingError> {
        if policy.check(&self.context) {
            Ok(())
        } else {
            Err(ListingError::Unauthorized)
        }
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers);
        let context = state.auth.context(token.as_deref());
        Ok(Self { token, context })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
