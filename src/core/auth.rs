//! Admin session gate
//!
//! [`AuthGate`] is a thin projection of the listing store's session state:
//! it stores no credentials and issues no tokens. Login, signup and logout
//! are delegated to the store's [`SessionService`]; the gate reports success
//! or failure and answers "does this caller hold an active admin session".
//!
//! Sessions are per client. The caller presents the access token the store
//! issued at sign-in; the gate looks it up in the store's session table,
//! which it reads through the store's watch channel, so a session change is
//! visible to every consumer the moment the store publishes it.

use crate::core::error::AuthError;
use crate::core::service::{Credentials, Session, SessionService, SessionTable};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Minimum password length accepted for signup
pub const MIN_PASSWORD_LEN: usize = 6;

/// Authorization context of one caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// The caller holds an active admin session
    Admin { user_id: Uuid, email: String },

    /// No session (public visitor)
    Anonymous,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        matches!(self, AuthContext::Admin { .. })
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::Admin { user_id, .. } => Some(*user_id),
            AuthContext::Anonymous => None,
        }
    }
}

impl From<&Session> for AuthContext {
    fn from(session: &Session) -> Self {
        AuthContext::Admin {
            user_id: session.user_id,
            email: session.email.clone(),
        }
    }
}

/// Authorization policy for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Browse pages, detail pages
    Public,

    /// Create and delete listings
    AdminOnly,
}

impl AuthPolicy {
    pub fn check(&self, context: &AuthContext) -> bool {
        match self {
            AuthPolicy::Public => true,
            AuthPolicy::AdminOnly => context.is_admin(),
        }
    }
}

/// Session-presence check plus pass-through login/signup/logout
#[derive(Clone)]
pub struct AuthGate {
    sessions: Arc<dyn SessionService>,
    state: watch::Receiver<SessionTable>,
}

impl AuthGate {
    pub fn new(sessions: Arc<dyn SessionService>) -> Self {
        let state = sessions.session_changes();
        Self { sessions, state }
    }

    /// Whether `token` identifies an active admin session right now
    pub fn is_authenticated(&self, token: &str) -> bool {
        self.state.borrow().get(token).is_some()
    }

    pub fn session(&self, token: &str) -> Option<Session> {
        self.state.borrow().get(token).cloned()
    }

    /// Context of a caller presenting `token`, if any
    pub fn context(&self, token: Option<&str>) -> AuthContext {
        let Some(token) = token else {
            return AuthContext::Anonymous;
        };
        match self.state.borrow().get(token) {
            Some(session) => AuthContext::from(session),
            None => AuthContext::Anonymous,
        }
    }

    /// Number of live admin sessions across all clients
    pub fn active_sessions(&self) -> usize {
        self.state.borrow().len()
    }

    /// Receiver that observes every session change
    pub fn subscribe(&self) -> watch::Receiver<SessionTable> {
        self.state.clone()
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        match self.sessions.sign_in(credentials).await {
            Ok(session) => {
                tracing::info!(email = %session.email, "admin signed in");
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(email = %credentials.email, error = %e, "sign-in rejected");
                Err(e)
            }
        }
    }

    /// Create an admin account; short passwords never reach the store
    pub async fn signup(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::new(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let session = self.sessions.sign_up(credentials).await.inspect_err(|e| {
            tracing::warn!(email = %credentials.email, error = %e, "sign-up rejected");
        })?;
        tracing::info!(email = %session.email, "admin account created");
        Ok(session)
    }

    /// End the caller's session; other sessions stay active
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let email = self.session(token).map(|s| s.email);
        self.sessions.sign_out(token).await?;
        if let Some(email) = email {
            tracing::info!(email = %email, "admin signed out");
        }
        Ok(())
    }
}
