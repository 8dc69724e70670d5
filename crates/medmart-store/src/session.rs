//! # Auth Session
//!
//! Who is signed in, published over a `watch` channel.
//!
//! ## State Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌────────────┐        sign_in         ┌─────────────────────┐         │
//! │  │ Anonymous  │ ─────────────────────▶ │ Authenticated(user) │         │
//! │  └────────────┘ ◀───────────────────── └──────────┬──────────┘         │
//! │                        sign_out                   │  ▲                  │
//! │                                                   └──┘                  │
//! │                                            refresh_token                │
//! │                                                                         │
//! │  Each transition is reported as an AuthEvent:                          │
//! │  SignedIn │ SignedOut │ TokenRefreshed                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use medmart_core::UserRole;

use crate::error::{StoreError, StoreResult};

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: UserRole,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated(Session),
}

impl AuthState {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            AuthState::Anonymous => None,
            AuthState::Authenticated(session) => Some(&session.user_id),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Anonymous => None,
            AuthState::Authenticated(session) => Some(session),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

impl AuthEvent {
    /// Classifies the change from `prev` to `next`.
    ///
    /// Switching directly from one user to another counts as a sign-in.
    pub fn between(prev: &AuthState, next: &AuthState) -> Option<AuthEvent> {
        match (prev.session(), next.session()) {
            (None, None) => None,
            (None, Some(_)) => Some(AuthEvent::SignedIn),
            (Some(_), None) => Some(AuthEvent::SignedOut),
            (Some(a), Some(b)) if a.user_id != b.user_id => Some(AuthEvent::SignedIn),
            (Some(a), Some(b)) if a != b => Some(AuthEvent::TokenRefreshed),
            (Some(_), Some(_)) => None,
        }
    }
}

/// Owner of the auth state.
///
/// Clones share the same channel; every subscriber sees every transition's
/// resulting state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<AuthState>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    /// Starts anonymous.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AuthState::Anonymous);
        SessionHandle { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    pub fn sign_in(&self, session: Session) -> AuthEvent {
        info!(user_id = %session.user_id, role = %session.role, "Signed in");
        self.tx.send_replace(AuthState::Authenticated(session));
        AuthEvent::SignedIn
    }

    /// Signing out while anonymous is a no-op.
    pub fn sign_out(&self) -> Option<AuthEvent> {
        let prev = self.tx.send_replace(AuthState::Anonymous);
        let event = AuthEvent::between(&prev, &AuthState::Anonymous);
        if let Some(user_id) = prev.user_id() {
            info!(user_id = %user_id, "Signed out");
        }
        event
    }

    /// Replaces the token of the signed-in session.
    ///
    /// ## Errors
    /// - `NotAuthenticated` if nobody is signed in
    /// - `SessionMismatch` if `session` is for a different user
    pub fn refresh_token(&self, session: Session) -> StoreResult<AuthEvent> {
        let current = self.current();
        let Some(existing) = current.session() else {
            return Err(StoreError::NotAuthenticated);
        };
        if existing.user_id != session.user_id {
            return Err(StoreError::SessionMismatch {
                current: existing.user_id.clone(),
                refreshed: session.user_id,
            });
        }

        self.tx.send_replace(AuthState::Authenticated(session));
        Ok(AuthEvent::TokenRefreshed)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
