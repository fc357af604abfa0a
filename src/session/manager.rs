//! Authentication state machine

use std::sync::{Arc, RwLock};

use super::{SessionResult, SessionStore};
use crate::models::{Session, User};

/// Current authentication state
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(Session),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Transition that a call produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Unauthenticated -> Authenticated, or a fresh token replaced an old one
    LoggedIn,
    /// User asked to sign out
    LoggedOut,
    /// The server rejected the stored token
    Expired,
    /// Already unauthenticated; nothing changed
    Unchanged,
}

/// Owns the session and keeps the store in step with it
///
/// The in-memory state is the source of truth for the running process; the
/// store is written on every transition so the next run starts from the
/// same place.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    state: RwLock<AuthState>,
}

impl SessionManager {
    /// Start from whatever the store holds
    pub fn restore(store: Arc<dyn SessionStore>) -> Self {
        let state = match store.load() {
            Some(session) => {
                tracing::debug!(user = %session.user.email, "Restored stored session");
                AuthState::Authenticated(session)
            }
            None => AuthState::Unauthenticated,
        };

        Self {
            store,
            state: RwLock::new(state),
        }
    }

    pub fn state(&self) -> AuthState {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    /// Bearer token to attach to outgoing requests
    pub fn token(&self) -> Option<String> {
        match &*self.read() {
            AuthState::Authenticated(session) => Some(session.token.clone()),
            AuthState::Unauthenticated => None,
        }
    }

    pub fn current_user(&self) -> Option<User> {
        match &*self.read() {
            AuthState::Authenticated(session) => Some(session.user.clone()),
            AuthState::Unauthenticated => None,
        }
    }

    /// Store the session returned by a successful login
    pub fn login_succeeded(&self, session: Session) -> SessionResult<SessionEvent> {
        self.store.save(&session)?;
        tracing::info!(user = %session.user.email, "Signed in");
        *self.write() = AuthState::Authenticated(session);
        Ok(SessionEvent::LoggedIn)
    }

    /// Explicit sign-out
    pub fn logout(&self) -> SessionResult<SessionEvent> {
        self.reset(SessionEvent::LoggedOut)
    }

    /// Server answered 401: drop the token and require a new login
    pub fn expire(&self) -> SessionResult<SessionEvent> {
        self.reset(SessionEvent::Expired)
    }

    fn reset(&self, event: SessionEvent) -> SessionResult<SessionEvent> {
        // Memory state goes first so a failing store can't keep a rejected token alive
        let was_authenticated = {
            let mut state = self.write();
            let was = state.is_authenticated();
            *state = AuthState::Unauthenticated;
            was
        };
        self.store.clear()?;

        if !was_authenticated {
            return Ok(SessionEvent::Unchanged);
        }

        match event {
            SessionEvent::Expired => tracing::warn!("Session expired, please sign in again"),
            _ => tracing::info!("Signed out"),
        }
        Ok(event)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, AuthState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, AuthState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
