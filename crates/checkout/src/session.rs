//! Shopper session.
//!
//! The session holds the bearer token the backend expects on every
//! authenticated request. It is created once, injected into the API client
//! and observed by the checkout runtime. A 401 from any endpoint expires it
//! and publishes [`SessionState::Expired`] so a front end can send the
//! shopper back to sign-in.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::info;

/// Authentication state visible to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token; checking out as a guest.
    Anonymous,
    Authenticated,
    /// The backend rejected the token. The shopper must sign in again.
    Expired,
}

/// A published session value. The token is only reachable inside the crate.
#[derive(Clone)]
pub struct SessionSnapshot {
    state: SessionState,
    token: Option<SecretString>,
}

impl SessionSnapshot {
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }
}

impl std::fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("state", &self.state)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Shared session handle. Cloning shares the same session.
#[derive(Clone, Debug)]
pub struct Session {
    inner: Arc<watch::Sender<SessionSnapshot>>,
}

impl Session {
    /// Create a session, signed in when a token is given.
    #[must_use]
    pub fn new(token: Option<SecretString>) -> Self {
        let state = if token.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };
        let (sender, _) = watch::channel(SessionSnapshot { state, token });
        Self {
            inner: Arc::new(sender),
        }
    }

    /// A guest session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.borrow().state
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Current token, if signed in.
    pub(crate) fn token(&self) -> Option<SecretString> {
        self.inner.borrow().token().cloned()
    }

    pub fn sign_in(&self, token: SecretString) {
        info!("Session signed in");
        self.inner.send_replace(SessionSnapshot {
            state: SessionState::Authenticated,
            token: Some(token),
        });
    }

    pub fn sign_out(&self) {
        info!("Session signed out");
        self.inner.send_replace(SessionSnapshot {
            state: SessionState::Anonymous,
            token: None,
        });
    }

    /// Clear the token after the backend rejected it.
    ///
    /// Only an authenticated session can expire; a guest stays anonymous.
    pub fn expire(&self) {
        let expired = self.inner.send_if_modified(|snapshot| {
            if snapshot.state != SessionState::Authenticated {
                return false;
            }
            snapshot.state = SessionState::Expired;
            snapshot.token = None;
            true
        });
        if expired {
            info!("Session expired after authentication failure");
        }
    }

    /// Observe state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}
