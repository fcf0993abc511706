//! Session state and lifecycle.
//!
//! ARCHITECTURE
//! ============
//! One `Session` per process, constructed explicitly with an injected token
//! store and handed (as a cheap clone) to the transport at startup. The
//! token survives a page reload via the store; the user record does not, so
//! a reload is followed by `revalidate` to rebuild identity from the token.
//!
//! INVARIANT
//! =========
//! `authenticated == true` implies a token is held. Login applies its three
//! field updates and the store write in one synchronous block; revalidate
//! only marks authenticated while the token it started from is still set;
//! every failure path funnels through `logout`.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::LoginError;
use crate::storage::TokenStore;
use crate::transport::Transport;

/// Role string granting access to admin-only destinations.
pub const ADMIN_ROLE: &str = "admin";

/// Identity record returned by the authentication service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: String,
    /// Projects a non-admin user may access. Admins have an empty list and
    /// access everything.
    #[serde(default)]
    pub project_access: Vec<String>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Login form payload.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Point-in-time projection of session state consumed by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub role: Option<String>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
    authenticated: bool,
}

impl SessionState {
    fn clear(&mut self) {
        self.token = None;
        self.user = None;
        self.authenticated = false;
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user: User,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: User,
}

/// Shared session handle. Clones see the same state.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    store: Arc<dyn TokenStore>,
}

impl Session {
    /// Construct from durable storage: a previously persisted token is
    /// loaded but not trusted — the session stays unauthenticated until
    /// `revalidate` confirms it.
    #[must_use]
    pub fn init(store: Arc<dyn TokenStore>) -> Self {
        let token = store.load();
        let state = SessionState { token, user: None, authenticated: false };
        Self { state: Arc::new(Mutex::new(state)), store }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state poisoned")
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().authenticated
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.lock().user.as_ref().is_some_and(User::is_admin)
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            authenticated: state.authenticated,
            role: state.user.as_ref().map(|u| u.role.clone()),
        }
    }

    /// Authenticate against `POST /auth/login`.
    ///
    /// On success the token, user, and authenticated flag update together
    /// and the token is persisted. On failure nothing changes and the
    /// server's message (or the generic fallback) is returned for inline
    /// display.
    ///
    /// # Errors
    ///
    /// Returns `LoginError` when the service rejects the credentials or the
    /// call fails; the session remains logged out.
    pub async fn login(
        &self,
        transport: &Transport,
        credentials: &Credentials,
    ) -> Result<(), LoginError> {
        let resp = match transport.post_json("/auth/login", credentials).await {
            Ok(resp) => resp,
            Err(err) => return Err(LoginError::from_transport(&err)),
        };

        let LoginResponse { token, user } = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable login response");
                return Err(LoginError { message: "login failed".to_owned() });
            }
        };

        tracing::info!(username = %user.username, "login succeeded");

        // Single synchronous block: all three fields and the persisted
        // token move together.
        {
            let mut state = self.lock();
            state.token = Some(token.clone());
            state.user = Some(user);
            state.authenticated = true;
        }
        self.store.save(&token);

        Ok(())
    }

    /// Clear the session and the persisted token. Idempotent; never fails.
    pub fn logout(&self) {
        self.lock().clear();
        self.store.clear();
    }

    /// Rebuild identity from a held token via `GET /auth/me`.
    ///
    /// Returns false without a network call when no token is held. Any
    /// failure — rejection, network fault, undecodable body — performs a
    /// full `logout` so a dead token never lingers as authenticated.
    pub async fn revalidate(&self, transport: &Transport) -> bool {
        let Some(token) = self.token() else {
            return false;
        };

        // Arm the request stage: durable storage is what the transport
        // reads for credential attachment.
        self.store.save(&token);

        let resp = match transport.get("/auth/me").await {
            Ok(resp) => resp,
            Err(err) => {
                tracing::debug!(error = %err, "session revalidation rejected");
                self.logout();
                return false;
            }
        };

        match resp.json::<MeResponse>().await {
            Ok(MeResponse { user }) => {
                let mut state = self.lock();
                if state.token.is_none() {
                    // A logout raced the response; stay logged out.
                    return false;
                }
                state.user = Some(user);
                state.authenticated = true;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "undecodable revalidation response");
                self.logout();
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
