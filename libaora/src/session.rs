//! Process-wide session context
//!
//! Holds who is signed in. One context is created at application start,
//! owned by [`AoraService`](crate::service::AoraService), and handed to
//! consumers by reference; there is no global instance.

use tokio::sync::watch;

use crate::gateway::Gateway;
use crate::types::User;

/// Snapshot of the session context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub is_logged_in: bool,
    pub user: Option<User>,
    /// True until the start-up session check has finished
    pub is_loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_logged_in: false,
            user: None,
            is_loading: true,
        }
    }
}

/// Shared identity state with explicit initialize / read / update
pub struct SessionContext {
    state: watch::Sender<SessionState>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { state }
    }

    /// Ask the gateway once for an existing session
    ///
    /// A failed check is logged and leaves the context signed out; it is
    /// not returned. `is_loading` is false afterwards in every case.
    pub async fn initialize(&self, gateway: &dyn Gateway) -> SessionState {
        match gateway.current_user().await {
            Ok(user) => {
                tracing::debug!(logged_in = user.is_some(), "Session check finished");
                self.state.send_modify(|state| {
                    state.is_logged_in = user.is_some();
                    state.user = user;
                    state.is_loading = false;
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Session check failed");
                self.state.send_modify(|state| {
                    state.is_logged_in = false;
                    state.user = None;
                    state.is_loading = false;
                });
            }
        }

        self.read()
    }

    pub fn read(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The signed-in user, if any
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// Record a sign-in or sign-up
    pub fn update(&self, user: User) {
        tracing::info!(account_id = %user.account_id, "Session updated");
        self.state.send_modify(|state| {
            state.is_logged_in = true;
            state.user = Some(user);
            state.is_loading = false;
        });
    }

    /// Forget the signed-in user
    pub fn clear(&self) {
        self.state.send_modify(|state| {
            state.is_logged_in = false;
            state.user = None;
            state.is_loading = false;
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}
