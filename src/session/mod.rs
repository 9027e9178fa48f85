//! Session provider for one browsing context.
//!
//! The provider starts with no session and `is_loading = true`, issues a
//! single `get_session` and flips `is_loading` to false once that call
//! resolves. It never flips back. Auth-state-change notifications update the
//! session afterwards and drive navigation: a sign-in refreshes the current
//! page, a sign-out refreshes and goes home.

pub mod navigator;

pub use navigator::{Navigation, NavigationLog, Navigator, Route};

use crate::auth::{AuthBackend, AuthEvent, Session};
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error};

#[derive(Clone, Debug)]
pub struct SessionState {
    pub session: Option<Session>,
    pub is_loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session: None,
            is_loading: true,
        }
    }
}

pub struct SessionProvider {
    client: Arc<dyn AuthBackend>,
    state: Arc<watch::Sender<SessionState>>,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionProvider {
    /// Subscribe to auth changes, then load the initial session in the background.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(client: Arc<dyn AuthBackend>, navigator: Arc<dyn Navigator>) -> Self {
        let (tx, _) = watch::channel(SessionState::default());
        let state = Arc::new(tx);

        // Subscribe before the first fetch so no change is missed.
        let mut subscription = client.on_auth_state_change();
        let listener = {
            let state = state.clone();
            tokio::spawn(async move {
                while let Some(change) = subscription.next().await {
                    debug!(event = change.event.as_str(), "auth state changed");
                    state.send_modify(|current| current.session = change.session);

                    match change.event {
                        AuthEvent::SignedIn => navigator.refresh(),
                        AuthEvent::SignedOut => {
                            navigator.refresh();
                            navigator.push(Route::Home);
                        }
                        AuthEvent::TokenRefreshed | AuthEvent::UserUpdated => {}
                    }
                }
            })
        };

        let initial = {
            let state = state.clone();
            let client = client.clone();
            tokio::spawn(async move {
                let session = match client.get_session().await {
                    Ok(session) => session,
                    Err(err) => {
                        error!("Failed to load session: {err}");
                        None
                    }
                };
                state.send_modify(|current| {
                    current.session = session;
                    current.is_loading = false;
                });
            })
        };

        Self {
            client,
            state,
            tasks: vec![listener, initial],
        }
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn AuthBackend> {
        self.client.clone()
    }

    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Wait for the initial session check to resolve.
    pub async fn ready(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|state| !state.is_loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state.borrow().clone(),
        }
    }

    /// Re-run the session check. Only the session is updated.
    pub async fn refresh(&self) -> Option<Session> {
        let session = match self.client.get_session().await {
            Ok(session) => session,
            Err(err) => {
                error!("Failed to refresh session: {err}");
                None
            }
        };
        self.state
            .send_modify(|current| current.session = session.clone());
        session
    }

    /// Stop listening for auth changes.
    pub fn shutdown(self) {}
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
