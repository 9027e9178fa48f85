//! Auth-state-change notifications.
//!
//! Each backend client owns an [`AuthEvents`] hub and emits on every session
//! transition it performs. Consumers hold a [`Subscription`]; dropping it (or
//! calling [`Subscription::unsubscribe`]) detaches from the stream.

use super::Session;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

const DEFAULT_CAPACITY: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl AuthEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

#[derive(Clone, Debug)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthChange>,
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { tx }
    }

    /// Publish a change. No-op when nobody listens.
    pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
        let _ = self.tx.send(AuthChange { event, session });
    }

    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<AuthChange>,
}

impl Subscription {
    /// Wait for the next change. Returns `None` once the emitting client is gone.
    pub async fn next(&mut self) -> Option<AuthChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(skipped)) => {
                    // Only the latest session matters; older changes can be dropped.
                    warn!(skipped, "auth change subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}
