//! Access check run before any dashboard content is rendered.

use crate::{
    auth::{AuthBackend, User},
    session::Route,
};
use tracing::{debug, error};

#[derive(Clone, Debug)]
pub enum GateDecision {
    Render(User),
    Redirect(Route),
}

/// Fetch the session once; anything but a live session sends the visitor to login.
pub async fn dashboard_gate(backend: &dyn AuthBackend) -> GateDecision {
    match backend.get_session().await {
        Ok(Some(session)) => GateDecision::Render(session.user),
        Ok(None) => {
            debug!("no session, redirecting to login");
            GateDecision::Redirect(Route::Login)
        }
        Err(err) => {
            error!("Failed to check session: {err}");
            GateDecision::Redirect(Route::Login)
        }
    }
}
