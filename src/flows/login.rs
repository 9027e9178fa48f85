//! Email/password sign-in, shared by the login page and the header popover.

use crate::{
    auth::AuthBackend,
    locale,
    session::{Navigator, Route, SessionProvider},
};
use secrecy::SecretString;
use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginPresentation {
    Page,
    Popover,
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// What a form renders. The password is never kept.
#[derive(Clone, Debug, Default)]
pub struct LoginState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    SignedIn,
    Failed(String),
    Busy,
}

pub struct LoginForm {
    presentation: LoginPresentation,
    state: Mutex<LoginState>,
}

impl LoginForm {
    #[must_use]
    pub fn new(presentation: LoginPresentation) -> Self {
        Self {
            presentation,
            state: Mutex::new(LoginState::default()),
        }
    }

    #[must_use]
    pub fn presentation(&self) -> LoginPresentation {
        self.presentation
    }

    fn lock(&self) -> MutexGuard<'_, LoginState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> LoginState {
        self.lock().clone()
    }

    pub async fn submit(
        &self,
        credentials: Credentials,
        backend: &dyn AuthBackend,
        navigator: &dyn Navigator,
    ) -> LoginOutcome {
        {
            let mut state = self.lock();
            if state.is_loading {
                return LoginOutcome::Busy;
            }
            state.is_loading = true;
            state.error = None;
            state.email.clone_from(&credentials.email);
        }

        let result = backend
            .sign_in_with_password(&credentials.email, &credentials.password)
            .await;

        let mut state = self.lock();
        state.is_loading = false;
        match result {
            Ok(session) => {
                info!(user_id = %session.user.id, presentation = ?self.presentation, "signed in");
                drop(state);
                navigator.push(Route::Dashboard);
                navigator.refresh();
                LoginOutcome::SignedIn
            }
            Err(err) => {
                warn!(kind = ?err.kind(), "sign-in failed: {err}");
                let message = locale::login_error(&err);
                state.error = Some(message.clone());
                LoginOutcome::Failed(message)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginGate {
    /// The session check has not resolved; render nothing.
    Pending,
    /// Already signed in; navigation was replaced.
    Redirect(Route),
    ShowForm,
}

/// Decide what the login page shows for the provider's current state.
pub fn login_gate(provider: &SessionProvider, navigator: &dyn Navigator) -> LoginGate {
    if provider.is_loading() {
        return LoginGate::Pending;
    }
    if provider.current().is_some() {
        navigator.replace(Route::Dashboard);
        return LoginGate::Redirect(Route::Dashboard);
    }
    LoginGate::ShowForm
}
