//! Scripted backend for unit tests of the flows and the session provider.

use super::{
    AuthBackend, AuthError, AuthEvent, AuthEvents, OtpType, Session, SessionTokens,
    SignUpOptions, SignUpResponse, Subscription, User, UserMetadata,
};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Notify;

pub(crate) fn sample_user(email: &str) -> User {
    User {
        id: "user-1".to_string(),
        email: Some(email.to_string()),
        email_confirmed_at: None,
        user_metadata: UserMetadata {
            business_name: Some("Padaria Ana".to_string()),
            whatsapp_number: Some("+5511999999999".to_string()),
            ..UserMetadata::default()
        },
    }
}

pub(crate) fn sample_session(email: &str) -> Session {
    Session {
        access_token: SecretString::from("access-token".to_string()),
        refresh_token: SecretString::from("refresh-token".to_string()),
        token_type: "bearer".to_string(),
        expires_at: None,
        user: sample_user(email),
    }
}

#[derive(Default)]
pub(crate) struct Calls {
    pub sign_up: AtomicUsize,
    pub sign_in: AtomicUsize,
    pub sign_out: AtomicUsize,
    pub verify_otp: AtomicUsize,
    pub get_session: AtomicUsize,
}

impl Calls {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Every operation answers with a preset result; unset results fall back to a
/// plausible default.
#[derive(Default)]
pub(crate) struct StubBackend {
    sign_up: Mutex<Option<Result<SignUpResponse, AuthError>>>,
    sign_in: Mutex<Option<Result<Session, AuthError>>>,
    sign_out: Mutex<Option<AuthError>>,
    verify: Mutex<Option<Result<Option<Session>, AuthError>>>,
    session: Mutex<Option<Result<Option<Session>, AuthError>>>,
    gate: Option<Arc<Notify>>,
    pub calls: Calls,
    events: AuthEvents,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sign_up(self, result: Result<SignUpResponse, AuthError>) -> Self {
        *self.sign_up.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        self
    }

    pub fn with_sign_in(self, result: Result<Session, AuthError>) -> Self {
        *self.sign_in.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        self
    }

    pub fn with_sign_out_error(self, err: AuthError) -> Self {
        *self.sign_out.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
        self
    }

    pub fn with_verify(self, result: Result<Option<Session>, AuthError>) -> Self {
        *self.verify.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        self
    }

    pub fn with_session(self, result: Result<Option<Session>, AuthError>) -> Self {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        self
    }

    /// Hold `sign_up`, `sign_in_with_password` and `get_session` until the
    /// returned handle is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
        self.events.emit(event, session);
    }

    pub fn subscribers(&self) -> usize {
        self.events.subscriber_count()
    }

    async fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

fn preset<T: Clone>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

#[async_trait]
impl AuthBackend for StubBackend {
    async fn sign_up(
        &self,
        email: &str,
        _password: &SecretString,
        _options: SignUpOptions,
    ) -> Result<SignUpResponse, AuthError> {
        self.calls.sign_up.fetch_add(1, Ordering::SeqCst);
        self.wait_gate().await;
        preset(&self.sign_up).unwrap_or_else(|| {
            Ok(SignUpResponse {
                user: Some(sample_user(email)),
                session: None,
            })
        })
    }

    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &SecretString,
    ) -> Result<Session, AuthError> {
        self.calls.sign_in.fetch_add(1, Ordering::SeqCst);
        self.wait_gate().await;
        preset(&self.sign_in)
            .unwrap_or_else(|| Err(AuthError::from_response(400, "Invalid login credentials")))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.calls.sign_out.fetch_add(1, Ordering::SeqCst);
        self.events.emit(AuthEvent::SignedOut, None);
        preset(&self.sign_out).map_or(Ok(()), Err)
    }

    async fn verify_otp(
        &self,
        _token_hash: &str,
        _otp_type: OtpType,
    ) -> Result<Option<Session>, AuthError> {
        self.calls.verify_otp.fetch_add(1, Ordering::SeqCst);
        preset(&self.verify).unwrap_or_else(|| Ok(Some(sample_session("ana@example.com"))))
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        self.calls.get_session.fetch_add(1, Ordering::SeqCst);
        self.wait_gate().await;
        preset(&self.session).unwrap_or(Ok(None))
    }

    fn on_auth_state_change(&self) -> Subscription {
        self.events.subscribe()
    }

    fn stored_tokens(&self) -> Option<SessionTokens> {
        None
    }
}
